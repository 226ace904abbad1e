//! Booking endpoints.

use chrono::{DateTime, Utc};
use marketplace_shared::{
    ApiError, ApiResponse, Booking, BookingFilters, CancelBookingRequest, CreateBookingRequest,
    Paginated, UpdateBookingRequest, UpdateBookingStatusRequest,
};
use serde_json::json;

use super::segment;
use crate::api_client::{ApiClient, RequestOptions};

#[derive(Debug, Clone)]
pub struct BookingsApi {
    client: ApiClient,
}

impl BookingsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get_bookings(
        &self,
        filters: &BookingFilters,
    ) -> Result<ApiResponse<Paginated<Booking>>, ApiError> {
        self.client
            .get_with("/bookings", RequestOptions::query(filters.to_query()))
            .await
    }

    pub async fn get_booking(&self, id: &str) -> Result<ApiResponse<Booking>, ApiError> {
        self.client.get(&format!("/bookings/{}", segment(id))).await
    }

    pub async fn get_upcoming(&self) -> Result<ApiResponse<Vec<Booking>>, ApiError> {
        self.client.get("/bookings/upcoming").await
    }

    pub async fn create_booking(
        &self,
        request: &CreateBookingRequest,
    ) -> Result<ApiResponse<Booking>, ApiError> {
        self.client.post("/bookings", request).await
    }

    pub async fn update_booking(
        &self,
        id: &str,
        request: &UpdateBookingRequest,
    ) -> Result<ApiResponse<Booking>, ApiError> {
        self.client.put(&format!("/bookings/{}", segment(id)), request).await
    }

    pub async fn cancel_booking(
        &self,
        id: &str,
        reason: Option<&str>,
    ) -> Result<ApiResponse<Booking>, ApiError> {
        let request = CancelBookingRequest {
            reason: reason.map(str::to_string),
        };
        self.client
            .post(&format!("/bookings/{}/cancel", segment(id)), &request)
            .await
    }

    pub async fn confirm_booking(&self, id: &str) -> Result<ApiResponse<Booking>, ApiError> {
        self.client
            .post_empty(&format!("/bookings/{}/confirm", segment(id)))
            .await
    }

    pub async fn complete_booking(&self, id: &str) -> Result<ApiResponse<Booking>, ApiError> {
        self.client
            .post_empty(&format!("/bookings/{}/complete", segment(id)))
            .await
    }

    pub async fn update_status(
        &self,
        id: &str,
        request: &UpdateBookingStatusRequest,
    ) -> Result<ApiResponse<Booking>, ApiError> {
        self.client
            .patch(&format!("/bookings/{}/status", segment(id)), request)
            .await
    }

    pub async fn reschedule(
        &self,
        id: &str,
        scheduled_at: DateTime<Utc>,
    ) -> Result<ApiResponse<Booking>, ApiError> {
        self.client
            .post(
                &format!("/bookings/{}/reschedule", segment(id)),
                &json!({ "scheduledAt": scheduled_at }),
            )
            .await
    }
}
