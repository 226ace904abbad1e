//! Specialist endpoints.

use chrono::NaiveDate;
use marketplace_shared::{
    ApiError, ApiResponse, AvailabilitySlot, GeoPoint, ListParams, Paginated, Specialist,
    SpecialistStats, WorkingHours,
};
use serde_json::json;

use super::segment;
use crate::api_client::{ApiClient, RequestOptions};

#[derive(Debug, Clone)]
pub struct SpecialistsApi {
    client: ApiClient,
}

impl SpecialistsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get_specialists(
        &self,
        params: &ListParams,
    ) -> Result<ApiResponse<Paginated<Specialist>>, ApiError> {
        self.client
            .get_with("/specialists", RequestOptions::query(params.to_query()))
            .await
    }

    pub async fn get_specialist(&self, id: &str) -> Result<ApiResponse<Specialist>, ApiError> {
        self.client.get(&format!("/specialists/{}", segment(id))).await
    }

    pub async fn get_nearby(
        &self,
        point: GeoPoint,
        radius_km: f64,
    ) -> Result<ApiResponse<Vec<Specialist>>, ApiError> {
        let options = RequestOptions::default()
            .with_param("lat", point.latitude)
            .with_param("lng", point.longitude)
            .with_param("radius", radius_km);
        self.client.get_with("/specialists/nearby", options).await
    }

    pub async fn get_availability(
        &self,
        id: &str,
        date: NaiveDate,
    ) -> Result<ApiResponse<Vec<AvailabilitySlot>>, ApiError> {
        let options = RequestOptions::default().with_param("date", date.format("%Y-%m-%d"));
        self.client
            .get_with(&format!("/specialists/{}/availability", segment(id)), options)
            .await
    }

    pub async fn get_working_hours(&self) -> Result<ApiResponse<Vec<WorkingHours>>, ApiError> {
        self.client.get("/specialists/me/working-hours").await
    }

    pub async fn update_working_hours(
        &self,
        hours: &[WorkingHours],
    ) -> Result<ApiResponse<Vec<WorkingHours>>, ApiError> {
        self.client.put("/specialists/me/working-hours", hours).await
    }

    pub async fn get_stats(&self) -> Result<ApiResponse<SpecialistStats>, ApiError> {
        self.client.get("/specialists/me/stats").await
    }

    pub async fn set_online(&self, is_online: bool) -> Result<ApiResponse<Specialist>, ApiError> {
        self.client
            .put("/specialists/me/status", &json!({ "isOnline": is_online }))
            .await
    }
}
