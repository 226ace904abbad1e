//! Review endpoints.

use marketplace_shared::{
    ApiError, ApiResponse, CreateReviewRequest, ListParams, Paginated, Review,
    ReviewResponseRequest,
};
use serde_json::Value;

use super::segment;
use crate::api_client::{ApiClient, RequestOptions};

#[derive(Debug, Clone)]
pub struct ReviewsApi {
    client: ApiClient,
}

impl ReviewsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get_specialist_reviews(
        &self,
        specialist_id: &str,
        params: &ListParams,
    ) -> Result<ApiResponse<Paginated<Review>>, ApiError> {
        self.client
            .get_with(
                &format!("/reviews/specialist/{}", segment(specialist_id)),
                RequestOptions::query(params.to_query()),
            )
            .await
    }

    pub async fn get_my_reviews(&self) -> Result<ApiResponse<Vec<Review>>, ApiError> {
        self.client.get("/reviews/my").await
    }

    pub async fn create_review(
        &self,
        request: &CreateReviewRequest,
    ) -> Result<ApiResponse<Review>, ApiError> {
        if !(1..=5).contains(&request.rating) {
            return Err(ApiError::InvalidRequest(format!(
                "rating must be between 1 and 5, got {}",
                request.rating
            )));
        }
        self.client.post("/reviews", request).await
    }

    pub async fn respond(&self, id: &str, response: &str) -> Result<ApiResponse<Review>, ApiError> {
        let request = ReviewResponseRequest {
            response: response.to_string(),
        };
        self.client
            .post(&format!("/reviews/{}/response", segment(id)), &request)
            .await
    }

    pub async fn delete_review(&self, id: &str) -> Result<ApiResponse<Value>, ApiError> {
        self.client.delete(&format!("/reviews/{}", segment(id))).await
    }
}
