//! Service catalogue endpoints.

use marketplace_shared::{
    ApiError, ApiResponse, CreateServiceRequest, Paginated, Service, ServiceCategory,
    ServiceFilters, UpdateServiceRequest,
};
use serde_json::Value;

use super::segment;
use crate::api_client::{ApiClient, RequestOptions};

#[derive(Debug, Clone)]
pub struct ServicesApi {
    client: ApiClient,
}

impl ServicesApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get_services(
        &self,
        filters: &ServiceFilters,
    ) -> Result<ApiResponse<Paginated<Service>>, ApiError> {
        self.client
            .get_with("/services", RequestOptions::query(filters.to_query()))
            .await
    }

    pub async fn get_service(&self, id: &str) -> Result<ApiResponse<Service>, ApiError> {
        self.client.get(&format!("/services/{}", segment(id))).await
    }

    pub async fn get_categories(&self) -> Result<ApiResponse<Vec<ServiceCategory>>, ApiError> {
        self.client.get("/services/categories").await
    }

    pub async fn get_specialist_services(
        &self,
        specialist_id: &str,
    ) -> Result<ApiResponse<Vec<Service>>, ApiError> {
        self.client
            .get(&format!("/services/specialist/{}", segment(specialist_id)))
            .await
    }

    pub async fn create_service(
        &self,
        request: &CreateServiceRequest,
    ) -> Result<ApiResponse<Service>, ApiError> {
        self.client.post("/services", request).await
    }

    pub async fn update_service(
        &self,
        id: &str,
        request: &UpdateServiceRequest,
    ) -> Result<ApiResponse<Service>, ApiError> {
        self.client.put(&format!("/services/{}", segment(id)), request).await
    }

    pub async fn delete_service(&self, id: &str) -> Result<ApiResponse<Value>, ApiError> {
        self.client.delete(&format!("/services/{}", segment(id))).await
    }
}
