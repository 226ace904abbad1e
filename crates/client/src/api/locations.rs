//! Geocoding and saved address endpoints.

use marketplace_shared::{
    Address, ApiError, ApiResponse, GeoPoint, GeocodeResult, UpdateLocationRequest,
};
use serde_json::Value;

use super::segment;
use crate::api_client::{ApiClient, RequestOptions};

#[derive(Debug, Clone)]
pub struct LocationsApi {
    client: ApiClient,
}

impl LocationsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn geocode(&self, address: &str) -> Result<ApiResponse<Vec<GeocodeResult>>, ApiError> {
        let options = RequestOptions::default().with_param("address", address);
        self.client.get_with("/locations/geocode", options).await
    }

    pub async fn reverse_geocode(
        &self,
        point: GeoPoint,
    ) -> Result<ApiResponse<GeocodeResult>, ApiError> {
        let options = RequestOptions::default()
            .with_param("lat", point.latitude)
            .with_param("lng", point.longitude);
        self.client.get_with("/locations/reverse", options).await
    }

    pub async fn get_addresses(&self) -> Result<ApiResponse<Vec<Address>>, ApiError> {
        self.client.get("/locations/addresses").await
    }

    pub async fn add_address(&self, address: &Address) -> Result<ApiResponse<Address>, ApiError> {
        self.client.post("/locations/addresses", address).await
    }

    pub async fn update_address(
        &self,
        id: &str,
        address: &Address,
    ) -> Result<ApiResponse<Address>, ApiError> {
        self.client
            .put(&format!("/locations/addresses/{}", segment(id)), address)
            .await
    }

    pub async fn delete_address(&self, id: &str) -> Result<ApiResponse<Value>, ApiError> {
        self.client
            .delete(&format!("/locations/addresses/{}", segment(id)))
            .await
    }

    pub async fn update_my_location(
        &self,
        request: &UpdateLocationRequest,
    ) -> Result<ApiResponse<Value>, ApiError> {
        self.client.put("/locations/me", request).await
    }
}
