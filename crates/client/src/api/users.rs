//! User profile endpoints.

use marketplace_shared::{ApiError, ApiResponse, UpdateProfileRequest, UploadedFile, User};
use serde_json::Value;

use super::segment;
use crate::api_client::{ApiClient, FileUpload};

#[derive(Debug, Clone)]
pub struct UsersApi {
    client: ApiClient,
}

impl UsersApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get_profile(&self) -> Result<ApiResponse<User>, ApiError> {
        self.client.get("/users/profile").await
    }

    pub async fn update_profile(
        &self,
        request: &UpdateProfileRequest,
    ) -> Result<ApiResponse<User>, ApiError> {
        self.client.put("/users/profile", request).await
    }

    pub async fn upload_avatar(
        &self,
        file: FileUpload,
    ) -> Result<ApiResponse<Vec<UploadedFile>>, ApiError> {
        self.client.upload_file("/users/avatar", file, Some("avatar")).await
    }

    pub async fn get_user(&self, id: &str) -> Result<ApiResponse<User>, ApiError> {
        self.client.get(&format!("/users/{}", segment(id))).await
    }

    pub async fn delete_account(&self) -> Result<ApiResponse<Value>, ApiError> {
        self.client.delete("/users/account").await
    }
}
