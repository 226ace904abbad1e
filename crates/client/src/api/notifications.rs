//! Notification endpoints.

use marketplace_shared::{
    ApiError, ApiResponse, ListParams, Notification, NotificationPreferences, Paginated,
    UnreadCount,
};
use serde_json::Value;

use super::segment;
use crate::api_client::{ApiClient, RequestOptions};

#[derive(Debug, Clone)]
pub struct NotificationsApi {
    client: ApiClient,
}

impl NotificationsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get_notifications(
        &self,
        params: &ListParams,
        unread_only: bool,
    ) -> Result<ApiResponse<Paginated<Notification>>, ApiError> {
        let mut options = RequestOptions::query(params.to_query());
        if unread_only {
            options = options.with_param("unreadOnly", true);
        }
        self.client.get_with("/notifications", options).await
    }

    pub async fn get_unread_count(&self) -> Result<ApiResponse<UnreadCount>, ApiError> {
        self.client.get("/notifications/unread-count").await
    }

    pub async fn mark_as_read(&self, id: &str) -> Result<ApiResponse<Value>, ApiError> {
        self.client
            .put(&format!("/notifications/{}/read", segment(id)), &serde_json::json!({}))
            .await
    }

    pub async fn mark_all_as_read(&self) -> Result<ApiResponse<Value>, ApiError> {
        self.client
            .put("/notifications/read-all", &serde_json::json!({}))
            .await
    }

    pub async fn delete_notification(&self, id: &str) -> Result<ApiResponse<Value>, ApiError> {
        self.client.delete(&format!("/notifications/{}", segment(id))).await
    }

    pub async fn get_preferences(&self) -> Result<ApiResponse<NotificationPreferences>, ApiError> {
        self.client.get("/notifications/preferences").await
    }

    pub async fn update_preferences(
        &self,
        preferences: &NotificationPreferences,
    ) -> Result<ApiResponse<NotificationPreferences>, ApiError> {
        self.client.put("/notifications/preferences", preferences).await
    }
}
