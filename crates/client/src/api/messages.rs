//! Conversation and chat message endpoints.

use marketplace_shared::{
    ApiError, ApiResponse, ChatMessage, Conversation, ListParams, Paginated, SendMessageRequest,
    StartConversationRequest,
};
use serde_json::Value;

use super::segment;
use crate::api_client::{ApiClient, RequestOptions};

#[derive(Debug, Clone)]
pub struct MessagesApi {
    client: ApiClient,
}

impl MessagesApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get_conversations(&self) -> Result<ApiResponse<Vec<Conversation>>, ApiError> {
        self.client.get("/messages/conversations").await
    }

    pub async fn get_conversation(&self, id: &str) -> Result<ApiResponse<Conversation>, ApiError> {
        self.client
            .get(&format!("/messages/conversations/{}", segment(id)))
            .await
    }

    pub async fn start_conversation(
        &self,
        request: &StartConversationRequest,
    ) -> Result<ApiResponse<Conversation>, ApiError> {
        self.client.post("/messages/conversations", request).await
    }

    pub async fn get_messages(
        &self,
        conversation_id: &str,
        params: &ListParams,
    ) -> Result<ApiResponse<Paginated<ChatMessage>>, ApiError> {
        self.client
            .get_with(
                &format!("/messages/conversations/{}/messages", segment(conversation_id)),
                RequestOptions::query(params.to_query()),
            )
            .await
    }

    pub async fn send_message(
        &self,
        conversation_id: &str,
        request: &SendMessageRequest,
    ) -> Result<ApiResponse<ChatMessage>, ApiError> {
        self.client
            .post(
                &format!("/messages/conversations/{}/messages", segment(conversation_id)),
                request,
            )
            .await
    }

    pub async fn mark_conversation_read(
        &self,
        conversation_id: &str,
    ) -> Result<ApiResponse<Value>, ApiError> {
        self.client
            .put(
                &format!("/messages/conversations/{}/read", segment(conversation_id)),
                &serde_json::json!({}),
            )
            .await
    }
}
