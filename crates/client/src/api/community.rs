//! Community feed endpoints.

use marketplace_shared::{
    ApiError, ApiResponse, CommunityPost, CreateCommentRequest, CreatePostRequest, ListParams,
    Paginated, PostComment,
};
use serde_json::Value;

use super::segment;
use crate::api_client::{ApiClient, RequestOptions};

#[derive(Debug, Clone)]
pub struct CommunityApi {
    client: ApiClient,
}

impl CommunityApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get_posts(
        &self,
        params: &ListParams,
        category: Option<&str>,
    ) -> Result<ApiResponse<Paginated<CommunityPost>>, ApiError> {
        let mut options = RequestOptions::query(params.to_query());
        if let Some(category) = category {
            options = options.with_param("category", category);
        }
        self.client.get_with("/community/posts", options).await
    }

    pub async fn get_post(&self, id: &str) -> Result<ApiResponse<CommunityPost>, ApiError> {
        self.client.get(&format!("/community/posts/{}", segment(id))).await
    }

    pub async fn create_post(
        &self,
        request: &CreatePostRequest,
    ) -> Result<ApiResponse<CommunityPost>, ApiError> {
        self.client.post("/community/posts", request).await
    }

    pub async fn delete_post(&self, id: &str) -> Result<ApiResponse<Value>, ApiError> {
        self.client.delete(&format!("/community/posts/{}", segment(id))).await
    }

    pub async fn like_post(&self, id: &str) -> Result<ApiResponse<Value>, ApiError> {
        self.client
            .post_empty(&format!("/community/posts/{}/like", segment(id)))
            .await
    }

    pub async fn unlike_post(&self, id: &str) -> Result<ApiResponse<Value>, ApiError> {
        self.client
            .delete(&format!("/community/posts/{}/like", segment(id)))
            .await
    }

    pub async fn get_comments(&self, post_id: &str) -> Result<ApiResponse<Vec<PostComment>>, ApiError> {
        self.client
            .get(&format!("/community/posts/{}/comments", segment(post_id)))
            .await
    }

    pub async fn add_comment(
        &self,
        post_id: &str,
        content: &str,
    ) -> Result<ApiResponse<PostComment>, ApiError> {
        let request = CreateCommentRequest {
            content: content.to_string(),
        };
        self.client
            .post(&format!("/community/posts/{}/comments", segment(post_id)), &request)
            .await
    }
}
