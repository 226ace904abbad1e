//! Favorite services and specialists.

use marketplace_shared::{ApiError, ApiResponse, Favorite, FavoriteKind};
use serde::Deserialize;
use serde_json::Value;

use super::segment;
use crate::api_client::{ApiClient, RequestOptions};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FavoriteCheck {
    is_favorite: bool,
}

#[derive(Debug, Clone)]
pub struct FavoritesApi {
    client: ApiClient,
}

impl FavoritesApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get_favorites(
        &self,
        kind: Option<FavoriteKind>,
    ) -> Result<ApiResponse<Vec<Favorite>>, ApiError> {
        let mut options = RequestOptions::default();
        if let Some(kind) = kind {
            options = options.with_param("type", kind.path_segment());
        }
        self.client.get_with("/favorites", options).await
    }

    pub async fn add(&self, kind: FavoriteKind, id: &str) -> Result<ApiResponse<Favorite>, ApiError> {
        self.client.post_empty(&favorite_path(kind, id)).await
    }

    pub async fn remove(&self, kind: FavoriteKind, id: &str) -> Result<ApiResponse<Value>, ApiError> {
        self.client.delete(&favorite_path(kind, id)).await
    }

    pub async fn is_favorite(&self, kind: FavoriteKind, id: &str) -> Result<bool, ApiError> {
        let check: FavoriteCheck = self
            .client
            .get_data(&format!("{}/check", favorite_path(kind, id)))
            .await?;
        Ok(check.is_favorite)
    }
}

fn favorite_path(kind: FavoriteKind, id: &str) -> String {
    format!("/favorites/{}/{}", kind.path_segment(), segment(id))
}
