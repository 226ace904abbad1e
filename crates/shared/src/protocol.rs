//! Response envelope, pagination shapes and the WebSocket frame envelope.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiErrorBody, GENERIC_ERROR_MESSAGE};

/// Uniform envelope returned by every REST endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiErrorBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Free-form metadata; list endpoints put one of the two pagination
    /// shapes here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
            meta: None,
        }
    }

    pub fn failure(error: ApiErrorBody) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            message: None,
            meta: None,
        }
    }

    /// Pagination carried in `meta`, in whichever shape the server used.
    pub fn pagination(&self) -> Option<PaginationShape> {
        let meta = self.meta.as_ref()?;
        let candidate = meta.get("pagination").unwrap_or(meta);
        serde_json::from_value(candidate.clone()).ok()
    }
}

impl<T: DeserializeOwned> ApiResponse<T> {
    /// Unwrap the `data` field.
    ///
    /// An envelope with `success: false` becomes [`ApiError::Api`] even when
    /// the transport reported 2xx. Absent `data` is read as `null`, so `()`
    /// and `Option<_>` targets succeed; anything else is [`ApiError::MissingData`].
    pub fn into_data(self) -> Result<T, ApiError> {
        if !self.success {
            let (code, message) = match self.error {
                Some(err) => (err.code, err.message),
                None => (
                    "UNKNOWN".to_string(),
                    self.message.unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string()),
                ),
            };
            return Err(ApiError::Api { code, message });
        }
        match self.data {
            Some(data) => Ok(data),
            None => T::deserialize(serde_json::Value::Null).map_err(|_| ApiError::MissingData),
        }
    }
}

// --- Pagination ---

/// 1-indexed pagination block used by the web frontend endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_per_page: Option<u32>,
}

/// `page/limit/total` pagination block used by the mini-app endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// Either pagination shape, exactly as the server sent it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PaginationShape {
    Pages(Pagination),
    Meta(PaginationMeta),
}

impl PaginationShape {
    pub fn page_info(&self) -> PageInfo {
        match self {
            PaginationShape::Pages(p) => PageInfo::from(p.clone()),
            PaginationShape::Meta(m) => PageInfo::from(m.clone()),
        }
    }
}

/// Canonical page description. Pages are 1-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub page: u32,
    pub per_page: Option<u32>,
    pub total_items: u64,
    pub total_pages: u32,
}

impl PageInfo {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

impl From<Pagination> for PageInfo {
    fn from(p: Pagination) -> Self {
        Self {
            page: p.current_page.max(1),
            per_page: p.items_per_page,
            total_items: p.total_items,
            total_pages: p.total_pages,
        }
    }
}

impl From<PaginationMeta> for PageInfo {
    fn from(m: PaginationMeta) -> Self {
        Self {
            page: m.page.max(1),
            per_page: Some(m.limit),
            total_items: m.total,
            total_pages: m.total_pages,
        }
    }
}

/// A page of results as returned inside `data` by list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    #[serde(alias = "data", alias = "results")]
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationShape>,
}

impl<T> Paginated<T> {
    pub fn page_info(&self) -> Option<PageInfo> {
        self.pagination.as_ref().map(PaginationShape::page_info)
    }
}

/// Common `page`/`limit` query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListParams {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(page) = self.page {
            query.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        query
    }
}

// --- WebSocket ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WsEnvelope<T> {
    #[serde(default)]
    pub id: String,
    #[serde(flatten)]
    pub payload: T,
    #[serde(default = "Utc::now")]
    pub ts: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl<T> WsEnvelope<T> {
    pub fn new(payload: T) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            payload,
            ts: Utc::now(),
            correlation_id: None,
        }
    }
}

/// A named event with an arbitrary JSON payload, as carried on the socket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SocketFrame {
    #[serde(rename = "type")]
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl SocketFrame {
    pub fn new(event: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }
}
