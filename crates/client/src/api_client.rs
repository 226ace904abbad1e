//! HTTP API client with bearer auth and one-shot token refresh.

use std::sync::Arc;
use std::time::Duration;

use marketplace_shared::{ApiError, ApiResponse, RefreshTokenRequest, RefreshTokenResponse};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{ApiClientConfig, TokenPair};

/// Path fragments identifying calls that establish a session. A 401 from
/// one of these means bad credentials, not an expired token.
const AUTH_ENTRY_PATHS: &[&str] = &["/login", "/register", "/telegram"];

/// Multipart field name the upload endpoints read files from.
pub const UPLOAD_FIELD: &str = "files";

/// Per-call options layered over the client configuration.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn query(query: Vec<(String, String)>) -> Self {
        Self {
            query,
            ..Default::default()
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A single in-memory file for multipart upload.
#[derive(Debug, Clone, PartialEq)]
pub struct FileUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            mime_type: None,
        }
    }

    pub fn with_mime_type(mut self, mime: impl Into<String>) -> Self {
        self.mime_type = Some(mime.into());
        self
    }

    fn to_form(&self) -> Result<reqwest::multipart::Form, ApiError> {
        let mut part =
            reqwest::multipart::Part::bytes(self.bytes.clone()).file_name(self.file_name.clone());
        if let Some(mime) = &self.mime_type {
            part = part
                .mime_str(mime)
                .map_err(|e| ApiError::InvalidRequest(format!("invalid mime type: {e}")))?;
        }
        Ok(reqwest::multipart::Form::new().part(UPLOAD_FIELD, part))
    }
}

#[derive(Debug, Clone)]
enum Payload {
    Empty,
    Json(Vec<u8>),
    File(FileUpload),
}

/// Everything needed to send (and replay) one request.
#[derive(Debug, Clone)]
struct PreparedRequest {
    method: Method,
    path: String,
    options: RequestOptions,
    payload: Payload,
}

/// Which bearer token a send should carry.
enum Auth<'a> {
    /// Ask the configured token provider.
    Provider,
    /// Use this token (the replay after a refresh).
    Token(&'a str),
    /// Send unauthenticated.
    Anonymous,
}

struct Inner {
    config: ApiClientConfig,
    static_headers: HeaderMap,
    json_content_type: HeaderValue,
}

/// HTTP client shared by every endpoint module.
///
/// Cheap to clone; all clones share one connection pool and configuration.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.inner.config)
            .finish()
    }
}

impl ApiClient {
    /// Create a new API client
    pub fn new(config: ApiClientConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ApiError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;

        let mut static_headers = HeaderMap::new();
        let mut json_content_type = HeaderValue::from_static("application/json");
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::InvalidRequest(format!("invalid header name {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::InvalidRequest(format!("invalid header value: {e}")))?;
            // Content-Type only applies to JSON bodies; multipart sets its own.
            if name == CONTENT_TYPE {
                json_content_type = value;
            } else {
                static_headers.insert(name, value);
            }
        }

        Ok(Self {
            http,
            inner: Arc::new(Inner {
                config,
                static_headers,
                json_content_type,
            }),
        })
    }

    pub fn config(&self) -> &ApiClientConfig {
        &self.inner.config
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let base = self.inner.config.base_url.trim_end_matches('/');
        if base.is_empty() {
            if path.starts_with('/') {
                path.to_string()
            } else {
                format!("/{path}")
            }
        } else {
            let path = path.trim_start_matches('/');
            format!("{base}/{path}")
        }
    }

    // --- Envelope-returning methods ---

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, ApiError> {
        self.get_with(path, RequestOptions::default()).await
    }

    pub async fn get_with<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.request(Method::GET, path, Payload::Empty, options).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<ApiResponse<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::POST, path, json_payload(body)?, RequestOptions::default())
            .await
    }

    /// POST without a request body.
    pub async fn post_empty<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<ApiResponse<T>, ApiError> {
        self.request(Method::POST, path, Payload::Empty, RequestOptions::default())
            .await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<ApiResponse<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PUT, path, json_payload(body)?, RequestOptions::default())
            .await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<ApiResponse<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::PATCH, path, json_payload(body)?, RequestOptions::default())
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, ApiError> {
        self.request(Method::DELETE, path, Payload::Empty, RequestOptions::default())
            .await
    }

    // --- Data-returning methods ---

    pub async fn get_data<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.get(path).await?.into_data()
    }

    pub async fn post_data<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.post(path, body).await?.into_data()
    }

    pub async fn put_data<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.put(path, body).await?.into_data()
    }

    pub async fn patch_data<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.patch(path, body).await?.into_data()
    }

    pub async fn delete_data<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.delete(path).await?.into_data()
    }

    /// Upload one file as the multipart field `files`.
    ///
    /// Uses the extended upload timeout and, when given, tags the upload with a
    /// `purpose` query parameter.
    pub async fn upload_file<T: DeserializeOwned>(
        &self,
        path: &str,
        file: FileUpload,
        purpose: Option<&str>,
    ) -> Result<ApiResponse<T>, ApiError> {
        let mut options = RequestOptions::default().with_timeout(self.inner.config.upload_timeout);
        if let Some(purpose) = purpose {
            options = options.with_param("purpose", purpose);
        }
        self.request(Method::POST, path, Payload::File(file), options)
            .await
    }

    // --- Core ---

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        payload: Payload,
        options: RequestOptions,
    ) -> Result<ApiResponse<T>, ApiError> {
        let request = PreparedRequest {
            method,
            path: path.to_string(),
            options,
            payload,
        };
        let body = self.execute(&request).await?;
        decode_envelope(&body)
    }

    /// Send a request, running the refresh-and-replay cycle at most once.
    async fn execute(&self, request: &PreparedRequest) -> Result<String, ApiError> {
        let err = match self.send(request, Auth::Provider).await {
            Ok(body) => return Ok(body),
            Err(err) => err,
        };

        if err.is_unauthorized() && self.should_refresh(&request.path) {
            return self.refresh_and_replay(request, err).await;
        }

        self.report(&err);
        Err(err)
    }

    fn should_refresh(&self, path: &str) -> bool {
        let path = path.split('?').next().unwrap_or(path);
        let is_auth_entry = AUTH_ENTRY_PATHS.iter().any(|p| path.contains(p));
        !is_auth_entry && self.inner.config.can_refresh()
    }

    async fn refresh_and_replay(
        &self,
        request: &PreparedRequest,
        original: ApiError,
    ) -> Result<String, ApiError> {
        let token = match self.refresh_access_token().await {
            Ok(token) => token,
            Err(refresh_err) => {
                warn!(path = %request.path, error = %refresh_err, "token refresh failed");
                if let Some(on_auth_failure) = &self.inner.config.on_auth_failure {
                    on_auth_failure();
                }
                return Err(original);
            }
        };

        // The replay is final: a second 401 is reported like any other error.
        match self.send(request, Auth::Token(&token)).await {
            Ok(body) => Ok(body),
            Err(err) => {
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Exchange the stored refresh token for a new access token and hand the
    /// new pair to the configured callback.
    async fn refresh_access_token(&self) -> Result<String, ApiError> {
        let config = &self.inner.config;
        let refresh_token = config
            .refresh_token_provider
            .as_ref()
            .and_then(|provider| provider())
            .ok_or_else(|| ApiError::InvalidRequest("no refresh token available".to_string()))?;

        let request = PreparedRequest {
            method: Method::POST,
            path: config.refresh_endpoint.clone(),
            options: RequestOptions::default(),
            payload: json_payload(&RefreshTokenRequest {
                refresh_token: refresh_token.clone(),
            })?,
        };
        let body = self.send(&request, Auth::Anonymous).await?;
        let tokens = decode_refresh(&body)?;

        if let Some(on_token_refresh) = &config.on_token_refresh {
            on_token_refresh(TokenPair {
                access_token: tokens.access_token.clone(),
                refresh_token: tokens.refresh_token.unwrap_or(refresh_token),
            });
        }
        Ok(tokens.access_token)
    }

    /// One round trip. Non-2xx statuses come back as [`ApiError::Http`].
    async fn send(&self, request: &PreparedRequest, auth: Auth<'_>) -> Result<String, ApiError> {
        let url = self.url(&request.path);
        let mut rb = self.http.request(request.method.clone(), &url);

        let mut headers = self.inner.static_headers.clone();
        for (name, value) in &request.options.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
            let value =
                HeaderValue::from_str(value).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
            headers.insert(name, value);
        }

        match &request.payload {
            Payload::Empty => {
                headers.remove(CONTENT_TYPE);
            }
            Payload::Json(bytes) => {
                if !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(CONTENT_TYPE, self.inner.json_content_type.clone());
                }
                rb = rb.body(bytes.clone());
            }
            Payload::File(file) => {
                // reqwest writes the multipart boundary into Content-Type.
                headers.remove(CONTENT_TYPE);
                rb = rb.multipart(file.to_form()?);
            }
        }
        rb = rb.headers(headers);

        let token = match auth {
            Auth::Provider => (self.inner.config.token_provider)(),
            Auth::Token(token) => Some(token.to_string()),
            Auth::Anonymous => None,
        };
        if let Some(token) = token {
            rb = rb.bearer_auth(token);
        }

        if !request.options.query.is_empty() {
            rb = rb.query(&request.options.query);
        }
        if let Some(timeout) = request.options.timeout {
            rb = rb.timeout(timeout);
        }

        if self.inner.config.debug {
            debug!(method = %request.method, %url, "api request");
        }

        let resp = rb.send().await.map_err(transport_error)?;

        let status = resp.status();
        let text = resp.text().await.map_err(transport_error)?;

        if self.inner.config.debug {
            debug!(method = %request.method, %url, status = status.as_u16(), "api response");
        }

        if !status.is_success() {
            return Err(ApiError::from_response(status.as_u16(), text));
        }
        Ok(text)
    }

    fn report(&self, err: &ApiError) {
        let Some(on_error) = &self.inner.config.on_error else {
            return;
        };
        match err {
            ApiError::Http {
                status, message, ..
            } => on_error(Some(*status), message),
            ApiError::Network(_) | ApiError::Timeout => on_error(None, &err.user_message()),
            _ => {}
        }
    }
}

fn json_payload<B: Serialize + ?Sized>(body: &B) -> Result<Payload, ApiError> {
    serde_json::to_vec(body)
        .map(Payload::Json)
        .map_err(|e| ApiError::InvalidRequest(format!("failed to encode body: {e}")))
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Network(err.to_string())
    }
}

fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<ApiResponse<T>, ApiError> {
    if body.trim().is_empty() {
        // 204 and friends
        return Ok(ApiResponse {
            success: true,
            data: None,
            error: None,
            message: None,
            meta: None,
        });
    }
    serde_json::from_str(body).map_err(|e| ApiError::Deserialize(e.to_string()))
}

/// The refresh endpoint answers either with the usual envelope or with the
/// bare token object.
fn decode_refresh(body: &str) -> Result<RefreshTokenResponse, ApiError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ApiError::Deserialize(e.to_string()))?;
    let tokens = match value.get("data") {
        Some(data) if !data.is_null() => data.clone(),
        _ => value,
    };
    serde_json::from_value(tokens).map_err(|e| ApiError::Deserialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(ApiClientConfig::new(base)).unwrap()
    }

    #[test]
    fn url_joins_base_and_path() {
        let c = client("https://api.example.com/api/");
        assert_eq!(c.url("/bookings/42"), "https://api.example.com/api/bookings/42");
        assert_eq!(c.url("bookings"), "https://api.example.com/api/bookings");
        assert_eq!(c.url("https://cdn.example.com/x"), "https://cdn.example.com/x");
    }

    #[test]
    fn url_without_base_is_rooted() {
        let c = client("");
        assert_eq!(c.url("bookings"), "/bookings");
    }

    #[test]
    fn auth_entry_paths_are_never_refreshed() {
        let config = ApiClientConfig::new("http://localhost")
            .with_refresh_token_provider(|| Some("r".to_string()))
            .on_token_refresh(|_| {});
        let c = ApiClient::new(config).unwrap();

        assert!(!c.should_refresh("/auth-enhanced/login"));
        assert!(!c.should_refresh("/auth-enhanced/register?ref=abc"));
        assert!(c.should_refresh("/bookings/42"));
    }

    #[test]
    fn refresh_accepts_enveloped_and_bare_tokens() {
        let enveloped = decode_refresh(r#"{"success":true,"data":{"accessToken":"a1"}}"#).unwrap();
        let bare = decode_refresh(r#"{"accessToken":"a2","refreshToken":"r2"}"#).unwrap();
        assert_eq!(enveloped.access_token, "a1");
        assert_eq!(enveloped.refresh_token, None);
        assert_eq!(bare.refresh_token.as_deref(), Some("r2"));
    }

    #[test]
    fn empty_body_decodes_as_success() {
        let resp: ApiResponse<serde_json::Value> = decode_envelope("").unwrap();
        assert!(resp.success);
        assert!(resp.data.is_none());
    }

    #[test]
    fn invalid_header_is_rejected_at_construction() {
        let config = ApiClientConfig::default().with_header("bad header", "x");
        assert!(matches!(ApiClient::new(config), Err(ApiError::InvalidRequest(_))));
    }
}
