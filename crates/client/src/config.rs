//! HTTP client configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Returns the current access (or refresh) token, if any.
pub type TokenProvider = Arc<dyn Fn() -> Option<String> + Send + Sync>;
/// Called with freshly issued tokens after a successful refresh.
pub type TokenRefreshCallback = Arc<dyn Fn(TokenPair) + Send + Sync>;
/// Called once when a refresh attempt fails and the session is unusable.
pub type AuthFailureCallback = Arc<dyn Fn() + Send + Sync>;
/// Called for every failed request that is not resolved by a refresh.
/// The status is `None` when the server never answered.
pub type ErrorCallback = Arc<dyn Fn(Option<u16>, &str) + Send + Sync>;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_REFRESH_ENDPOINT: &str = "/auth/refresh";

/// Access token plus the refresh token to store alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Configuration for an [`ApiClient`](crate::ApiClient).
///
/// Built once per consuming application and frozen when the client is
/// created. Token providers are consulted on every request; the client never
/// keeps a token of its own.
#[derive(Clone)]
pub struct ApiClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub upload_timeout: Duration,
    pub token_provider: TokenProvider,
    pub refresh_token_provider: Option<TokenProvider>,
    pub on_token_refresh: Option<TokenRefreshCallback>,
    pub on_auth_failure: Option<AuthFailureCallback>,
    pub on_error: Option<ErrorCallback>,
    pub refresh_endpoint: String,
    pub headers: Vec<(String, String)>,
    pub debug: bool,
}

impl ApiClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            upload_timeout: DEFAULT_UPLOAD_TIMEOUT,
            token_provider: Arc::new(|| None),
            refresh_token_provider: None,
            on_token_refresh: None,
            on_auth_failure: None,
            on_error: None,
            refresh_endpoint: DEFAULT_REFRESH_ENDPOINT.to_string(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            debug: false,
        }
    }

    /// Build a configuration from environment variables.
    ///
    /// Environment variables:
    /// - `MARKETPLACE_API_URL`: API base URL (default: "http://localhost:3000/api")
    /// - `MARKETPLACE_API_TIMEOUT_MS`: request timeout in milliseconds (default: 15000)
    /// - `MARKETPLACE_DEBUG`: "1" or "true" enables request logging
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("MARKETPLACE_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let mut config = Self::new(base_url).with_debug(env_flag("MARKETPLACE_DEBUG"));
        if let Some(ms) = std::env::var("MARKETPLACE_API_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.timeout = Duration::from_millis(ms);
        }
        config
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_upload_timeout(mut self, timeout: Duration) -> Self {
        self.upload_timeout = timeout;
        self
    }

    pub fn with_token_provider(
        mut self,
        provider: impl Fn() -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.token_provider = Arc::new(provider);
        self
    }

    pub fn with_refresh_token_provider(
        mut self,
        provider: impl Fn() -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.refresh_token_provider = Some(Arc::new(provider));
        self
    }

    pub fn on_token_refresh(mut self, callback: impl Fn(TokenPair) + Send + Sync + 'static) -> Self {
        self.on_token_refresh = Some(Arc::new(callback));
        self
    }

    pub fn on_auth_failure(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_auth_failure = Some(Arc::new(callback));
        self
    }

    pub fn on_error(
        mut self,
        callback: impl Fn(Option<u16>, &str) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }

    pub fn with_refresh_endpoint(mut self, path: impl Into<String>) -> Self {
        self.refresh_endpoint = path.into();
        self
    }

    /// Add a header sent with every request. A header with the same name
    /// (case-insensitive) replaces the previous value.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Whether a 401 can be recovered through the refresh flow.
    pub fn can_refresh(&self) -> bool {
        self.refresh_token_provider.is_some() && self.on_token_refresh.is_some()
    }
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl fmt::Debug for ApiClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClientConfig")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("upload_timeout", &self.upload_timeout)
            .field("refresh_endpoint", &self.refresh_endpoint)
            .field("can_refresh", &self.can_refresh())
            .field("headers", &self.headers)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

pub(crate) fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ApiClientConfig::new("https://api.example.com");
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.upload_timeout, Duration::from_secs(30));
        assert_eq!(config.refresh_endpoint, "/auth/refresh");
        assert!(!config.can_refresh());
        assert_eq!((config.token_provider)(), None);
    }

    #[test]
    fn with_header_replaces_case_insensitively() {
        let config = ApiClientConfig::default()
            .with_header("content-type", "application/vnd.api+json")
            .with_header("X-App", "mini-app");

        assert_eq!(config.headers.len(), 2);
        assert_eq!(config.headers[0].1, "application/vnd.api+json");
    }

    #[test]
    fn refresh_needs_both_provider_and_callback() {
        let partial = ApiClientConfig::default().with_refresh_token_provider(|| None);
        assert!(!partial.can_refresh());
        assert!(partial.on_token_refresh(|_| {}).can_refresh());
    }
}
