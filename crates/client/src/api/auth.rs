//! Authentication endpoints.

use marketplace_shared::{
    ApiError, ApiResponse, AuthResponse, ChangePasswordRequest, ForgotPasswordRequest,
    LoginRequest, RefreshTokenRequest, RefreshTokenResponse, RegisterRequest, ResetPasswordRequest,
    TelegramAuthRequest, User,
};
use serde_json::{json, Value};

use crate::api_client::ApiClient;

#[derive(Debug, Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<ApiResponse<AuthResponse>, ApiError> {
        self.client.post("/auth-enhanced/login", request).await
    }

    pub async fn register(
        &self,
        request: &RegisterRequest,
    ) -> Result<ApiResponse<AuthResponse>, ApiError> {
        self.client.post("/auth-enhanced/register", request).await
    }

    /// Mini-app login using the messenger's signed init data.
    pub async fn telegram_login(&self, init_data: &str) -> Result<ApiResponse<AuthResponse>, ApiError> {
        let request = TelegramAuthRequest {
            init_data: init_data.to_string(),
        };
        self.client.post("/auth-enhanced/telegram", &request).await
    }

    pub async fn logout(&self) -> Result<ApiResponse<Value>, ApiError> {
        self.client.post_empty("/auth-enhanced/logout").await
    }

    pub async fn current_user(&self) -> Result<ApiResponse<User>, ApiError> {
        self.client.get("/auth-enhanced/me").await
    }

    /// Explicit refresh. Requests failing with 401 already refresh on their own.
    pub async fn refresh(
        &self,
        refresh_token: &str,
    ) -> Result<ApiResponse<RefreshTokenResponse>, ApiError> {
        let request = RefreshTokenRequest {
            refresh_token: refresh_token.to_string(),
        };
        let path = self.client.config().refresh_endpoint.clone();
        self.client.post(&path, &request).await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<ApiResponse<Value>, ApiError> {
        let request = ForgotPasswordRequest {
            email: email.to_string(),
        };
        self.client.post("/auth-enhanced/forgot-password", &request).await
    }

    pub async fn reset_password(
        &self,
        request: &ResetPasswordRequest,
    ) -> Result<ApiResponse<Value>, ApiError> {
        self.client.post("/auth-enhanced/reset-password", request).await
    }

    pub async fn change_password(
        &self,
        request: &ChangePasswordRequest,
    ) -> Result<ApiResponse<Value>, ApiError> {
        self.client.post("/auth-enhanced/change-password", request).await
    }

    pub async fn verify_email(&self, token: &str) -> Result<ApiResponse<Value>, ApiError> {
        self.client
            .post("/auth-enhanced/verify-email", &json!({ "token": token }))
            .await
    }
}
