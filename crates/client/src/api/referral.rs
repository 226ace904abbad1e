//! Referral programme endpoints.

use marketplace_shared::{ApiError, ApiResponse, ApplyReferralRequest, Referral, ReferralInfo};
use serde_json::Value;

use crate::api_client::ApiClient;

#[derive(Debug, Clone)]
pub struct ReferralApi {
    client: ApiClient,
}

impl ReferralApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get_info(&self) -> Result<ApiResponse<ReferralInfo>, ApiError> {
        self.client.get("/referral").await
    }

    pub async fn get_referrals(&self) -> Result<ApiResponse<Vec<Referral>>, ApiError> {
        self.client.get("/referral/list").await
    }

    pub async fn apply_code(&self, code: &str) -> Result<ApiResponse<Value>, ApiError> {
        let request = ApplyReferralRequest {
            code: code.trim().to_uppercase(),
        };
        self.client.post("/referral/apply", &request).await
    }
}
