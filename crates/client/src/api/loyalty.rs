//! Loyalty programme endpoints.

use marketplace_shared::{
    ApiError, ApiResponse, ListParams, LoyaltyAccount, LoyaltyReward, LoyaltyTransaction,
    Paginated, RedeemRewardRequest,
};

use crate::api_client::{ApiClient, RequestOptions};

#[derive(Debug, Clone)]
pub struct LoyaltyApi {
    client: ApiClient,
}

impl LoyaltyApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get_account(&self) -> Result<ApiResponse<LoyaltyAccount>, ApiError> {
        self.client.get("/loyalty").await
    }

    pub async fn get_transactions(
        &self,
        params: &ListParams,
    ) -> Result<ApiResponse<Paginated<LoyaltyTransaction>>, ApiError> {
        self.client
            .get_with("/loyalty/transactions", RequestOptions::query(params.to_query()))
            .await
    }

    pub async fn get_rewards(&self) -> Result<ApiResponse<Vec<LoyaltyReward>>, ApiError> {
        self.client.get("/loyalty/rewards").await
    }

    pub async fn redeem(&self, reward_id: &str) -> Result<ApiResponse<LoyaltyAccount>, ApiError> {
        let request = RedeemRewardRequest {
            reward_id: reward_id.to_string(),
        };
        self.client.post("/loyalty/redeem", &request).await
    }
}
