//! Payment and payment-method endpoints.

use marketplace_shared::{
    ApiError, ApiResponse, CreatePaymentIntentRequest, CreatePaymentMethodRequest, ListParams,
    Paginated, Payment, PaymentIntent, PaymentMethod, UpdatePaymentMethodRequest,
};
use serde_json::Value;

use super::segment;
use crate::api_client::{ApiClient, RequestOptions};

#[derive(Debug, Clone)]
pub struct PaymentsApi {
    client: ApiClient,
}

impl PaymentsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    // --- Payment methods ---

    pub async fn get_payment_methods(&self) -> Result<ApiResponse<Vec<PaymentMethod>>, ApiError> {
        self.client.get("/payments/methods").await
    }

    pub async fn add_payment_method(
        &self,
        request: &CreatePaymentMethodRequest,
    ) -> Result<ApiResponse<PaymentMethod>, ApiError> {
        self.client.post("/payments/methods", request).await
    }

    pub async fn update_payment_method(
        &self,
        id: &str,
        request: &UpdatePaymentMethodRequest,
    ) -> Result<ApiResponse<PaymentMethod>, ApiError> {
        self.client
            .put(&format!("/payments/methods/{}", segment(id)), request)
            .await
    }

    pub async fn delete_payment_method(&self, id: &str) -> Result<ApiResponse<Value>, ApiError> {
        self.client
            .delete(&format!("/payments/methods/{}", segment(id)))
            .await
    }

    pub async fn set_default_payment_method(
        &self,
        id: &str,
    ) -> Result<ApiResponse<PaymentMethod>, ApiError> {
        self.client
            .put(&format!("/payments/methods/{}/default", segment(id)), &serde_json::json!({}))
            .await
    }

    // --- Payments ---

    pub async fn create_payment_intent(
        &self,
        request: &CreatePaymentIntentRequest,
    ) -> Result<ApiResponse<PaymentIntent>, ApiError> {
        self.client.post("/payments/intent", request).await
    }

    pub async fn get_payment(&self, id: &str) -> Result<ApiResponse<Payment>, ApiError> {
        self.client.get(&format!("/payments/{}", segment(id))).await
    }

    pub async fn get_payment_history(
        &self,
        params: &ListParams,
    ) -> Result<ApiResponse<Paginated<Payment>>, ApiError> {
        self.client
            .get_with("/payments/history", RequestOptions::query(params.to_query()))
            .await
    }

    pub async fn request_refund(
        &self,
        id: &str,
        reason: Option<&str>,
    ) -> Result<ApiResponse<Payment>, ApiError> {
        self.client
            .post(
                &format!("/payments/{}/refund", segment(id)),
                &serde_json::json!({ "reason": reason }),
            )
            .await
    }
}
