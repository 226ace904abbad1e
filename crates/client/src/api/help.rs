//! Help centre and support endpoints.

use marketplace_shared::{
    ApiError, ApiResponse, CreateSupportTicketRequest, FaqItem, HelpArticle, SupportTicket,
};

use super::segment;
use crate::api_client::{ApiClient, RequestOptions};

#[derive(Debug, Clone)]
pub struct HelpApi {
    client: ApiClient,
}

impl HelpApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get_faq(&self, category: Option<&str>) -> Result<ApiResponse<Vec<FaqItem>>, ApiError> {
        let mut options = RequestOptions::default();
        if let Some(category) = category {
            options = options.with_param("category", category);
        }
        self.client.get_with("/help/faq", options).await
    }

    pub async fn get_articles(&self) -> Result<ApiResponse<Vec<HelpArticle>>, ApiError> {
        self.client.get("/help/articles").await
    }

    pub async fn get_article(&self, id: &str) -> Result<ApiResponse<HelpArticle>, ApiError> {
        self.client.get(&format!("/help/articles/{}", segment(id))).await
    }

    pub async fn get_tickets(&self) -> Result<ApiResponse<Vec<SupportTicket>>, ApiError> {
        self.client.get("/help/tickets").await
    }

    pub async fn create_ticket(
        &self,
        request: &CreateSupportTicketRequest,
    ) -> Result<ApiResponse<SupportTicket>, ApiError> {
        self.client.post("/help/tickets", request).await
    }
}
