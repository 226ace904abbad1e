//! Specialist expense tracking endpoints.

use chrono::NaiveDate;
use marketplace_shared::{
    ApiError, ApiResponse, CreateExpenseRequest, Expense, ExpenseSummary, ListParams, Paginated,
    UploadedFile,
};
use serde_json::Value;

use super::segment;
use crate::api_client::{ApiClient, FileUpload, RequestOptions};

#[derive(Debug, Clone)]
pub struct ExpensesApi {
    client: ApiClient,
}

impl ExpensesApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get_expenses(
        &self,
        params: &ListParams,
    ) -> Result<ApiResponse<Paginated<Expense>>, ApiError> {
        self.client
            .get_with("/expenses", RequestOptions::query(params.to_query()))
            .await
    }

    pub async fn create_expense(
        &self,
        request: &CreateExpenseRequest,
    ) -> Result<ApiResponse<Expense>, ApiError> {
        self.client.post("/expenses", request).await
    }

    pub async fn update_expense(
        &self,
        id: &str,
        request: &CreateExpenseRequest,
    ) -> Result<ApiResponse<Expense>, ApiError> {
        self.client.put(&format!("/expenses/{}", segment(id)), request).await
    }

    pub async fn delete_expense(&self, id: &str) -> Result<ApiResponse<Value>, ApiError> {
        self.client.delete(&format!("/expenses/{}", segment(id))).await
    }

    pub async fn get_summary(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<ApiResponse<ExpenseSummary>, ApiError> {
        let options = RequestOptions::default()
            .with_param("from", from.format("%Y-%m-%d"))
            .with_param("to", to.format("%Y-%m-%d"));
        self.client.get_with("/expenses/summary", options).await
    }

    pub async fn upload_receipt(
        &self,
        file: FileUpload,
    ) -> Result<ApiResponse<Vec<UploadedFile>>, ApiError> {
        self.client.upload_file("/files/upload", file, Some("receipt")).await
    }
}
