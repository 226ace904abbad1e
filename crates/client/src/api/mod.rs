//! Typed endpoint modules.
//!
//! Each module wraps a clone of the shared [`ApiClient`] and exposes one method
//! per backend route. [`MarketplaceApi`] hands them out.
//!
//! ```rust,ignore
//! let api = MarketplaceApi::new(ApiClientConfig::from_env().with_token_provider(read_token))?;
//! let booking = api.bookings().get_booking("42").await?;
//! ```

pub mod auth;
pub mod bookings;
pub mod community;
pub mod expenses;
pub mod favorites;
pub mod help;
pub mod locations;
pub mod loyalty;
pub mod messages;
pub mod notifications;
pub mod payments;
pub mod referral;
pub mod reviews;
pub mod services;
pub mod specialists;
pub mod users;

use marketplace_shared::{ApiError, ApiResponse, UploadedFile};

use crate::api_client::{ApiClient, FileUpload};
use crate::config::ApiClientConfig;

pub use auth::AuthApi;
pub use bookings::BookingsApi;
pub use community::CommunityApi;
pub use expenses::ExpensesApi;
pub use favorites::FavoritesApi;
pub use help::HelpApi;
pub use locations::LocationsApi;
pub use loyalty::LoyaltyApi;
pub use messages::MessagesApi;
pub use notifications::NotificationsApi;
pub use payments::PaymentsApi;
pub use referral::ReferralApi;
pub use reviews::ReviewsApi;
pub use services::ServicesApi;
pub use specialists::SpecialistsApi;
pub use users::UsersApi;

/// Percent-encode one path segment.
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Entry point handing out the endpoint modules over one shared client.
#[derive(Debug, Clone)]
pub struct MarketplaceApi {
    client: ApiClient,
}

impl MarketplaceApi {
    pub fn new(config: ApiClientConfig) -> Result<Self, ApiError> {
        Ok(Self::from_client(ApiClient::new(config)?))
    }

    pub fn from_client(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.client.clone())
    }

    pub fn bookings(&self) -> BookingsApi {
        BookingsApi::new(self.client.clone())
    }

    pub fn services(&self) -> ServicesApi {
        ServicesApi::new(self.client.clone())
    }

    pub fn users(&self) -> UsersApi {
        UsersApi::new(self.client.clone())
    }

    pub fn specialists(&self) -> SpecialistsApi {
        SpecialistsApi::new(self.client.clone())
    }

    pub fn reviews(&self) -> ReviewsApi {
        ReviewsApi::new(self.client.clone())
    }

    pub fn payments(&self) -> PaymentsApi {
        PaymentsApi::new(self.client.clone())
    }

    pub fn notifications(&self) -> NotificationsApi {
        NotificationsApi::new(self.client.clone())
    }

    pub fn messages(&self) -> MessagesApi {
        MessagesApi::new(self.client.clone())
    }

    pub fn community(&self) -> CommunityApi {
        CommunityApi::new(self.client.clone())
    }

    pub fn loyalty(&self) -> LoyaltyApi {
        LoyaltyApi::new(self.client.clone())
    }

    pub fn favorites(&self) -> FavoritesApi {
        FavoritesApi::new(self.client.clone())
    }

    pub fn referral(&self) -> ReferralApi {
        ReferralApi::new(self.client.clone())
    }

    pub fn help(&self) -> HelpApi {
        HelpApi::new(self.client.clone())
    }

    pub fn locations(&self) -> LocationsApi {
        LocationsApi::new(self.client.clone())
    }

    pub fn expenses(&self) -> ExpensesApi {
        ExpensesApi::new(self.client.clone())
    }

    /// Generic upload endpoint used for avatars, portfolio images and receipts.
    pub async fn upload(
        &self,
        file: FileUpload,
        purpose: Option<&str>,
    ) -> Result<ApiResponse<Vec<UploadedFile>>, ApiError> {
        self.client.upload_file("/files/upload", file, purpose).await
    }
}
