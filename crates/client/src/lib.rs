//! Marketplace Client - shared API and realtime client layer
//!
//! This crate contains the HTTP API client, the per-domain endpoint modules
//! and the WebSocket client used by both the web frontend and the mini-app.

pub mod api;
pub mod api_client;
pub mod config;
pub mod ws;

pub use api::MarketplaceApi;
pub use api_client::{ApiClient, FileUpload, RequestOptions};
pub use config::{ApiClientConfig, TokenPair};
pub use ws::{ConnectionState, HandlerId, SocketClient, WebSocketConfig};

pub use marketplace_shared as shared;
