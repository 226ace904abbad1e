//! Realtime client for server-pushed marketplace events.
//!
//! One [`SocketClient`] owns one authenticated WebSocket. Server frames are
//! parsed into [`SocketEvent`](marketplace_shared::SocketEvent) values and fanned
//! out to handlers registered per event name; the connection itself raises a
//! handful of local events (`socket:connected`, `connect_error`, ...) through
//! the same registry.
//!
//! ```text
//!   SocketClient ──on/off──▶ EventRegistry ◀──emit── connection task
//!        │                                            │
//!        └──── send helpers ── unbounded channel ────▶│──▶ socket
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! let socket = SocketClient::new(WebSocketConfig::from_env().with_token_provider(read_token));
//! socket.on(names::BOOKING_UPDATED, |event| {
//!     if let SocketEvent::BookingUpdated(booking) = event {
//!         refresh_booking(&booking.booking_id);
//!     }
//! });
//! if socket.ensure_connection(Some("user-7")).await {
//!     socket.subscribe_to_booking("42");
//! }
//! ```

mod client;
mod config;
mod connection;
mod error;
mod registry;

pub use client::SocketClient;
pub use config::{ReconnectConfig, WebSocketConfig, DEFAULT_WS_URL};
pub use connection::ConnectionState;
pub use error::SocketError;
pub use registry::{EventHandler, EventRegistry, HandlerId};
