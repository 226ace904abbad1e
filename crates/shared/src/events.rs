//! Socket event catalogue.
//!
//! Every event the server pushes is parsed into a [`SocketEvent`] variant
//! keyed by its wire name, so handlers match on a typed payload. Names the
//! catalogue does not know arrive as [`SocketEvent::Other`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Booking, BookingStatus, ChatMessage, Conversation, GeoPoint, Notification, PaymentStatus, Review};

/// Server → client event names.
pub mod names {
    pub const BOOKING_CREATED: &str = "booking:created";
    pub const BOOKING_UPDATED: &str = "booking:updated";
    pub const BOOKING_STATUS_CHANGED: &str = "booking:status_changed";
    pub const BOOKING_CONFIRMED: &str = "booking:confirmed";
    pub const BOOKING_CANCELLED: &str = "booking:cancelled";
    pub const BOOKING_COMPLETED: &str = "booking:completed";
    pub const BOOKING_RESCHEDULED: &str = "booking:rescheduled";
    pub const BOOKING_REMINDER: &str = "booking:reminder";

    pub const PAYMENT_COMPLETED: &str = "payment:completed";
    pub const PAYMENT_FAILED: &str = "payment:failed";
    pub const PAYMENT_REFUNDED: &str = "payment:refunded";
    pub const PAYMENT_STATUS_CHANGED: &str = "payment:status_changed";

    pub const MESSAGE_NEW: &str = "message:new";
    pub const MESSAGE_READ: &str = "message:read";
    pub const USER_TYPING: &str = "message:typing";
    pub const CONVERSATION_UPDATED: &str = "conversation:updated";

    pub const NOTIFICATION: &str = "notification";
    pub const NOTIFICATION_NEW: &str = "notification:new";
    pub const NOTIFICATION_READ: &str = "notification:read";

    pub const SPECIALIST_STATUS_CHANGED: &str = "specialist:status_changed";
    pub const SPECIALIST_LOCATION_UPDATED: &str = "specialist:location_updated";
    pub const SPECIALIST_AVAILABILITY_CHANGED: &str = "specialist:availability_changed";
    pub const PRESENCE_UPDATED: &str = "presence:updated";
    pub const USER_ONLINE: &str = "user:online";
    pub const USER_OFFLINE: &str = "user:offline";

    pub const SYSTEM_ANNOUNCEMENT: &str = "system:announcement";
    pub const SYSTEM_MAINTENANCE: &str = "system:maintenance";
    pub const SERVER_ERROR: &str = "error";

    pub const REVIEW_CREATED: &str = "review:created";
    pub const REVIEW_RESPONSE: &str = "review:response";

    /// Every server event the client re-broadcasts to local listeners.
    pub const SERVER_EVENTS: &[&str] = &[
        BOOKING_CREATED,
        BOOKING_UPDATED,
        BOOKING_STATUS_CHANGED,
        BOOKING_CONFIRMED,
        BOOKING_CANCELLED,
        BOOKING_COMPLETED,
        BOOKING_RESCHEDULED,
        BOOKING_REMINDER,
        PAYMENT_COMPLETED,
        PAYMENT_FAILED,
        PAYMENT_REFUNDED,
        PAYMENT_STATUS_CHANGED,
        MESSAGE_NEW,
        MESSAGE_READ,
        USER_TYPING,
        CONVERSATION_UPDATED,
        NOTIFICATION,
        NOTIFICATION_NEW,
        NOTIFICATION_READ,
        SPECIALIST_STATUS_CHANGED,
        SPECIALIST_LOCATION_UPDATED,
        SPECIALIST_AVAILABILITY_CHANGED,
        PRESENCE_UPDATED,
        USER_ONLINE,
        USER_OFFLINE,
        SYSTEM_ANNOUNCEMENT,
        SYSTEM_MAINTENANCE,
        SERVER_ERROR,
        REVIEW_CREATED,
        REVIEW_RESPONSE,
    ];

    // Raised locally by the socket client, never sent by the server.
    pub const CONNECTION_STATUS: &str = "connection_status";
    pub const SOCKET_CONNECTED: &str = "socket:connected";
    pub const SOCKET_DISCONNECTED: &str = "socket:disconnected";
    pub const SOCKET_CONNECTION_FAILED: &str = "socket:connection_failed";
    pub const CONNECT_ERROR: &str = "connect_error";
}

/// Client → server event names.
pub mod commands {
    pub const JOIN_ROOM: &str = "join_room";
    pub const LEAVE_ROOM: &str = "leave_room";
    pub const BOOKING_SUBSCRIBE: &str = "booking:subscribe";
    pub const BOOKING_UNSUBSCRIBE: &str = "booking:unsubscribe";
    pub const UPDATE_BOOKING_STATUS: &str = "update_booking_status";
    pub const SEND_MESSAGE: &str = "send_message";
    pub const MARK_MESSAGES_READ: &str = "messages:mark_read";
    pub const TYPING: &str = "typing";
    pub const PRESENCE_UPDATE: &str = "presence:update";
    pub const UPDATE_LOCATION: &str = "update_location";
    pub const HEARTBEAT: &str = "heartbeat";
}

// --- Payloads ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingEvent {
    #[serde(alias = "id")]
    pub booking_id: String,
    #[serde(default)]
    pub status: Option<BookingStatus>,
    #[serde(default)]
    pub previous_status: Option<BookingStatus>,
    #[serde(default)]
    pub booking: Option<Booking>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEvent {
    #[serde(default, alias = "id")]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub booking_id: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub status: Option<PaymentStatus>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessagesReadEvent {
    pub conversation_id: String,
    pub reader_id: String,
    #[serde(default)]
    pub message_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TypingEvent {
    pub conversation_id: String,
    pub user_id: String,
    pub is_typing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationReadEvent {
    #[serde(default)]
    pub notification_ids: Vec<String>,
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpecialistStatusEvent {
    pub specialist_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub is_online: Option<bool>,
    #[serde(default)]
    pub is_available: Option<bool>,
    #[serde(default)]
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Away,
    Busy,
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEvent {
    pub user_id: String,
    #[serde(default)]
    pub status: Option<PresenceStatus>,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SystemEvent {
    pub message: String,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerErrorEvent {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewEvent {
    #[serde(alias = "id")]
    pub review_id: String,
    #[serde(default)]
    pub booking_id: Option<String>,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub review: Option<Review>,
}

/// Local connection status notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub connected: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

// --- Events ---

#[derive(Debug, Clone, PartialEq)]
pub enum SocketEvent {
    BookingCreated(BookingEvent),
    BookingUpdated(BookingEvent),
    BookingStatusChanged(BookingEvent),
    BookingConfirmed(BookingEvent),
    BookingCancelled(BookingEvent),
    BookingCompleted(BookingEvent),
    BookingRescheduled(BookingEvent),
    BookingReminder(BookingEvent),

    PaymentCompleted(PaymentEvent),
    PaymentFailed(PaymentEvent),
    PaymentRefunded(PaymentEvent),
    PaymentStatusChanged(PaymentEvent),

    MessageNew(ChatMessage),
    MessageRead(MessagesReadEvent),
    Typing(TypingEvent),
    ConversationUpdated(Conversation),

    Notification(Notification),
    NotificationNew(Notification),
    NotificationRead(NotificationReadEvent),

    SpecialistStatusChanged(SpecialistStatusEvent),
    SpecialistLocationUpdated(SpecialistStatusEvent),
    SpecialistAvailabilityChanged(SpecialistStatusEvent),
    PresenceUpdated(PresenceEvent),
    UserOnline(PresenceEvent),
    UserOffline(PresenceEvent),

    SystemAnnouncement(SystemEvent),
    SystemMaintenance(SystemEvent),
    ServerError(ServerErrorEvent),

    ReviewCreated(ReviewEvent),
    ReviewResponse(ReviewEvent),

    ConnectionStatus(ConnectionStatus),
    Connected,
    Disconnected { reason: String },
    ConnectionFailed { attempts: u32 },
    ConnectError { attempt: u32, message: String },

    /// An event outside the catalogue, or one whose payload did not match
    /// the expected shape.
    Other { name: String, data: Value },
}

impl SocketEvent {
    /// Parse a named server event. Never fails: anything that does not fit
    /// the catalogue becomes [`SocketEvent::Other`].
    pub fn from_wire(name: &str, data: Value) -> Self {
        match Self::try_typed(name, &data) {
            Some(event) => event,
            None => SocketEvent::Other {
                name: name.to_string(),
                data,
            },
        }
    }

    fn try_typed(name: &str, data: &Value) -> Option<Self> {
        fn parse<T: serde::de::DeserializeOwned>(data: &Value) -> Option<T> {
            serde_json::from_value(data.clone()).ok()
        }

        use names::*;
        let event = match name {
            BOOKING_CREATED => SocketEvent::BookingCreated(parse(data)?),
            BOOKING_UPDATED => SocketEvent::BookingUpdated(parse(data)?),
            BOOKING_STATUS_CHANGED => SocketEvent::BookingStatusChanged(parse(data)?),
            BOOKING_CONFIRMED => SocketEvent::BookingConfirmed(parse(data)?),
            BOOKING_CANCELLED => SocketEvent::BookingCancelled(parse(data)?),
            BOOKING_COMPLETED => SocketEvent::BookingCompleted(parse(data)?),
            BOOKING_RESCHEDULED => SocketEvent::BookingRescheduled(parse(data)?),
            BOOKING_REMINDER => SocketEvent::BookingReminder(parse(data)?),
            PAYMENT_COMPLETED => SocketEvent::PaymentCompleted(parse(data)?),
            PAYMENT_FAILED => SocketEvent::PaymentFailed(parse(data)?),
            PAYMENT_REFUNDED => SocketEvent::PaymentRefunded(parse(data)?),
            PAYMENT_STATUS_CHANGED => SocketEvent::PaymentStatusChanged(parse(data)?),
            MESSAGE_NEW => SocketEvent::MessageNew(parse(data)?),
            MESSAGE_READ => SocketEvent::MessageRead(parse(data)?),
            USER_TYPING => SocketEvent::Typing(parse(data)?),
            CONVERSATION_UPDATED => SocketEvent::ConversationUpdated(parse(data)?),
            NOTIFICATION => SocketEvent::Notification(parse(data)?),
            NOTIFICATION_NEW => SocketEvent::NotificationNew(parse(data)?),
            NOTIFICATION_READ => SocketEvent::NotificationRead(parse(data)?),
            SPECIALIST_STATUS_CHANGED => SocketEvent::SpecialistStatusChanged(parse(data)?),
            SPECIALIST_LOCATION_UPDATED => SocketEvent::SpecialistLocationUpdated(parse(data)?),
            SPECIALIST_AVAILABILITY_CHANGED => {
                SocketEvent::SpecialistAvailabilityChanged(parse(data)?)
            }
            PRESENCE_UPDATED => SocketEvent::PresenceUpdated(parse(data)?),
            USER_ONLINE => SocketEvent::UserOnline(parse(data)?),
            USER_OFFLINE => SocketEvent::UserOffline(parse(data)?),
            SYSTEM_ANNOUNCEMENT => SocketEvent::SystemAnnouncement(parse(data)?),
            SYSTEM_MAINTENANCE => SocketEvent::SystemMaintenance(parse(data)?),
            SERVER_ERROR => SocketEvent::ServerError(parse(data)?),
            REVIEW_CREATED => SocketEvent::ReviewCreated(parse(data)?),
            REVIEW_RESPONSE => SocketEvent::ReviewResponse(parse(data)?),
            _ => return None,
        };
        Some(event)
    }

    /// Wire name this event is dispatched under.
    pub fn name(&self) -> &str {
        use names::*;
        match self {
            SocketEvent::BookingCreated(_) => BOOKING_CREATED,
            SocketEvent::BookingUpdated(_) => BOOKING_UPDATED,
            SocketEvent::BookingStatusChanged(_) => BOOKING_STATUS_CHANGED,
            SocketEvent::BookingConfirmed(_) => BOOKING_CONFIRMED,
            SocketEvent::BookingCancelled(_) => BOOKING_CANCELLED,
            SocketEvent::BookingCompleted(_) => BOOKING_COMPLETED,
            SocketEvent::BookingRescheduled(_) => BOOKING_RESCHEDULED,
            SocketEvent::BookingReminder(_) => BOOKING_REMINDER,
            SocketEvent::PaymentCompleted(_) => PAYMENT_COMPLETED,
            SocketEvent::PaymentFailed(_) => PAYMENT_FAILED,
            SocketEvent::PaymentRefunded(_) => PAYMENT_REFUNDED,
            SocketEvent::PaymentStatusChanged(_) => PAYMENT_STATUS_CHANGED,
            SocketEvent::MessageNew(_) => MESSAGE_NEW,
            SocketEvent::MessageRead(_) => MESSAGE_READ,
            SocketEvent::Typing(_) => USER_TYPING,
            SocketEvent::ConversationUpdated(_) => CONVERSATION_UPDATED,
            SocketEvent::Notification(_) => NOTIFICATION,
            SocketEvent::NotificationNew(_) => NOTIFICATION_NEW,
            SocketEvent::NotificationRead(_) => NOTIFICATION_READ,
            SocketEvent::SpecialistStatusChanged(_) => SPECIALIST_STATUS_CHANGED,
            SocketEvent::SpecialistLocationUpdated(_) => SPECIALIST_LOCATION_UPDATED,
            SocketEvent::SpecialistAvailabilityChanged(_) => SPECIALIST_AVAILABILITY_CHANGED,
            SocketEvent::PresenceUpdated(_) => PRESENCE_UPDATED,
            SocketEvent::UserOnline(_) => USER_ONLINE,
            SocketEvent::UserOffline(_) => USER_OFFLINE,
            SocketEvent::SystemAnnouncement(_) => SYSTEM_ANNOUNCEMENT,
            SocketEvent::SystemMaintenance(_) => SYSTEM_MAINTENANCE,
            SocketEvent::ServerError(_) => SERVER_ERROR,
            SocketEvent::ReviewCreated(_) => REVIEW_CREATED,
            SocketEvent::ReviewResponse(_) => REVIEW_RESPONSE,
            SocketEvent::ConnectionStatus(_) => CONNECTION_STATUS,
            SocketEvent::Connected => SOCKET_CONNECTED,
            SocketEvent::Disconnected { .. } => SOCKET_DISCONNECTED,
            SocketEvent::ConnectionFailed { .. } => SOCKET_CONNECTION_FAILED,
            SocketEvent::ConnectError { .. } => CONNECT_ERROR,
            SocketEvent::Other { name, .. } => name,
        }
    }

    /// Additional events a generic notification implies.
    ///
    /// The server announces some state changes only through a `notification`
    /// envelope; these are re-raised under their specific names so listeners
    /// need only subscribe in one place.
    pub fn aliases(&self) -> Vec<SocketEvent> {
        match self {
            SocketEvent::Notification(n) | SocketEvent::NotificationNew(n) => {
                match serde_json::to_value(n) {
                    Ok(raw) => notification_aliases(&raw),
                    Err(_) => Vec::new(),
                }
            }
            SocketEvent::Other { name, data }
                if name == names::NOTIFICATION || name == names::NOTIFICATION_NEW =>
            {
                notification_aliases(data)
            }
            _ => Vec::new(),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(
            self,
            SocketEvent::ConnectionStatus(_)
                | SocketEvent::Connected
                | SocketEvent::Disconnected { .. }
                | SocketEvent::ConnectionFailed { .. }
                | SocketEvent::ConnectError { .. }
        )
    }
}

/// Read the notification `type` straight from the JSON so that partial
/// payloads still re-raise their specific event.
fn notification_aliases(raw: &Value) -> Vec<SocketEvent> {
    let Some(kind) = raw.get("type").and_then(Value::as_str) else {
        return Vec::new();
    };
    let details = raw.get("data").filter(|d| d.is_object());

    let payment = || {
        details
            .and_then(|d| serde_json::from_value::<PaymentEvent>(d.clone()).ok())
            .unwrap_or_else(|| PaymentEvent {
                message: raw.get("message").and_then(Value::as_str).map(str::to_string),
                ..PaymentEvent::default()
            })
    };

    let alias = match kind.to_ascii_uppercase().as_str() {
        "PAYMENT_COMPLETED" => Some(SocketEvent::PaymentCompleted(payment())),
        "PAYMENT_FAILED" => Some(SocketEvent::PaymentFailed(payment())),
        kind if kind.starts_with("BOOKING_") => details
            .and_then(|d| serde_json::from_value::<BookingEvent>(d.clone()).ok())
            .map(SocketEvent::BookingUpdated),
        _ => None,
    };
    alias.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn known_event_parses_to_typed_variant() {
        let event = SocketEvent::from_wire(
            names::BOOKING_STATUS_CHANGED,
            json!({ "bookingId": "42", "status": "confirmed", "previousStatus": "PENDING" }),
        );

        match &event {
            SocketEvent::BookingStatusChanged(payload) => {
                assert_eq!(payload.booking_id, "42");
                assert_eq!(payload.status, Some(BookingStatus::Confirmed));
                assert_eq!(payload.previous_status, Some(BookingStatus::Pending));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(event.name(), names::BOOKING_STATUS_CHANGED);
    }

    #[test]
    fn mismatched_payload_falls_back_to_other() {
        let event = SocketEvent::from_wire(names::BOOKING_CREATED, json!("not an object"));
        assert_eq!(event.name(), names::BOOKING_CREATED);
        assert!(matches!(event, SocketEvent::Other { .. }));
    }

    #[test]
    fn unknown_event_keeps_its_name() {
        let event = SocketEvent::from_wire("promo:flash_sale", json!({ "discount": 10 }));
        assert_eq!(event.name(), "promo:flash_sale");
    }

    #[test]
    fn payment_notification_aliases_to_payment_completed() {
        let event = SocketEvent::from_wire(
            names::NOTIFICATION,
            json!({
                "id": "n1",
                "type": "PAYMENT_COMPLETED",
                "title": "Paid",
                "message": "Your payment went through",
                "data": { "paymentId": "p1", "bookingId": "b1", "amount": 50.0 }
            }),
        );

        let aliases = event.aliases();
        assert_eq!(aliases.len(), 1);
        match &aliases[0] {
            SocketEvent::PaymentCompleted(p) => {
                assert_eq!(p.payment_id.as_deref(), Some("p1"));
                assert_eq!(p.amount, Some(50.0));
            }
            other => panic!("unexpected alias: {other:?}"),
        }
    }

    #[test]
    fn payment_notification_without_data_still_aliases() {
        let event = SocketEvent::from_wire(
            names::NOTIFICATION,
            json!({
                "id": "n2",
                "type": "PAYMENT_COMPLETED",
                "title": "Paid",
                "message": "Payment received"
            }),
        );

        let aliases = event.aliases();
        assert_eq!(aliases.len(), 1);
        match &aliases[0] {
            SocketEvent::PaymentCompleted(p) => {
                assert_eq!(p.payment_id, None);
                assert_eq!(p.message.as_deref(), Some("Payment received"));
            }
            other => panic!("unexpected alias: {other:?}"),
        }
    }

    #[test]
    fn partial_notification_aliases_from_raw_payload() {
        let event = SocketEvent::from_wire(
            names::NOTIFICATION,
            json!({ "type": "PAYMENT_COMPLETED", "data": { "paymentId": "p1" } }),
        );
        assert!(matches!(event, SocketEvent::Other { .. }));

        let aliases = event.aliases();
        assert_eq!(aliases.len(), 1);
        match &aliases[0] {
            SocketEvent::PaymentCompleted(p) => assert_eq!(p.payment_id.as_deref(), Some("p1")),
            other => panic!("unexpected alias: {other:?}"),
        }
    }

    #[test]
    fn unrelated_notification_has_no_alias() {
        let event = SocketEvent::from_wire(
            names::NOTIFICATION,
            json!({ "id": "n3", "type": "PROMO", "title": "Sale", "message": "10% off" }),
        );
        assert!(event.aliases().is_empty());
        assert!(SocketEvent::from_wire("promo:flash_sale", json!({ "type": "PAYMENT_COMPLETED" }))
            .aliases()
            .is_empty());
    }

    #[test]
    fn catalogue_names_round_trip() {
        for name in names::SERVER_EVENTS {
            let event = SocketEvent::from_wire(name, Value::Null);
            assert_eq!(event.name(), *name);
        }
    }
}
