use std::sync::{Arc, Weak};

use chrono::Utc;
use futures_channel::mpsc::{unbounded, UnboundedSender};
use marketplace_shared::{
    commands, BookingStatus, ConnectionStatus, GeoPoint, PresenceStatus, SocketEvent, SocketFrame,
    WsEnvelope,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::config::WebSocketConfig;
use super::connection::{ConnectionState, ConnectionTask, Link};
use super::error::SocketError;
use super::registry::{EventRegistry, HandlerId};

/// A running connection task and the channel feeding it.
struct Session {
    sender: UnboundedSender<WsEnvelope<SocketFrame>>,
    task: JoinHandle<()>,
    link: Link,
}

impl Session {
    fn stop(self) {
        self.link.cancel();
        self.sender.close_channel();
        self.task.abort();
    }
}

struct Inner {
    config: WebSocketConfig,
    registry: Arc<EventRegistry>,
    state: Arc<watch::Sender<ConnectionState>>,
    session: Mutex<Option<Session>>,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    fn is_connected(&self) -> bool {
        self.state.borrow().is_connected()
    }

    fn send(&self, event: &str, data: Value) -> Result<(), SocketError> {
        if !self.is_connected() {
            return Err(SocketError::NotConnected);
        }
        let session = self.session.lock();
        let session = session.as_ref().ok_or(SocketError::NotConnected)?;
        session
            .sender
            .unbounded_send(WsEnvelope::new(SocketFrame::new(event, data)))
            .map_err(|_| SocketError::ChannelClosed)
    }

    fn stop_heartbeat(&self) {
        if let Some(task) = self.heartbeat.lock().take() {
            task.abort();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(task) = self.heartbeat.get_mut().take() {
            task.abort();
        }
        if let Some(session) = self.session.get_mut().take() {
            session.stop();
        }
    }
}

/// Realtime client holding one authenticated socket.
///
/// Cheap to clone; clones share the connection and the handler registry.
/// Must be used from within a tokio runtime.
#[derive(Clone)]
pub struct SocketClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SocketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SocketClient")
            .field("config", &self.inner.config)
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}

impl SocketClient {
    pub fn new(config: WebSocketConfig) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(Inner {
                config,
                registry: Arc::new(EventRegistry::new()),
                state: Arc::new(state),
                session: Mutex::new(None),
                heartbeat: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &WebSocketConfig {
        &self.inner.config
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.state.borrow().clone()
    }

    /// Watch state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    // --- Lifecycle ---

    /// Open the socket in the background.
    ///
    /// Without a token this only logs. While a session is already running
    /// (connected or retrying) the call does nothing.
    pub fn connect(&self, user_id: Option<&str>) {
        let mut session = self.inner.session.lock();
        if session.as_ref().is_some_and(|s| !s.task.is_finished()) {
            debug!("socket session already active");
            return;
        }
        if (self.inner.config.token_provider)().is_none() {
            warn!("no auth token available, skipping socket connection");
            return;
        }
        if let Some(stale) = session.take() {
            stale.stop();
        }

        let link = Link::new(self.inner.state.clone(), self.inner.registry.clone());
        link.set_state(ConnectionState::Connecting);

        let (sender, receiver) = unbounded();
        let config = &self.inner.config;
        let task = ConnectionTask {
            base_url: config.url.clone(),
            token_provider: config.token_provider.clone(),
            user_id: user_id.map(str::to_string),
            reconnect: config.reconnect(),
            connect_timeout: config.connect_timeout,
            debug: config.debug,
            link: link.clone(),
        }
        .spawn(receiver);

        *session = Some(Session { sender, task, link });
    }

    /// Close the socket and stop the heartbeat. Safe to call repeatedly.
    pub fn disconnect(&self) {
        self.inner.stop_heartbeat();

        let Some(session) = self.inner.session.lock().take() else {
            return;
        };
        let was_connected = self.is_connected();
        session.stop();
        self.inner.state.send_replace(ConnectionState::Disconnected);
        info!("socket disconnected by client");

        if was_connected {
            let reason = "client disconnect".to_string();
            self.emit(&SocketEvent::ConnectionStatus(ConnectionStatus {
                connected: false,
                reason: Some(reason.clone()),
            }));
            self.emit(&SocketEvent::Disconnected { reason });
        }
    }

    /// Resolve to `true` once connected.
    ///
    /// Starts a connection if none is running, then waits up to
    /// `connect_timeout` for the next outcome: a successful connect yields
    /// `true`, a connect error or the timeout yields `false`.
    pub async fn ensure_connection(&self, user_id: Option<&str>) -> bool {
        if self.is_connected() {
            return true;
        }

        let mut state = self.subscribe_state();
        state.mark_unchanged();
        self.connect(user_id);
        let running = self
            .inner
            .session
            .lock()
            .as_ref()
            .is_some_and(|s| !s.task.is_finished());
        if !running {
            return false;
        }

        let outcome = async {
            loop {
                if state.changed().await.is_err() {
                    return false;
                }
                match &*state.borrow_and_update() {
                    ConnectionState::Connected => return true,
                    ConnectionState::Connecting => continue,
                    _ => return false,
                }
            }
        };

        match tokio::time::timeout(self.inner.config.connect_timeout, outcome).await {
            Ok(connected) => connected,
            Err(_) => {
                warn!(timeout = ?self.inner.config.connect_timeout, "socket connection timed out");
                false
            }
        }
    }

    // --- Local events ---

    pub fn on<F>(&self, event: &str, handler: F) -> HandlerId
    where
        F: Fn(&SocketEvent) + Send + Sync + 'static,
    {
        self.inner.registry.on(event, Arc::new(handler))
    }

    pub fn off(&self, event: &str, id: HandlerId) -> bool {
        self.inner.registry.off(event, id)
    }

    pub fn off_all(&self, event: &str) {
        self.inner.registry.off_all(event)
    }

    /// Deliver an event to local handlers only.
    pub fn emit(&self, event: &SocketEvent) -> usize {
        self.inner.registry.emit(event)
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.inner.registry
    }

    // --- Outbound ---

    /// Send a named event to the server.
    ///
    /// Nothing is buffered: while disconnected the event is dropped and
    /// `false` is returned.
    pub fn emit_to_server(&self, event: &str, data: Value) -> bool {
        match self.try_emit_to_server(event, data) {
            Ok(()) => true,
            Err(err) => {
                warn!(event, error = %err, "dropping outbound socket event");
                false
            }
        }
    }

    pub fn try_emit_to_server(&self, event: &str, data: Value) -> Result<(), SocketError> {
        self.inner.send(event, data)
    }

    pub fn join_room(&self, room: &str) -> bool {
        self.emit_to_server(commands::JOIN_ROOM, json!({ "room": room }))
    }

    pub fn leave_room(&self, room: &str) -> bool {
        self.emit_to_server(commands::LEAVE_ROOM, json!({ "room": room }))
    }

    pub fn subscribe_to_booking(&self, booking_id: &str) -> bool {
        self.emit_to_server(commands::BOOKING_SUBSCRIBE, json!({ "bookingId": booking_id }))
    }

    pub fn unsubscribe_from_booking(&self, booking_id: &str) -> bool {
        self.emit_to_server(commands::BOOKING_UNSUBSCRIBE, json!({ "bookingId": booking_id }))
    }

    pub fn update_booking_status(
        &self,
        booking_id: &str,
        status: BookingStatus,
        reason: Option<&str>,
    ) -> bool {
        self.emit_to_server(
            commands::UPDATE_BOOKING_STATUS,
            json!({ "bookingId": booking_id, "status": status, "reason": reason }),
        )
    }

    pub fn send_message(&self, conversation_id: &str, content: &str) -> bool {
        self.emit_to_server(
            commands::SEND_MESSAGE,
            json!({ "conversationId": conversation_id, "content": content }),
        )
    }

    pub fn mark_messages_read(&self, conversation_id: &str, message_ids: &[String]) -> bool {
        self.emit_to_server(
            commands::MARK_MESSAGES_READ,
            json!({ "conversationId": conversation_id, "messageIds": message_ids }),
        )
    }

    pub fn send_typing(&self, conversation_id: &str, is_typing: bool) -> bool {
        self.emit_to_server(
            commands::TYPING,
            json!({ "conversationId": conversation_id, "isTyping": is_typing }),
        )
    }

    pub fn update_presence(&self, status: PresenceStatus) -> bool {
        self.emit_to_server(commands::PRESENCE_UPDATE, json!({ "status": status }))
    }

    pub fn update_location(&self, location: GeoPoint) -> bool {
        self.emit_to_server(
            commands::UPDATE_LOCATION,
            json!({ "latitude": location.latitude, "longitude": location.longitude }),
        )
    }

    pub fn heartbeat(&self) -> bool {
        self.emit_to_server(commands::HEARTBEAT, json!({ "timestamp": Utc::now() }))
    }

    // --- Heartbeat ---

    /// Emit `heartbeat` every `heartbeat_interval` while connected.
    ///
    /// Restarts the timer if one is already running.
    pub fn start_heartbeat(&self) {
        let period = self.inner.config.heartbeat_interval;
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                if inner.is_connected() {
                    if let Err(err) = inner.send(commands::HEARTBEAT, json!({ "timestamp": Utc::now() })) {
                        debug!(error = %err, "heartbeat skipped");
                    }
                }
            }
        });

        if let Some(previous) = self.inner.heartbeat.lock().replace(task) {
            previous.abort();
        }
    }

    pub fn stop_heartbeat(&self) {
        self.inner.stop_heartbeat();
    }
}
