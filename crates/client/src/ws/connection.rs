//! Connection task: handshake, frame pump and bounded reconnect.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_channel::mpsc::UnboundedReceiver;
use futures_util::{Sink, SinkExt, StreamExt};
use marketplace_shared::{commands, ConnectionStatus, SocketEvent, SocketFrame, WsEnvelope};
use serde_json::json;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

use super::config::ReconnectConfig;
use super::error::SocketError;
use super::registry::EventRegistry;
use crate::config::TokenProvider;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Connection state for the socket
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    Failed { reason: String },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn is_connecting(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connecting | ConnectionState::Reconnecting { .. }
        )
    }
}

/// Build the upgrade URL carrying the handshake credentials.
pub(crate) fn handshake_url(
    base: &str,
    token: &str,
    user_id: Option<&str>,
) -> Result<String, SocketError> {
    let mut url = Url::parse(base).map_err(|e| SocketError::InvalidUrl(format!("{base}: {e}")))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(SocketError::InvalidUrl(format!("unsupported scheme {other}"))),
    };
    if url.scheme() != scheme && url.set_scheme(scheme).is_err() {
        return Err(SocketError::InvalidUrl(base.to_string()));
    }

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("token", token);
        if let Some(user_id) = user_id {
            query.append_pair("userId", user_id);
        }
    }
    Ok(url.into())
}

/// State and event output of one session.
///
/// Once the owning client cancels the session, nothing the task does is
/// observable any more, even if it is still winding down.
#[derive(Clone)]
pub(crate) struct Link {
    state: Arc<watch::Sender<ConnectionState>>,
    registry: Arc<EventRegistry>,
    cancelled: Arc<AtomicBool>,
}

impl Link {
    pub(crate) fn new(
        state: Arc<watch::Sender<ConnectionState>>,
        registry: Arc<EventRegistry>,
    ) -> Self {
        Self {
            state,
            registry,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub(crate) fn set_state(&self, next: ConnectionState) {
        self.state.send_if_modified(|current| {
            if self.is_cancelled() || *current == next {
                return false;
            }
            *current = next;
            true
        });
    }

    fn emit(&self, event: SocketEvent) {
        if self.is_cancelled() {
            return;
        }
        self.registry.emit(&event);
        for alias in event.aliases() {
            self.registry.emit(&alias);
        }
    }
}

/// Everything the connection task needs; fixed for the life of a session.
pub(crate) struct ConnectionTask {
    pub base_url: String,
    pub token_provider: TokenProvider,
    pub user_id: Option<String>,
    pub reconnect: ReconnectConfig,
    pub connect_timeout: Duration,
    pub debug: bool,
    pub link: Link,
}

enum Exit {
    /// Lost an established connection; reconnect.
    Dropped(String),
    /// The socket opened but the session could not be set up.
    Rejected(SocketError),
    /// The client side went away; stop for good.
    Shutdown,
}

impl ConnectionTask {
    pub(crate) fn spawn(
        self,
        receiver: UnboundedReceiver<WsEnvelope<SocketFrame>>,
    ) -> JoinHandle<()> {
        tokio::spawn(self.run(receiver))
    }

    async fn run(self, mut receiver: UnboundedReceiver<WsEnvelope<SocketFrame>>) {
        let mut failures = 0u32;
        self.link.set_state(ConnectionState::Connecting);

        loop {
            let err = match self.open().await {
                Ok(ws) => match self.pump(ws, &mut receiver).await {
                    Exit::Shutdown => {
                        self.link.set_state(ConnectionState::Disconnected);
                        return;
                    }
                    Exit::Dropped(reason) => {
                        failures = 0;
                        info!(url = %self.base_url, %reason, "socket closed");
                        // Attempt 0 marks the gap before the first retry.
                        self.link.set_state(ConnectionState::Reconnecting { attempt: 0 });
                        self.link.emit(SocketEvent::ConnectionStatus(ConnectionStatus {
                            connected: false,
                            reason: Some(reason.clone()),
                        }));
                        self.link.emit(SocketEvent::Disconnected { reason });
                        tokio::time::sleep(self.reconnect.delay_for_attempt(0)).await;
                        continue;
                    }
                    Exit::Rejected(err) => err,
                },
                Err(err) => err,
            };

            failures += 1;
            warn!(url = %self.base_url, attempt = failures, error = %err, "socket connect failed");
            self.link.emit(SocketEvent::ConnectError {
                attempt: failures,
                message: err.to_string(),
            });

            if self.reconnect.exhausted(failures) {
                self.link.emit(SocketEvent::ConnectionFailed { attempts: failures });
                self.link.set_state(ConnectionState::Failed {
                    reason: format!("max reconnect attempts ({failures}) exceeded"),
                });
                return;
            }

            let delay = self.reconnect.delay_for_attempt(failures - 1);
            debug!(url = %self.base_url, ?delay, attempt = failures + 1, "reconnecting");
            self.link.set_state(ConnectionState::Reconnecting { attempt: failures });
            tokio::time::sleep(delay).await;
        }
    }

    /// One handshake. The token is read fresh on every attempt.
    async fn open(&self) -> Result<WsStream, SocketError> {
        let token = (self.token_provider)().ok_or(SocketError::MissingToken)?;
        let url = handshake_url(&self.base_url, &token, self.user_id.as_deref())?;

        match tokio::time::timeout(self.connect_timeout, connect_async(url.as_str())).await {
            Ok(Ok((ws, _response))) => Ok(ws),
            Ok(Err(e)) => Err(SocketError::Transport(e)),
            Err(_) => Err(SocketError::ConnectTimeout(self.connect_timeout)),
        }
    }

    async fn pump(
        &self,
        ws: WsStream,
        receiver: &mut UnboundedReceiver<WsEnvelope<SocketFrame>>,
    ) -> Exit {
        let (mut write, mut read) = ws.split();

        if let Some(user_id) = &self.user_id {
            let join = WsEnvelope::new(SocketFrame::new(
                commands::JOIN_ROOM,
                json!({ "room": format!("user:{user_id}") }),
            ));
            if let Err(e) = self.write_frame(&mut write, &join).await {
                return Exit::Rejected(e);
            }
        }

        self.link.set_state(ConnectionState::Connected);
        info!(url = %self.base_url, "socket connected");
        self.link.emit(SocketEvent::ConnectionStatus(ConnectionStatus {
            connected: true,
            reason: None,
        }));
        self.link.emit(SocketEvent::Connected);

        loop {
            tokio::select! {
                incoming = read.next() => match incoming {
                    Some(Ok(Message::Text(text))) => self.dispatch(&text),
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame
                            .map(|f| f.reason.to_string())
                            .filter(|r| !r.is_empty())
                            .unwrap_or_else(|| "server closed the connection".to_string());
                        return Exit::Dropped(reason);
                    }
                    Some(Ok(_)) => {
                        // Pings are answered by tungstenite; binary frames are not used.
                    }
                    Some(Err(e)) => return Exit::Dropped(e.to_string()),
                    None => return Exit::Dropped("transport closed".to_string()),
                },
                outgoing = receiver.next() => match outgoing {
                    Some(envelope) => {
                        if let Err(e) = self.write_frame(&mut write, &envelope).await {
                            return Exit::Dropped(e.to_string());
                        }
                    }
                    None => {
                        let _ = write.send(Message::Close(None)).await;
                        return Exit::Shutdown;
                    }
                },
            }
        }
    }

    async fn write_frame<S>(
        &self,
        write: &mut S,
        envelope: &WsEnvelope<SocketFrame>,
    ) -> Result<(), SocketError>
    where
        S: Sink<Message, Error = tungstenite::Error> + Unpin,
    {
        let json = serde_json::to_string(envelope)?;
        if self.debug {
            debug!(event = %envelope.payload.event, frame = %json, "socket send");
        }
        write.send(Message::text(json)).await?;
        Ok(())
    }

    fn dispatch(&self, text: &str) {
        let envelope = match serde_json::from_str::<WsEnvelope<SocketFrame>>(text) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "ignoring malformed socket frame");
                return;
            }
        };
        if self.debug {
            debug!(event = %envelope.payload.event, "socket receive");
        }
        let SocketFrame { event, data } = envelope.payload;
        self.link.emit(SocketEvent::from_wire(&event, data));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_url_carries_credentials() {
        let url = handshake_url("ws://localhost:3000/ws", "abc", Some("u 1")).unwrap();
        assert_eq!(url, "ws://localhost:3000/ws?token=abc&userId=u+1");
    }

    #[test]
    fn http_urls_map_to_socket_schemes() {
        let url = handshake_url("https://api.example.com/socket", "t", None).unwrap();
        assert_eq!(url, "wss://api.example.com/socket?token=t");
    }

    #[test]
    fn unsupported_scheme_is_rejected() {
        assert!(matches!(
            handshake_url("ftp://example.com", "t", None),
            Err(SocketError::InvalidUrl(_))
        ));
        assert!(handshake_url("not a url", "t", None).is_err());
    }

    #[test]
    fn cancelled_link_publishes_nothing() {
        let (tx, rx) = watch::channel(ConnectionState::Disconnected);
        let link = Link::new(Arc::new(tx), Arc::new(EventRegistry::new()));
        link.set_state(ConnectionState::Connecting);
        assert_eq!(*rx.borrow(), ConnectionState::Connecting);

        link.cancel();
        link.set_state(ConnectionState::Connected);
        assert_eq!(*rx.borrow(), ConnectionState::Connecting);
    }
}
