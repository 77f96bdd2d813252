//! The live connection to the remote radio daemon: HTTP session
//! negotiation, the control-plane WebSocket (status/audio/error/pong in,
//! tune/ping out), and bounded reconnection with backoff.
//!
//! The spectrum stream (`config`/`frame`, C7) is a second, independent
//! WebSocket — see [`crate::spectrum::SpectrumClient`] — since it has its
//! own lifecycle and the core must keep rendering a cached spectrum even
//! if the control-plane socket briefly drops.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use crate::protocol::{
    ConnectionOutcome, ConnectionRequest, ControlIn, ControlOut, ReceiverDescription,
    PING_INTERVAL_SECS, PONG_TIMEOUT_SECS,
};

/// Errors surfaced by the connector. Most map directly onto §7's error
/// kinds; [`ConnectorError::SessionConflict`] and
/// [`ConnectorError::Rejected`] are the two that are fatal to the session.
#[derive(Error, Debug, Clone)]
pub enum ConnectorError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("connection timed out")]
    Timeout,
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("failed to send command")]
    SendFailed,
    #[error("session rejected: HTTP {0}")]
    Rejected(u16),
    #[error("session terminated by daemon")]
    Terminated,
    #[error("session conflict: {0}")]
    SessionConflict(String),
    #[error("connection closed")]
    Closed,
}

pub type ConnectorResult<T> = Result<T, ConnectorError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    /// Terminal: a `SessionConflict` or `Rejected` closed the session and
    /// reconnection is suppressed (§7).
    Closed,
}

/// An event surfaced to the session layer: either a parsed inbound message
/// or a connection lifecycle transition.
#[derive(Debug, Clone)]
pub enum ConnectorEvent {
    StateChanged(ConnectionState),
    Message(ControlIn),
    /// The connector gave up and will not retry (session-conflict/rejected).
    Fatal(ConnectorError),
}

const INITIAL_BACKOFF_MS: u64 = 250;
const MAX_BACKOFF_MS: u64 = 10_000;

/// Connection configuration: the negotiated WebSocket URL and session id.
#[derive(Debug, Clone)]
pub struct ConnectorConfig {
    pub ws_url: String,
    pub user_session_id: String,
}

/// Negotiate a session over HTTP (§6: `POST /connection`). Returns the
/// outcome; the caller only opens the WebSocket on [`ConnectionOutcome::Ok`].
pub async fn negotiate_connection(
    base_url: &str,
    session_id: &str,
) -> ConnectorResult<ConnectionOutcome> {
    let client = reqwest::Client::new();
    let url = format!("{}/connection", base_url.trim_end_matches('/'));
    let response = client
        .post(&url)
        .json(&ConnectionRequest {
            user_session_id: session_id.to_string(),
        })
        .send()
        .await
        .map_err(|e| ConnectorError::ConnectionFailed(e.to_string()))?;
    Ok(ConnectionOutcome::from_status(response.status().as_u16()))
}

/// `GET /api/description` (§6 HTTP).
pub async fn fetch_receiver_description(base_url: &str) -> ConnectorResult<ReceiverDescription> {
    let url = format!("{}/api/description", base_url.trim_end_matches('/'));
    reqwest::get(&url)
        .await
        .map_err(|e| ConnectorError::ConnectionFailed(e.to_string()))?
        .json::<ReceiverDescription>()
        .await
        .map_err(|e| ConnectorError::Protocol(e.to_string()))
}

/// The live control-plane connection. One per session; reconnects
/// transparently on a dropped socket unless a fatal error closed it.
pub struct RadioConnector {
    config: ConnectorConfig,
    state: Arc<RwLock<ConnectionState>>,
    event_tx: broadcast::Sender<ConnectorEvent>,
    command_tx: mpsc::Sender<ControlOut>,
    command_rx: Arc<tokio::sync::Mutex<Option<mpsc::Receiver<ControlOut>>>>,
    running: Arc<AtomicBool>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl RadioConnector {
    pub fn new(config: ConnectorConfig) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        let (command_tx, command_rx) = mpsc::channel(64);
        Self {
            config,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            event_tx,
            command_tx,
            command_rx: Arc::new(tokio::sync::Mutex::new(Some(command_rx))),
            running: Arc::new(AtomicBool::new(false)),
            task: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConnectorEvent> {
        self.event_tx.subscribe()
    }

    /// Opens the control-plane WebSocket and spawns the read/ping loop
    /// with reconnect-with-backoff. Reconnection reinitialises the
    /// session's media clock on the caller side (§5: "Reconnection
    /// reinitialises the clock and triggers the first-frame fade-in") —
    /// this connector only reports the transition via `StateChanged`.
    pub fn connect(&mut self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return; // already running
        }

        let config = self.config.clone();
        let state = Arc::clone(&self.state);
        let event_tx = self.event_tx.clone();
        let command_rx = Arc::clone(&self.command_rx);
        let running = Arc::clone(&self.running);

        let handle = tokio::spawn(async move {
            let mut backoff_ms = INITIAL_BACKOFF_MS;
            let mut rx_guard = command_rx.lock().await;
            let mut command_rx = rx_guard.take().expect("command receiver already taken");
            drop(rx_guard);

            while running.load(Ordering::SeqCst) {
                set_state(&state, &event_tx, ConnectionState::Connecting);

                match run_session(&config, &state, &event_tx, &mut command_rx).await {
                    Ok(()) => {
                        // Clean shutdown requested by disconnect().
                        break;
                    }
                    Err(ConnectorError::SessionConflict(detail)) => {
                        set_state(&state, &event_tx, ConnectionState::Closed);
                        let _ = event_tx
                            .send(ConnectorEvent::Fatal(ConnectorError::SessionConflict(detail)));
                        break;
                    }
                    Err(ConnectorError::Rejected(code)) => {
                        set_state(&state, &event_tx, ConnectionState::Closed);
                        let _ = event_tx.send(ConnectorEvent::Fatal(ConnectorError::Rejected(code)));
                        break;
                    }
                    Err(other) => {
                        log::warn!("control connection dropped: {other}, retrying in {backoff_ms}ms");
                        set_state(&state, &event_tx, ConnectionState::Reconnecting);
                        tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                        backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
                    }
                }
            }

            set_state(&state, &event_tx, ConnectionState::Disconnected);
        });

        self.task = Some(handle);
    }

    /// §5 "Cancellation & timeout": disconnecting aborts in-flight work and
    /// suppresses reconnection.
    pub fn disconnect(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        *self.state.write() = ConnectionState::Disconnected;
    }

    /// Queue an outbound message (`tune`/`ping`). Never blocks; a full
    /// queue drops the write, matching the parameter-delivery policy
    /// elsewhere in the pipeline (a later write supersedes it anyway).
    pub fn send(&self, message: ControlOut) -> bool {
        self.command_tx.try_send(message).is_ok()
    }
}

impl Drop for RadioConnector {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn set_state(
    state: &Arc<RwLock<ConnectionState>>,
    event_tx: &broadcast::Sender<ConnectorEvent>,
    new_state: ConnectionState,
) {
    *state.write() = new_state;
    let _ = event_tx.send(ConnectorEvent::StateChanged(new_state));
}

/// Runs one connection attempt to completion: connects, spawns the ping
/// timer, and pumps inbound/outbound messages until the socket closes or
/// a fatal error is observed. Returns `Ok(())` only when the caller asked
/// for a clean shutdown (never reached by a dropped socket).
async fn run_session(
    config: &ConnectorConfig,
    state: &Arc<RwLock<ConnectionState>>,
    event_tx: &broadcast::Sender<ConnectorEvent>,
    command_rx: &mut mpsc::Receiver<ControlOut>,
) -> ConnectorResult<()> {
    let url = Url::parse(&config.ws_url)
        .map_err(|e| ConnectorError::ConnectionFailed(format!("invalid URL: {e}")))?;

    let (ws_stream, _) = tokio::time::timeout(Duration::from_secs(10), connect_async(url))
        .await
        .map_err(|_| ConnectorError::Timeout)?
        .map_err(|e| ConnectorError::ConnectionFailed(e.to_string()))?;

    set_state(state, event_tx, ConnectionState::Connected);
    log::info!("control connection established (session {})", config.user_session_id);

    let (mut write, mut read) = ws_stream.split();
    let mut ping_interval = tokio::time::interval(Duration::from_secs(PING_INTERVAL_SECS));
    ping_interval.tick().await; // first tick fires immediately; skip it

    let mut awaiting_pong_since: Option<tokio::time::Instant> = None;

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                let ping = serde_json::to_string(&ControlOut::Ping)
                    .map_err(|e| ConnectorError::Protocol(e.to_string()))?;
                write.send(Message::Text(ping)).await
                    .map_err(|e| ConnectorError::ConnectionFailed(e.to_string()))?;
                if let Some(since) = awaiting_pong_since {
                    if since.elapsed() > Duration::from_secs(PONG_TIMEOUT_SECS) {
                        return Err(ConnectorError::ConnectionFailed("pong timeout".into()));
                    }
                }
                awaiting_pong_since = Some(tokio::time::Instant::now());
            }

            outbound = command_rx.recv() => {
                match outbound {
                    Some(command) => {
                        let text = serde_json::to_string(&command)
                            .map_err(|e| ConnectorError::Protocol(e.to_string()))?;
                        write.send(Message::Text(text)).await
                            .map_err(|e| ConnectorError::ConnectionFailed(e.to_string()))?;
                    }
                    None => return Ok(()), // connector dropped, shut down cleanly
                }
            }

            inbound = read.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        let parsed: ControlIn = serde_json::from_str(&text)
                            .map_err(|e| ConnectorError::Protocol(format!("bad message: {e}")))?;
                        match &parsed {
                            ControlIn::Pong => {
                                awaiting_pong_since = None;
                            }
                            ControlIn::Error { error } if ControlIn::is_session_conflict(error) => {
                                return Err(ConnectorError::SessionConflict(error.clone()));
                            }
                            _ => {}
                        }
                        let _ = event_tx.send(ConnectorEvent::Message(parsed));
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return Err(ConnectorError::ConnectionFailed("socket closed".into()));
                    }
                    Some(Ok(_)) => {} // binary/ping/pong frames carry no payload we use
                    Some(Err(e)) => return Err(ConnectorError::ConnectionFailed(e.to_string())),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_disconnected() {
        let connector = RadioConnector::new(ConnectorConfig {
            ws_url: "ws://localhost:8073/ws".into(),
            user_session_id: "abc123".into(),
        });
        assert_eq!(connector.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn send_before_connect_is_accepted_by_the_queue() {
        let connector = RadioConnector::new(ConnectorConfig {
            ws_url: "ws://localhost:8073/ws".into(),
            user_session_id: "abc123".into(),
        });
        assert!(connector.send(ControlOut::Ping));
    }

    #[test]
    fn disconnect_without_connect_is_a_no_op() {
        let mut connector = RadioConnector::new(ConnectorConfig {
            ws_url: "ws://localhost:8073/ws".into(),
            user_session_id: "abc123".into(),
        });
        connector.disconnect();
        assert_eq!(connector.state(), ConnectionState::Disconnected);
    }
}
