//! Backend websocket link with fixed-interval reconnect.
//!
//! [`ConnectionManager`] owns zero or one open connection. A poll task
//! checks once per interval whether a connection exists and opens one if
//! not. Decoded inbound frames are forwarded over an mpsc channel; outbound
//! messages go through [`ConnectionManager::send`], which silently drops
//! them while no connection is open.
//!
//! # Example
//!
//! ```rust,ignore
//! use tokio::sync::mpsc;
//! use tokio_util::sync::CancellationToken;
//! use vccs_api::{ConnectionManager, ReconnectConfig, Outbound};
//!
//! let (inbound_tx, mut inbound_rx) = mpsc::unbounded_channel();
//! let cancel = CancellationToken::new();
//! let url = "ws://127.0.0.1:9002".parse()?;
//!
//! let manager = ConnectionManager::new(url, ReconnectConfig::default(), inbound_tx, cancel.clone());
//! manager.spawn();
//! manager.send(&Outbound::Sync);
//!
//! while let Some(message) = inbound_rx.recv().await {
//!     println!("{message:?}");
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::protocol::{self, Inbound, Outbound};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ── ConnectionState ──────────────────────────────────────────────────

/// Link state observable by consumers for UI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Fixed-interval reconnect policy. Retries are unbounded.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// How often the poll checks for a missing connection. Default: 1s.
    pub poll_interval: Duration,

    /// Upper bound on a single connection attempt. Default: 10s.
    pub connect_timeout: Duration,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

// ── ConnectionManager ────────────────────────────────────────────────

/// Handle to the backend link.
///
/// Cheaply cloneable. Cancel the token passed to [`new`](Self::new) (or
/// call [`shutdown`](Self::shutdown)) to stop the poll and close the link.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

struct Inner {
    url: Url,
    config: ReconnectConfig,
    /// Outbound queue of the open connection, `None` while disconnected.
    link: ArcSwapOption<mpsc::UnboundedSender<String>>,
    state: watch::Sender<ConnectionState>,
    inbound_tx: mpsc::UnboundedSender<Inbound>,
    /// Held for the duration of a connection attempt.
    open_gate: Mutex<()>,
    cancel: CancellationToken,
}

impl ConnectionManager {
    pub fn new(
        url: Url,
        config: ReconnectConfig,
        inbound_tx: mpsc::UnboundedSender<Inbound>,
        cancel: CancellationToken,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);

        Self {
            inner: Arc::new(Inner {
                url,
                config,
                link: ArcSwapOption::empty(),
                state,
                inbound_tx,
                open_gate: Mutex::new(()),
                cancel,
            }),
        }
    }

    /// Spawn the reconnect poll. The first check runs immediately.
    pub fn spawn(&self) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move { manager.poll_loop().await })
    }

    /// Open a connection if none exists.
    ///
    /// Returns `true` only when this call opened a new connection. Calling
    /// it while a connection is open (or while another attempt is in
    /// flight) is a no-op.
    pub async fn ensure_connected(&self) -> bool {
        if self.is_connected() || self.inner.cancel.is_cancelled() {
            return false;
        }
        let Ok(_gate) = self.inner.open_gate.try_lock() else {
            return false;
        };
        if self.is_connected() {
            return false;
        }

        self.inner.state.send_replace(ConnectionState::Connecting);

        match open(&self.inner.url, self.inner.config.connect_timeout).await {
            Ok(stream) => {
                let (out_tx, out_rx) = mpsc::unbounded_channel();
                self.inner.link.store(Some(Arc::new(out_tx)));
                self.inner.state.send_replace(ConnectionState::Connected);
                tracing::info!(url = %self.inner.url, "backend connected");

                self.send(&Outbound::Sync);

                let inner = Arc::clone(&self.inner);
                tokio::spawn(run_link(inner, stream, out_rx));
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, url = %self.inner.url, "backend connect failed");
                self.inner.state.send_replace(ConnectionState::Disconnected);
                false
            }
        }
    }

    /// Queue a message on the open connection.
    ///
    /// Dropped without error when no connection is open. Nothing is
    /// buffered for later delivery.
    pub fn send(&self, message: &Outbound) {
        let Some(link) = self.inner.link.load_full() else {
            tracing::trace!(kind = message.kind(), "not connected, dropping message");
            return;
        };

        match message.encode() {
            Ok(text) => {
                if link.send(text).is_err() {
                    tracing::trace!(kind = message.kind(), "link closing, dropping message");
                }
            }
            Err(e) => tracing::warn!(error = %e, kind = message.kind(), "failed to encode message"),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.inner.link.load().is_some()
    }

    /// Subscribe to connection state changes.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    /// Stop the poll and close any open connection.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    async fn poll_loop(self) {
        let mut interval = tokio::time::interval(self.inner.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = self.inner.cancel.cancelled() => break,
                _ = interval.tick() => {
                    self.ensure_connected().await;
                }
            }
        }

        self.inner.link.store(None);
        self.inner.state.send_replace(ConnectionState::Disconnected);
        tracing::debug!("connection poll exiting");
    }
}

// ── Single connection lifecycle ──────────────────────────────────────

async fn open(url: &Url, timeout: Duration) -> Result<WsStream, Error> {
    tracing::debug!(url = %url, "opening backend connection");

    let uri: tungstenite::http::Uri = url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;

    let request = ClientRequestBuilder::new(uri);
    let (stream, _response) = tokio::time::timeout(timeout, tokio_tungstenite::connect_async(request))
        .await
        .map_err(|_| Error::Timeout {
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })?
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    Ok(stream)
}

/// Pump one open connection until it drops, then clear the handle.
async fn run_link(inner: Arc<Inner>, stream: WsStream, mut out_rx: mpsc::UnboundedReceiver<String>) {
    let (mut write, mut read) = stream.split();

    let result: Result<(), Error> = loop {
        tokio::select! {
            biased;
            () = inner.cancel.cancelled() => {
                let _ = write.send(tungstenite::Message::Close(None)).await;
                break Ok(());
            }
            outgoing = out_rx.recv() => {
                let Some(text) = outgoing else { break Ok(()) };
                if let Err(e) = write.send(tungstenite::Message::text(text)).await {
                    break Err(Error::WebSocketConnect(e.to_string()));
                }
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        dispatch(&text, &inner.inbound_tx);
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite queues the pong; it goes out with the next write
                        tracing::trace!("websocket ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        break match frame {
                            Some(cf) if cf.code != CloseCode::Normal => Err(Error::WebSocketClosed {
                                code: cf.code.into(),
                                reason: cf.reason.to_string(),
                            }),
                            _ => Ok(()),
                        };
                    }
                    Some(Err(e)) => break Err(Error::WebSocketConnect(e.to_string())),
                    None => break Ok(()),
                    Some(Ok(_)) => {}
                }
            }
        }
    };

    inner.link.store(None);
    inner.state.send_replace(ConnectionState::Disconnected);

    match result {
        Ok(()) => tracing::info!("backend connection closed"),
        Err(e) => tracing::warn!(error = %e, "backend connection dropped"),
    }
}

/// Decode one text frame and forward it. Undecodable frames are skipped.
fn dispatch(text: &str, inbound_tx: &mpsc::UnboundedSender<Inbound>) {
    match protocol::decode(text) {
        Ok(message) => {
            // A closed receiver just means the session is shutting down.
            let _ = inbound_tx.send(message);
        }
        Err(e) => tracing::debug!(error = %e, "failed to decode inbound frame"),
    }
}

// ── Tests ────────────────────────────────────────────────────────────
