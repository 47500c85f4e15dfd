// ── Session lifecycle ──
//
// An explicitly constructed session: `new` wires everything up, `init`
// starts the connection poll and the session task, `dispose` tears both
// down. All state mutation happens on the session task; consumers read
// published snapshots and the atomically swapped directory.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Sleep};
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use vccs_api::{ConnectionManager, ConnectionState, Inbound, Outbound};

use crate::audio::{AudioController, AudioSink};
use crate::config::SessionConfig;
use crate::console::{Console, Followup, Outbox};
use crate::dial::DialError;
use crate::directory::CallDirectory;
use crate::error::CoreError;
use crate::model::Facility;
use crate::publisher::Debouncer;
use crate::state::ConsoleState;

const COMMAND_CHANNEL_SIZE: usize = 64;

/// Requests handled on the session task.
enum SessionCommand {
    SelectPositions(Vec<String>),
    Dial {
        trunk: String,
        code: String,
        response_tx: oneshot::Sender<Result<String, DialError>>,
    },
}

/// Everything the session task takes ownership of on `init`.
struct Pending {
    console: Console,
    inbound_rx: mpsc::UnboundedReceiver<Inbound>,
    command_rx: mpsc::Receiver<SessionCommand>,
}

// ── Session ──────────────────────────────────────────────────────────

/// Handle to one operator session.
///
/// Cheaply cloneable via `Arc<SessionInner>`.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    config: SessionConfig,
    connection: ConnectionManager,
    facilities: Arc<ArcSwap<Facility>>,
    directory: Arc<ArcSwap<CallDirectory>>,
    state: watch::Receiver<Arc<ConsoleState>>,
    command_tx: mpsc::Sender<SessionCommand>,
    pending: Mutex<Option<Pending>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Session {
    /// Wire up a session around an already loaded facility document.
    /// Does NOT connect; call [`init`](Self::init).
    pub fn new(config: SessionConfig, facility: Facility, audio: Arc<dyn AudioSink>) -> Self {
        let cancel = CancellationToken::new();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

        let connection = ConnectionManager::new(
            config.backend_url.clone(),
            config.reconnect.clone(),
            inbound_tx,
            cancel.child_token(),
        );
        let publisher = Debouncer::new(
            ConsoleState {
                override_rule: config.override_rule,
                ..ConsoleState::default()
            },
            config.debounce_window,
            cancel.child_token(),
        );
        let state = publisher.subscribe();

        let console = Console::new(
            facility,
            Arc::new(connection.clone()) as Arc<dyn Outbox>,
            AudioController::new(audio),
            publisher,
            config.override_rule,
        );

        Self {
            inner: Arc::new(SessionInner {
                facilities: console.facilities_handle(),
                directory: console.directory_handle(),
                config,
                connection,
                state,
                command_tx,
                pending: Mutex::new(Some(Pending {
                    console,
                    inbound_rx,
                    command_rx,
                })),
                cancel,
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Load the configured facility document, then wire up the session.
    pub async fn load(config: SessionConfig, audio: Arc<dyn AudioSink>) -> Result<Self, CoreError> {
        let facility = config.facilities.load(&config.transport).await?;
        Ok(Self::new(config, facility, audio))
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Start the reconnect poll and the session task.
    ///
    /// Applies the configured startup selection first. Calling `init`
    /// twice is a no-op; calling it after `dispose` fails.
    pub async fn init(&self) -> Result<(), CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::SessionClosed);
        }
        let Some(mut pending) = self.inner.pending.lock().await.take() else {
            tracing::debug!("session already initialised");
            return Ok(());
        };

        let mut followup = Followup::Nothing;
        if !self.inner.config.positions.is_empty() {
            followup = pending
                .console
                .select_positions(self.inner.config.positions.clone());
        }

        let mut handles = self.inner.task_handles.lock().await;
        handles.push(self.inner.connection.spawn());
        handles.push(tokio::spawn(session_task(
            pending,
            self.inner.config.sync_delay,
            followup,
            self.inner.cancel.clone(),
        )));

        tracing::info!(
            backend = %self.inner.config.backend_url,
            positions = ?self.inner.config.positions,
            "session started"
        );
        Ok(())
    }

    /// Stop everything: the reconnect poll and open link, the deferred
    /// sync, the pending publish, and any looping audio.
    pub async fn dispose(&self) {
        self.inner.cancel.cancel();

        // never initialised: release the console here
        if let Some(mut pending) = self.inner.pending.lock().await.take() {
            pending.console.shutdown();
        }

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        tracing::debug!("session disposed");
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Change the selected positions. The first one is the primary.
    pub async fn select_positions(&self, callsigns: Vec<String>) -> Result<(), CoreError> {
        self.inner
            .command_tx
            .send(SessionCommand::SelectPositions(callsigns))
            .await
            .map_err(|_| CoreError::SessionClosed)
    }

    /// Send a raw message. Dropped while disconnected.
    pub fn send(&self, message: &Outbound) {
        self.inner.connection.send(message);
    }

    /// Resolve a dial code for the primary position and place the call.
    pub async fn dial(&self, trunk: &str, code: &str) -> Result<String, CoreError> {
        if self.inner.pending.lock().await.is_some() {
            return Err(CoreError::SessionClosed);
        }
        let (response_tx, response_rx) = oneshot::channel();
        self.inner
            .command_tx
            .send(SessionCommand::Dial {
                trunk: trunk.to_owned(),
                code: code.to_owned(),
                response_tx,
            })
            .await
            .map_err(|_| CoreError::SessionClosed)?;

        let result = response_rx.await.map_err(|_| CoreError::SessionClosed)?;
        result.map_err(CoreError::from)
    }

    // ── State observation ────────────────────────────────────────────

    /// Subscribe to published console state.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ConsoleState>> {
        self.inner.state.clone()
    }

    /// Published console state as a `Stream`, starting with the current value.
    pub fn state_stream(&self) -> WatchStream<Arc<ConsoleState>> {
        WatchStream::new(self.inner.state.clone())
    }

    pub fn snapshot(&self) -> Arc<ConsoleState> {
        Arc::clone(&self.inner.state.borrow())
    }

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection.state()
    }

    /// Current call directory snapshot.
    pub fn directory(&self) -> Arc<CallDirectory> {
        self.inner.directory.load_full()
    }

    /// Current facility document.
    pub fn facilities(&self) -> Arc<Facility> {
        self.inner.facilities.load_full()
    }
}

// ── Session task ─────────────────────────────────────────────────────

async fn session_task(pending: Pending, sync_delay: Duration, initial: Followup, cancel: CancellationToken) {
    let Pending {
        mut console,
        mut inbound_rx,
        mut command_rx,
    } = pending;

    let deferred_sync = tokio::time::sleep(sync_delay);
    tokio::pin!(deferred_sync);
    let mut sync_armed = schedule_sync(initial, deferred_sync.as_mut(), sync_delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            Some(message) = inbound_rx.recv() => {
                let followup = console.handle_inbound(message);
                sync_armed |= schedule_sync(followup, deferred_sync.as_mut(), sync_delay);
            }
            Some(command) = command_rx.recv() => {
                match command {
                    SessionCommand::SelectPositions(callsigns) => {
                        let followup = console.select_positions(callsigns);
                        sync_armed |= schedule_sync(followup, deferred_sync.as_mut(), sync_delay);
                    }
                    SessionCommand::Dial { trunk, code, response_tx } => {
                        let _ = response_tx.send(console.dial(&trunk, &code));
                    }
                }
            }
            () = &mut deferred_sync, if sync_armed => {
                sync_armed = false;
                tracing::debug!("sending deferred sync");
                console.send(&Outbound::Sync);
            }
        }
    }

    console.shutdown();
    tracing::debug!("session task exiting");
}

/// Arm (or re-arm) the deferred sync when a bootstrap asks for one.
/// A newer bootstrap always replaces the pending sync.
fn schedule_sync(followup: Followup, timer: Pin<&mut Sleep>, delay: Duration) -> bool {
    if followup == Followup::DeferredSync {
        timer.reset(Instant::now() + delay);
        true
    } else {
        false
    }
}
