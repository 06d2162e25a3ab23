mod directory;
pub use directory::{MatchDirectory, RestDirectory};
mod error;
pub use error::SyncError;
mod events;
pub use events::SyncEvent;
mod models;
pub use models::{
    ClientMessage, MatchId, MatchLookup, MatchStatus, PushMessage, StatusLookup, UserId,
};
mod navigator;
pub use navigator::{route_for, NavigateFn, Navigator};
mod reconcile;
pub use reconcile::{ReconcileOutcome, Reconciler};
mod settings;
pub use settings::Settings;
mod state;
pub use state::{ConnectionState, RetryDecision, RetryPolicy};
mod store;
pub use store::{SessionSnapshot, SessionStore};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch, Notify, RwLock};
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};

const OUTBOUND_QUEUE_CAPACITY: usize = 64;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Everything the spawned manager task needs, cloned out of the client.
struct ManagerContext<D: MatchDirectory> {
    user_id: UserId,
    url: String,
    retry_delay: Duration,
    retry_cap: u32,
    reconciler: Arc<Reconciler<D>>,
    event_sender: broadcast::Sender<SyncEvent>,
    state_tx: Arc<watch::Sender<ConnectionState>>,
    shutdown_notify: Arc<Notify>,
    stop_signal: Arc<AtomicBool>,
}

/// Why the manager loop ended.
enum ManagerExit {
    Stopped,
    Abandoned,
}

/// How one established connection ended.
enum PumpExit {
    Shutdown,
    ConnectionLost,
}

/// Client that keeps a local view of a matchmaking session consistent with
/// the server of record.
///
/// The client owns exactly one push connection at a time, re-establishes it
/// on unexpected closure with a bounded number of retries, and treats every
/// `status_update` push as a hint to re-fetch the authoritative state over
/// REST. The resulting [`SessionSnapshot`] is committed atomically into the
/// [`SessionStore`], which a [`Navigator`] can observe to keep the user on
/// the right screen.
///
/// # Logging
///
/// This library uses the `tracing` crate. Initialize a subscriber (e.g.
/// `tracing_subscriber::fmt()`) in your application to see connection
/// lifecycle, reconciliation, and navigation logs.
pub struct SyncClient<D: MatchDirectory + 'static = RestDirectory> {
    user_id: UserId,
    settings: Settings,
    store: SessionStore,
    reconciler: Arc<Reconciler<D>>,
    event_sender: broadcast::Sender<SyncEvent>,
    state_tx: Arc<watch::Sender<ConnectionState>>,
    state_rx: watch::Receiver<ConnectionState>,
    outbound_tx: mpsc::Sender<ClientMessage>,
    // Taken by the manager task on the first start.
    outbound_rx: std::sync::Mutex<Option<mpsc::Receiver<ClientMessage>>>,
    stop_signal: Arc<AtomicBool>,
    shutdown_notify: Arc<Notify>,
    manager_task: RwLock<Option<tokio::task::JoinHandle<()>>>,
}

impl SyncClient<RestDirectory> {
    /// Create a client talking to the REST endpoints in `settings`.
    pub fn new(user_id: UserId, settings: Settings) -> Self {
        let directory = RestDirectory::new(&settings.api_base_url, settings.request_timeout);
        Self::with_directory(user_id, directory, settings)
    }
}

impl<D: MatchDirectory + 'static> SyncClient<D> {
    /// Create a client with a custom lookup collaborator.
    pub fn with_directory(user_id: UserId, directory: D, settings: Settings) -> Self {
        let store = SessionStore::new();
        let reconciler = Arc::new(Reconciler::new(directory, store.clone()));
        let (event_tx, _) = broadcast::channel(settings.event_buffer_capacity);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);

        Self {
            user_id,
            settings,
            store,
            reconciler,
            event_sender: event_tx,
            state_tx: Arc::new(state_tx),
            state_rx,
            outbound_tx,
            outbound_rx: std::sync::Mutex::new(Some(outbound_rx)),
            stop_signal: Arc::new(AtomicBool::new(false)),
            shutdown_notify: Arc::new(Notify::new()),
            manager_task: RwLock::new(None),
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// The session state store owned by this client.
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Current session snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.store.read()
    }

    pub fn event_receiver(&self) -> broadcast::Receiver<SyncEvent> {
        self.event_sender.subscribe()
    }

    /// Current state of the connection manager.
    pub fn connection_state(&self) -> ConnectionState {
        self.state_rx.borrow().clone()
    }

    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// The push endpoint this client connects to.
    pub fn push_url(&self) -> String {
        format!("{}?user_id={}", self.settings.ws_url, self.user_id)
    }

    /// Start the connection manager. A no-op when it is already running or
    /// the client has been stopped.
    pub async fn start(&self) {
        let mut task_guard = self.manager_task.write().await;
        if let Some(handle) = task_guard.as_ref() {
            if !handle.is_finished() {
                debug!("start ignored: connection manager already running");
                return;
            }
        }
        if self.stop_signal.load(Ordering::SeqCst) {
            warn!("start ignored: client has been stopped");
            return;
        }
        let Some(outbound_rx) = self
            .outbound_rx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
        else {
            warn!("start ignored: connection manager already consumed");
            return;
        };

        let ctx = ManagerContext {
            user_id: self.user_id,
            url: self.push_url(),
            retry_delay: self.settings.retry_delay,
            retry_cap: self.settings.retry_cap,
            reconciler: self.reconciler.clone(),
            event_sender: self.event_sender.clone(),
            state_tx: self.state_tx.clone(),
            shutdown_notify: self.shutdown_notify.clone(),
            stop_signal: self.stop_signal.clone(),
        };

        *task_guard = Some(tokio::spawn(run_manager(ctx, outbound_rx)));
        info!(user_id = self.user_id, "connection manager task started");
    }

    /// Tear the client down: stop the manager, cancel any pending reconnect
    /// timer, and wait for the task to finish. Idempotent.
    pub async fn stop(&self) -> Result<(), SyncError> {
        let was_running = !self.stop_signal.swap(true, Ordering::SeqCst);
        self.shutdown_notify.notify_one();
        debug!(was_running, "stop signal sent");

        let handle = {
            let mut task_guard = self.manager_task.write().await;
            task_guard.take()
        };
        match handle {
            Some(handle) => {
                handle.await?;
                debug!("connection manager task joined");
            }
            None => {
                // Never started, or already joined. Mark teardown directly,
                // without downgrading an abandoned connection.
                let _ = self.state_tx.send_if_modified(|state| {
                    if state.is_terminal() {
                        false
                    } else {
                        *state = ConnectionState::Closed;
                        true
                    }
                });
            }
        }
        Ok(())
    }

    /// Run one reconciliation pass immediately (startup restore, or the
    /// page-reload analog). Failures reset the store and are reported
    /// through the event stream, never returned as errors.
    pub async fn reconcile_now(&self) -> ReconcileOutcome {
        let outcome = self.reconciler.reconcile(Some(self.user_id)).await;
        report_outcome(&self.event_sender, &outcome);
        outcome
    }

    /// Send a message over the push connection. Refused while disconnected;
    /// the terminal states report why the connection is gone.
    pub async fn send(&self, message: ClientMessage) -> Result<(), SyncError> {
        match self.connection_state() {
            ConnectionState::Connected => {}
            ConnectionState::Abandoned => {
                return Err(SyncError::RetriesExhausted(self.settings.retry_cap))
            }
            ConnectionState::Closed => return Err(SyncError::ConnectionClosed),
            _ => return Err(SyncError::NotConnected),
        }
        self.outbound_tx
            .send(message)
            .await
            .map_err(|_| SyncError::ConnectionClosed)
    }

    /// Clear the local session state (logout). The identity itself lives in
    /// the client and stays fixed for the client's lifetime.
    pub fn clear_session(&self) {
        self.store.clear();
    }

    /// Spawn a navigator driven by this client's store.
    pub fn spawn_navigator(&self, navigator: Navigator) -> tokio::task::JoinHandle<()> {
        tokio::spawn(navigator.run(self.store.subscribe()))
    }
}

impl<D: MatchDirectory + 'static> std::fmt::Debug for SyncClient<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncClient")
            .field("user_id", &self.user_id)
            .field("push_url", &self.push_url())
            .finish()
    }
}

// Ensure the client signals the background task to stop on drop.
impl<D: MatchDirectory + 'static> Drop for SyncClient<D> {
    fn drop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        self.shutdown_notify.notify_one();
    }
}

fn report_outcome(event_sender: &broadcast::Sender<SyncEvent>, outcome: &ReconcileOutcome) {
    match outcome {
        ReconcileOutcome::Applied(snapshot) => {
            let _ = event_sender.send(SyncEvent::Reconciled(snapshot.clone()));
        }
        ReconcileOutcome::Reset => {
            let _ = event_sender.send(SyncEvent::ReconcileFailed);
        }
        ReconcileOutcome::Skipped | ReconcileOutcome::Superseded => {}
    }
}

/// The connection manager loop: connect, pump, and on unexpected closure
/// retry after a fixed delay until the bounded counter gives out.
async fn run_manager<D: MatchDirectory>(
    ctx: ManagerContext<D>,
    mut outbound_rx: mpsc::Receiver<ClientMessage>,
) {
    info!(url = %ctx.url, "connection manager running");
    let mut retry = RetryPolicy::new(ctx.retry_cap);

    let exit = loop {
        if ctx.stop_signal.load(Ordering::Relaxed) {
            break ManagerExit::Stopped;
        }

        let _ = ctx.state_tx.send(ConnectionState::Connecting);
        debug!(attempt = retry.attempt(), "opening push connection");

        let connect_result = tokio::select! {
            biased;
            _ = ctx.shutdown_notify.notified() => break ManagerExit::Stopped,
            res = connect_async(ctx.url.as_str()) => res,
        };

        match connect_result {
            Ok((ws, _)) => {
                retry.on_open();
                let _ = ctx.state_tx.send(ConnectionState::Connected);
                let _ = ctx.event_sender.send(SyncEvent::Connected);
                info!("push connection established");

                // The connection coming up is itself a signal that state may
                // have changed while we were disconnected.
                let outcome = ctx.reconciler.reconcile(Some(ctx.user_id)).await;
                report_outcome(&ctx.event_sender, &outcome);

                match pump(&ctx, ws, &mut outbound_rx).await {
                    PumpExit::Shutdown => break ManagerExit::Stopped,
                    PumpExit::ConnectionLost => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "push connection attempt failed");
            }
        }

        // Unexpected close (or failed connect) path.
        match retry.on_close() {
            RetryDecision::Abandon => break ManagerExit::Abandoned,
            RetryDecision::Retry { attempt } => {
                let _ = ctx.event_sender.send(SyncEvent::Disconnected { attempt });
                let _ = ctx
                    .state_tx
                    .send(ConnectionState::WaitingToReconnect { attempt });
                debug!(attempt, delay = ?ctx.retry_delay, "reconnect scheduled");

                tokio::select! {
                    biased;
                    _ = ctx.shutdown_notify.notified() => break ManagerExit::Stopped,
                    _ = sleep(ctx.retry_delay) => {}
                }

                // Reconnection is refused once the counter has reached the
                // cap, even for a retry that was already scheduled.
                if retry.on_retry_fired() == RetryDecision::Abandon {
                    break ManagerExit::Abandoned;
                }
            }
        }
    };

    match exit {
        ManagerExit::Stopped => {
            let _ = ctx.state_tx.send_replace(ConnectionState::Closed);
            info!("connection manager stopped");
        }
        ManagerExit::Abandoned => {
            // Surfaced exactly once; a user-visible condition, not a silent
            // retry loop.
            let _ = ctx.event_sender.send(SyncEvent::ConnectionAbandoned);
            let _ = ctx.state_tx.send_replace(ConnectionState::Abandoned);
            error!(
                cap = retry.cap(),
                "connection abandoned: retry cap reached"
            );
        }
    }
}

/// Drive one established connection until it drops or teardown is requested.
async fn pump<D: MatchDirectory>(
    ctx: &ManagerContext<D>,
    ws: WsStream,
    outbound_rx: &mut mpsc::Receiver<ClientMessage>,
) -> PumpExit {
    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            biased;

            _ = ctx.shutdown_notify.notified() => {
                debug!("shutdown requested, closing push connection");
                let _ = sink.send(Message::Close(None)).await;
                return PumpExit::Shutdown;
            }

            maybe_message = outbound_rx.recv() => {
                let Some(message) = maybe_message else {
                    // Sender half gone means the client itself is gone.
                    return PumpExit::Shutdown;
                };
                match serde_json::to_string(&message) {
                    Ok(text) => {
                        debug!(%text, "sending client message");
                        if let Err(e) = sink.send(Message::Text(text)).await {
                            warn!(error = %e, "websocket send failed");
                            return PumpExit::ConnectionLost;
                        }
                    }
                    Err(e) => error!(error = %e, "failed to serialize client message"),
                }
            }

            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => handle_frame(ctx, &text).await,
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("server closed the push connection");
                        return PumpExit::ConnectionLost;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "websocket read failed");
                        return PumpExit::ConnectionLost;
                    }
                    None => {
                        info!("push stream ended");
                        return PumpExit::ConnectionLost;
                    }
                }
            }
        }
    }
}

/// Dispatch one inbound text frame. The push channel carries no payload
/// state; a status update is only a hint to re-fetch from the server of
/// record.
async fn handle_frame<D: MatchDirectory>(ctx: &ManagerContext<D>, text: &str) {
    match PushMessage::parse(text) {
        Ok(PushMessage::StatusUpdate) => {
            debug!("status update push received, reconciling");
            let outcome = ctx.reconciler.reconcile(Some(ctx.user_id)).await;
            report_outcome(&ctx.event_sender, &outcome);
        }
        Ok(PushMessage::Unknown(kind)) => {
            debug!(%kind, "ignoring unrecognized push message");
        }
        Err(e) => {
            warn!(error = %e, "ignoring malformed push message");
        }
    }
}
