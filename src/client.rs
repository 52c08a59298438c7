//! Async client for the Quizwire session protocol.
//!
//! [`QuizwireClient`] is a thin handle that communicates with a background
//! transport loop task via an unbounded MPSC channel. Events are emitted on a
//! bounded channel ([`tokio::sync::mpsc::Receiver<QuizwireEvent>`]) returned
//! from [`QuizwireClient::start`].
//!
//! The loop owns the [`SessionState`] reducer: every inbound authority event
//! and every local one-second tick mutates state there, one at a time, in
//! arrival order. The handle's `submit_answer` / `request_lifeline` methods
//! run the pipeline guards against the same state before anything touches
//! the network, so a blocked action never costs a round-trip.
//!
//! # Example
//!
//! ```rust,ignore
//! let transport = WebSocketTransport::connect("ws://host/ws").await?;
//! let identity = ContestantIdentity::new("Alice", "p-81f3");
//! let (client, mut events) = QuizwireClient::start(transport, QuizwireConfig::contestant(identity));
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         QuizwireEvent::QuestionStarted { .. } => client.submit_answer("b").await?,
//!         QuizwireEvent::SessionEnded { reason } => { eprintln!("{reason}"); break }
//!         QuizwireEvent::Disconnected { .. } => break,
//!         _ => {}
//!     }
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, warn};

use crate::clock::local_now;
use crate::error::{QuizwireError, Result};
use crate::event::QuizwireEvent;
use crate::protocol::{ClientIntent, LifelineKind, ParticipantId, ServerEvent};
use crate::session::SessionState;

/// Default capacity of the bounded event channel.
const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 256;

/// Default timeout for the graceful shutdown.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

// ── Configuration ───────────────────────────────────────────────────

/// Identity of a contestant joining the session.
///
/// `contact_code` is the uniqueness key the authority uses to detect the same
/// identity connecting twice (triggering a `replaced` on the older
/// connection).
///
/// # Example
///
/// ```
/// use quizwire_client::client::ContestantIdentity;
///
/// let identity = ContestantIdentity::new("Alice", "p-81f3")
///     .with_contact_code("alice@example.com");
/// assert_eq!(identity.name, "Alice");
/// ```
#[derive(Debug, Clone)]
pub struct ContestantIdentity {
    /// Display name.
    pub name: String,
    /// Identifier issued by the authority at registration.
    pub participant_id: ParticipantId,
    /// Uniqueness key (typically an email address).
    pub contact_code: Option<String>,
}

impl ContestantIdentity {
    /// Create a contestant identity with the required fields.
    pub fn new(name: impl Into<String>, participant_id: impl Into<ParticipantId>) -> Self {
        Self {
            name: name.into(),
            participant_id: participant_id.into(),
            contact_code: None,
        }
    }

    /// Set the uniqueness key used for replacement detection.
    #[must_use]
    pub fn with_contact_code(mut self, contact_code: impl Into<String>) -> Self {
        self.contact_code = Some(contact_code.into());
        self
    }
}

/// Which role this connection declares during the join handshake.
#[derive(Debug, Clone)]
pub enum Role {
    /// An answering participant.
    Contestant(ContestantIdentity),
    /// A read-only public display surface.
    Display,
    /// An administrator, authenticated by the admin credential.
    Admin {
        /// Admin credential forwarded verbatim to the authority.
        token: String,
    },
}

impl Role {
    /// The join intent this role emits as its first message.
    fn join_intent(&self) -> ClientIntent {
        match self {
            Self::Contestant(identity) => ClientIntent::JoinContestant {
                name: identity.name.clone(),
                participant_id: identity.participant_id.clone(),
                contact_code: identity.contact_code.clone(),
            },
            Self::Display => ClientIntent::JoinDisplay,
            Self::Admin { token } => ClientIntent::JoinAdmin {
                token: token.clone(),
            },
        }
    }
}

/// Configuration for a [`QuizwireClient`] connection.
///
/// Construct via [`QuizwireConfig::contestant`], [`QuizwireConfig::display`]
/// or [`QuizwireConfig::admin`]; everything else has sensible defaults.
///
/// # Tuning
///
/// ```
/// use quizwire_client::client::QuizwireConfig;
/// use std::time::Duration;
///
/// let config = QuizwireConfig::display()
///     .with_event_channel_capacity(512)
///     .with_shutdown_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct QuizwireConfig {
    /// Role declared during the join handshake.
    pub role: Role,
    /// Capacity of the bounded event channel.
    ///
    /// When the consumer cannot keep up with incoming authority events,
    /// events are dropped (with a warning logged) to avoid blocking the
    /// transport loop. Terminal events (`SessionEnded`, `Disconnected`) are
    /// always delivered regardless of capacity.
    ///
    /// Defaults to **256**. Values below 1 are clamped to 1.
    pub event_channel_capacity: usize,
    /// Timeout for the graceful shutdown.
    ///
    /// When [`QuizwireClient::shutdown`] is called, the background transport
    /// loop is given this much time to close the transport and emit a final
    /// `Disconnected` event. If the timeout expires the task is aborted.
    ///
    /// Defaults to **1 second**.
    pub shutdown_timeout: Duration,
}

impl QuizwireConfig {
    fn new(role: Role) -> Self {
        Self {
            role,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Configuration for a contestant connection.
    pub fn contestant(identity: ContestantIdentity) -> Self {
        Self::new(Role::Contestant(identity))
    }

    /// Configuration for a public display connection.
    pub fn display() -> Self {
        Self::new(Role::Display)
    }

    /// Configuration for an administrator connection.
    pub fn admin(token: impl Into<String>) -> Self {
        Self::new(Role::Admin {
            token: token.into(),
        })
    }

    /// Set the capacity of the bounded event channel.
    ///
    /// Defaults to **256**. Values below 1 are clamped to 1.
    #[must_use]
    pub fn with_event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity.max(1);
        self
    }

    /// Set the timeout for the graceful shutdown.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

// ── Shared state ────────────────────────────────────────────────────

/// Internal shared state between the client handle and the transport loop.
struct ClientShared {
    connected: AtomicBool,
    joined: AtomicBool,
    /// The session reducer. Written by the transport loop; read (and guarded)
    /// by the handle's intent pipelines.
    session: Mutex<SessionState>,
}

impl ClientShared {
    fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            joined: AtomicBool::new(false),
            session: Mutex::new(SessionState::new()),
        }
    }
}

// ── Client handle ───────────────────────────────────────────────────

/// Async client handle for the Quizwire session protocol.
///
/// Created via [`QuizwireClient::start`], which spawns a background transport
/// loop and returns this handle together with an event receiver.
///
/// Outbound intents are fire-and-forget: methods return once the message is
/// queued (after local pipeline guards pass); confirmation arrives
/// asynchronously on the event channel.
pub struct QuizwireClient {
    /// Sender half of the intent channel to the transport loop.
    cmd_tx: mpsc::UnboundedSender<ClientIntent>,
    /// Shared state updated by the transport loop.
    shared: Arc<ClientShared>,
    /// Handle to the background transport loop task.
    task: Option<tokio::task::JoinHandle<()>>,
    /// Oneshot sender to signal the transport loop to shut down gracefully.
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    /// Timeout for the graceful shutdown.
    shutdown_timeout: Duration,
}

impl QuizwireClient {
    /// Start the client transport loop and return a handle plus event receiver.
    ///
    /// The transport loop immediately sends the role's join intent
    /// (`join_contestant` / `join_display` / `join_admin`) as its first
    /// outgoing message.
    ///
    /// # Returns
    ///
    /// A tuple of `(client_handle, event_receiver)`. The event receiver
    /// yields [`QuizwireEvent`]s until the transport closes or the client
    /// shuts down.
    #[must_use = "the event receiver must be used to receive events"]
    pub fn start(
        transport: impl crate::transport::Transport,
        config: QuizwireConfig,
    ) -> (Self, mpsc::Receiver<QuizwireEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<ClientIntent>();
        // Clamp capacity to at least 1 (tokio panics on 0).
        let capacity = config.event_channel_capacity.max(1);
        let (event_tx, event_rx) = mpsc::channel::<QuizwireEvent>(capacity);
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let shared = Arc::new(ClientShared::new());
        let loop_shared = Arc::clone(&shared);

        // Queue the join intent so the transport loop picks it up as the very
        // first outgoing message. This cannot fail: the channel was just made.
        let _ = cmd_tx.send(config.role.join_intent());

        let task = tokio::spawn(transport_loop(
            transport,
            cmd_rx,
            event_tx,
            loop_shared,
            shutdown_rx,
        ));

        let client = Self {
            cmd_tx,
            shared,
            task: Some(task),
            shutdown_tx: Some(shutdown_tx),
            shutdown_timeout: config.shutdown_timeout,
        };

        (client, event_rx)
    }

    // ── Intent pipelines ────────────────────────────────────────────

    /// Submit this participant's answer for the current question.
    ///
    /// Runs every submission guard locally first: not locked, not revealed,
    /// not paused, nothing in flight, time remaining. On success the session
    /// optimistically enters the submitting state and the intent is queued.
    ///
    /// # Errors
    ///
    /// [`QuizwireError::SubmitBlocked`] when a guard fails (no network
    /// round-trip happens), or [`QuizwireError::NotConnected`] if the
    /// transport has closed.
    pub async fn submit_answer(&self, answer: impl Into<String>) -> Result<()> {
        if !self.is_connected() {
            return Err(QuizwireError::NotConnected);
        }
        let intent = {
            let mut session = self.shared.session.lock().await;
            session.begin_submission(answer)?
        };
        self.send(intent)
    }

    /// Request a lifeline for the current question.
    ///
    /// The usage flag is only consumed when the authority grants the
    /// lifeline; a denial leaves it untouched.
    ///
    /// # Errors
    ///
    /// [`QuizwireError::LifelineBlocked`] when a guard fails, or
    /// [`QuizwireError::NotConnected`] if the transport has closed.
    pub async fn request_lifeline(&self, kind: LifelineKind) -> Result<()> {
        if !self.is_connected() {
            return Err(QuizwireError::NotConnected);
        }
        let intent = {
            let mut session = self.shared.session.lock().await;
            session.begin_lifeline(kind)?
        };
        self.send(intent)
    }

    /// Shut down the client, closing the transport and stopping the
    /// background task.
    ///
    /// After calling this method, the event receiver will yield `None` once
    /// the transport loop exits.
    pub async fn shutdown(&mut self) {
        debug!("QuizwireClient: shutdown requested");

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        // Await the transport loop with a timeout. If it doesn't exit in
        // time, abort it so the task cannot detach and run indefinitely.
        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    warn!("transport loop terminated with join error: {join_err}");
                }
                Err(_) => {
                    warn!("transport loop did not exit within timeout; aborting task");
                    task.abort();
                    if let Err(join_err) = task.await {
                        debug!("transport loop aborted: {join_err}");
                    }
                }
            }
        }

        self.shared.connected.store(false, Ordering::Release);
    }

    // ── State accessors ─────────────────────────────────────────────

    /// Returns `true` if the transport is believed to be connected.
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    /// Returns `true` once the authority has acknowledged the join handshake.
    pub fn is_joined(&self) -> bool {
        self.shared.joined.load(Ordering::Acquire)
    }

    /// Snapshot of the current session projection.
    pub async fn session(&self) -> SessionState {
        self.shared.session.lock().await.clone()
    }

    /// Displayed remaining seconds for the current question.
    pub async fn time_left(&self) -> u32 {
        self.shared.session.lock().await.time_left()
    }

    /// Whether the local answer is confirmed locked for this question.
    pub async fn is_locked(&self) -> bool {
        self.shared.session.lock().await.lock().is_locked()
    }

    // ── Internal helpers ────────────────────────────────────────────

    /// Queue a `ClientIntent` to the transport loop.
    fn send(&self, intent: ClientIntent) -> Result<()> {
        if !self.shared.connected.load(Ordering::Acquire) {
            return Err(QuizwireError::NotConnected);
        }
        self.cmd_tx
            .send(intent)
            .map_err(|_| QuizwireError::NotConnected)
    }
}

impl std::fmt::Debug for QuizwireClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizwireClient")
            .field("connected", &self.is_connected())
            .field("joined", &self.is_joined())
            .field("has_task", &self.task.is_some())
            .finish()
    }
}

impl Drop for QuizwireClient {
    fn drop(&mut self) {
        // `Drop` is synchronous so we cannot await a graceful shutdown. The
        // only safe action is to abort the spawned task, which causes the
        // transport loop future to be dropped immediately. The `shutdown_tx`
        // oneshot is intentionally *not* sent here: sending it would trigger
        // a graceful path that calls async `transport.close()`, but there is
        // no executor context to drive it inside `Drop`.
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

// ── Transport loop ──────────────────────────────────────────────────

/// Whether an event re-anchors countdown timing, requiring the local
/// one-second timer to be re-armed to avoid flicker or double-decrement.
fn rearms_timer(event: &ServerEvent) -> bool {
    matches!(
        event,
        ServerEvent::Question(_)
            | ServerEvent::Status(_)
            | ServerEvent::Paused
            | ServerEvent::Resumed
            | ServerEvent::Reveal { .. }
    )
}

/// Map an applied authority event to the consumer-facing event, reading
/// post-apply values (like the recomputed countdown) from the session.
fn surface_event(event: ServerEvent, session: &SessionState) -> Option<QuizwireEvent> {
    let event = match event {
        ServerEvent::Joined { participant_code } => QuizwireEvent::Joined { participant_code },
        ServerEvent::Question(payload) => QuizwireEvent::QuestionStarted {
            question: payload.question,
            index: payload.index,
            time_left: session.time_left(),
        },
        ServerEvent::Status(st) => QuizwireEvent::StatusUpdated {
            index: st.index,
            total: st.total,
            paused: st.paused,
            revealed: st.revealed,
            time_left: session.time_left(),
        },
        ServerEvent::Reveal { correct_answer } => QuizwireEvent::Revealed { correct_answer },
        ServerEvent::AnswerLocked { answer } => QuizwireEvent::AnswerLocked { answer },
        ServerEvent::AnswerRejected { reason } => QuizwireEvent::AnswerRejected { reason },
        ServerEvent::AnswerResult(result) => QuizwireEvent::AnswerResult(result),
        ServerEvent::LifelineStatus(availability) => QuizwireEvent::LifelineStatus(availability),
        ServerEvent::LifelineHalveChoices { keep_ids } => {
            QuizwireEvent::ChoicesNarrowed { keep_ids }
        }
        ServerEvent::LifelineHint { hint } => QuizwireEvent::HintRevealed { hint },
        ServerEvent::LifelineDenied { lifeline, reason } => {
            QuizwireEvent::LifelineDenied { lifeline, reason }
        }
        ServerEvent::Leaderboard(standings) => QuizwireEvent::LeaderboardUpdated { standings },
        ServerEvent::LeaderboardShow(standings) => QuizwireEvent::LeaderboardShown { standings },
        ServerEvent::LeaderboardHide => QuizwireEvent::LeaderboardHidden,
        ServerEvent::Paused => QuizwireEvent::Paused,
        ServerEvent::Resumed => QuizwireEvent::Resumed,
        ServerEvent::Complete => QuizwireEvent::SessionComplete,
        ServerEvent::Error { message } => QuizwireEvent::AuthorityError { message },
        // Teardown events are surfaced separately as SessionEnded.
        ServerEvent::Reset | ServerEvent::Replaced => return None,
    };
    Some(event)
}

/// Background transport loop that multiplexes sends, receives and the local
/// countdown tick via `tokio::select!`.
///
/// Exits when:
/// - The intent channel closes (client handle dropped or shutdown called)
/// - The transport returns `None` (authority closed the connection)
/// - A transport error occurs
/// - The authority forces termination (`reset` / `replaced`)
async fn transport_loop(
    mut transport: impl crate::transport::Transport,
    mut cmd_rx: mpsc::UnboundedReceiver<ClientIntent>,
    event_tx: mpsc::Sender<QuizwireEvent>,
    shared: Arc<ClientShared>,
    mut shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) {
    debug!("transport loop started");

    // Emit the synthetic Connected event before entering the select loop.
    emit_event(&event_tx, QuizwireEvent::Connected).await;

    // The only autonomous local process: the one-second countdown. It is
    // re-armed on every time-affecting authority event so an authority
    // update and a local decrement can never land in the same instant.
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // Skip the interval's immediate first tick.
    ticker.reset();

    loop {
        tokio::select! {
            // Branch 1: outgoing intent from the client handle
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(intent) => {
                        debug!("sending client intent: {:?}", std::mem::discriminant(&intent));
                        match serde_json::to_string(&intent) {
                            Ok(json) => {
                                if let Err(e) = transport.send(json).await {
                                    error!("transport send error: {e}");
                                    emit_disconnected(
                                        &event_tx,
                                        &shared,
                                        Some(format!("transport send error: {e}")),
                                    ).await;
                                    break;
                                }
                            }
                            Err(e) => {
                                error!("failed to serialize ClientIntent: {e}");
                                // Serialization errors are programming bugs; don't kill the loop.
                            }
                        }
                    }
                    // Intent channel closed — client handle dropped.
                    None => {
                        debug!("intent channel closed, shutting down transport loop");
                        let _ = transport.close().await;
                        emit_disconnected(&event_tx, &shared, Some("client shut down".into())).await;
                        break;
                    }
                }
            }

            // Branch 2: shutdown signal
            _ = &mut shutdown_rx => {
                debug!("shutdown signal received");
                let _ = transport.close().await;
                emit_disconnected(&event_tx, &shared, Some("client shut down".into())).await;
                break;
            }

            // Branch 3: incoming event from the authority
            incoming = transport.recv() => {
                match incoming {
                    Some(Ok(text)) => {
                        match serde_json::from_str::<ServerEvent>(&text) {
                            Ok(server_event) => {
                                if rearms_timer(&server_event) {
                                    ticker.reset();
                                }
                                let leave = {
                                    let mut session = shared.session.lock().await;
                                    let leave = session.apply(&server_event, local_now());
                                    if matches!(server_event, ServerEvent::Joined { .. }) {
                                        shared.joined.store(true, Ordering::Release);
                                    }
                                    if let Some(event) = surface_event(server_event, &session) {
                                        if let QuizwireEvent::AuthorityError { message } = &event {
                                            warn!("authority error: {message}");
                                        }
                                        emit_event(&event_tx, event).await;
                                    }
                                    leave
                                };
                                // Forced termination: discard the session view,
                                // close the channel, return to entry.
                                if let Some(reason) = leave {
                                    debug!("authority forced termination: {reason}");
                                    shared.joined.store(false, Ordering::Release);
                                    emit_terminal(&event_tx, QuizwireEvent::SessionEnded { reason }).await;
                                    let _ = transport.close().await;
                                    emit_disconnected(&event_tx, &shared, Some(reason.to_string())).await;
                                    break;
                                }
                            }
                            Err(e) => {
                                warn!("failed to deserialize authority event: {e} — raw: {text}");
                            }
                        }
                    }
                    Some(Err(e)) => {
                        error!("transport receive error: {e}");
                        emit_disconnected(
                            &event_tx,
                            &shared,
                            Some(format!("transport receive error: {e}")),
                        ).await;
                        break;
                    }
                    // Transport closed cleanly.
                    None => {
                        debug!("transport closed by the authority");
                        emit_disconnected(&event_tx, &shared, None).await;
                        break;
                    }
                }
            }

            // Branch 4: local one-second countdown tick
            _ = ticker.tick() => {
                let time_left = {
                    let mut session = shared.session.lock().await;
                    session.tick().then(|| session.time_left())
                };
                if let Some(time_left) = time_left {
                    emit_event(&event_tx, QuizwireEvent::TimeLeft(time_left)).await;
                }
            }
        }
    }

    debug!("transport loop exited");
}

/// Emit an event to the event channel. If the channel is full, log a warning
/// and drop the event to avoid blocking the transport loop.
async fn emit_event(event_tx: &mpsc::Sender<QuizwireEvent>, event: QuizwireEvent) {
    match event_tx.try_send(event) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(dropped)) => {
            warn!(
                "event channel full, dropping event: {:?}",
                std::mem::discriminant(&dropped)
            );
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!("event channel closed, receiver dropped");
        }
    }
}

/// Emit a terminal event with a blocking send — terminal events must never be
/// silently dropped even when the channel is congested.
async fn emit_terminal(event_tx: &mpsc::Sender<QuizwireEvent>, event: QuizwireEvent) {
    if event_tx.send(event).await.is_err() {
        debug!("event channel closed, receiver dropped");
    }
}

/// Emit a [`Disconnected`](QuizwireEvent::Disconnected) event and update state.
async fn emit_disconnected(
    event_tx: &mpsc::Sender<QuizwireEvent>,
    shared: &ClientShared,
    reason: Option<String>,
) {
    shared.connected.store(false, Ordering::Release);
    shared.joined.store(false, Ordering::Release);
    emit_terminal(event_tx, QuizwireEvent::Disconnected { reason }).await;
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::protocol::{Choice, Question, QuestionPayload, RejectReason};
    use crate::session::LeaveReason;
    use crate::transport::Transport;
    use async_trait::async_trait;
        use std::sync::Mutex as StdMutex;

    // ── Mock transport ──────────────────────────────────────────────

    type Incoming = Option<std::result::Result<String, QuizwireError>>;

    /// A mock transport that records sent intents and replays scripted
    /// authority events. Tests can feed further events through the returned
    /// sender while the loop is running.
    struct MockTransport {
        /// Messages that `recv()` will yield in order. An explicit `None`
        /// entry signals a clean transport close.
        incoming: mpsc::UnboundedReceiver<Incoming>,
        /// Recorded outgoing messages.
        sent: Arc<StdMutex<Vec<String>>>,
        /// Whether `close()` was called.
        closed: Arc<AtomicBool>,
    }

    struct MockHandle {
        tx: mpsc::UnboundedSender<Incoming>,
        sent: Arc<StdMutex<Vec<String>>>,
        closed: Arc<AtomicBool>,
    }

    impl MockHandle {
        fn feed(&self, message: String) {
            self.tx.send(Some(Ok(message))).unwrap();
        }
    }

    impl MockTransport {
        fn new(incoming: Vec<Incoming>) -> (Self, MockHandle) {
            let sent = Arc::new(StdMutex::new(Vec::new()));
            let closed = Arc::new(AtomicBool::new(false));
            let (tx, rx) = mpsc::unbounded_channel();
            for item in incoming {
                tx.send(item).unwrap();
            }
            let handle = MockHandle {
                tx,
                sent: Arc::clone(&sent),
                closed: Arc::clone(&closed),
            };
            let transport = Self {
                incoming: rx,
                sent,
                closed,
            };
            (transport, handle)
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&mut self, message: String) -> std::result::Result<(), QuizwireError> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }

        async fn recv(&mut self) -> Option<std::result::Result<String, QuizwireError>> {
            match self.incoming.recv().await {
                Some(item) => item,
                // Feed handle dropped with no close scripted — hang forever
                // so the transport loop stays alive until shutdown.
                None => std::future::pending().await,
            }
        }

        async fn close(&mut self) -> std::result::Result<(), QuizwireError> {
            self.closed.store(true, Ordering::Relaxed);
            Ok(())
        }
    }

    // ── Helpers ─────────────────────────────────────────────────────

    fn joined_json() -> String {
        serde_json::to_string(&ServerEvent::Joined {
            participant_code: Some("alice@example.com".into()),
        })
        .unwrap()
    }

    fn question_json(index: u32, duration: u32) -> String {
        let now = local_now();
        serde_json::to_string(&ServerEvent::Question(Box::new(QuestionPayload {
            question: Question {
                id: format!("q{index}"),
                text: "Capital of France?".into(),
                choices: Some(vec![
                    Choice { id: "a".into(), text: "Berlin".into() },
                    Choice { id: "b".into(), text: "Paris".into() },
                ]),
                answer: None,
                duration,
                hint: Some("City of Light".into()),
            },
            index,
            duration,
            started_at: now,
            remaining: Some(f64::from(duration)),
            server_time: now,
        })))
        .unwrap()
    }

    fn contestant_config() -> QuizwireConfig {
        QuizwireConfig::contestant(
            ContestantIdentity::new("Alice", "p-1").with_contact_code("alice@example.com"),
        )
    }

    async fn recv_until(
        events: &mut mpsc::Receiver<QuizwireEvent>,
        mut pred: impl FnMut(&QuizwireEvent) -> bool,
    ) -> QuizwireEvent {
        loop {
            let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
                .await
                .expect("timed out waiting for event")
                .expect("event channel closed");
            if pred(&event) {
                return event;
            }
        }
    }

    // ── Tests ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn join_intent_is_first_outgoing_message() {
        let (transport, mock) = MockTransport::new(vec![Some(Ok(joined_json()))]);
        let (mut client, mut events) = QuizwireClient::start(transport, contestant_config());

        let event = events.recv().await.unwrap();
        assert!(matches!(event, QuizwireEvent::Connected));
        let event = events.recv().await.unwrap();
        assert!(matches!(event, QuizwireEvent::Joined { .. }));
        assert!(client.is_joined());

        {
            let messages = mock.sent.lock().unwrap();
            assert!(!messages.is_empty());
            let first: ClientIntent = serde_json::from_str(&messages[0]).unwrap();
            if let ClientIntent::JoinContestant {
                name,
                participant_id,
                contact_code,
            } = first
            {
                assert_eq!(name, "Alice");
                assert_eq!(participant_id, "p-1");
                assert_eq!(contact_code.as_deref(), Some("alice@example.com"));
            } else {
                panic!("expected JoinContestant as the first intent");
            }
        }

        client.shutdown().await;
    }

    #[tokio::test]
    async fn admin_role_sends_join_admin() {
        let (transport, mock) = MockTransport::new(vec![]);
        let (mut client, mut events) =
            QuizwireClient::start(transport, QuizwireConfig::admin("changeme"));

        let _ = events.recv().await; // Connected
        tokio::time::sleep(Duration::from_millis(50)).await;

        {
            let messages = mock.sent.lock().unwrap();
            let first: ClientIntent = serde_json::from_str(&messages[0]).unwrap();
            assert!(matches!(first, ClientIntent::JoinAdmin { token } if token == "changeme"));
        }

        client.shutdown().await;
    }

    #[tokio::test]
    async fn question_event_resets_session_and_surfaces() {
        let (transport, _mock) = MockTransport::new(vec![
            Some(Ok(joined_json())),
            Some(Ok(question_json(0, 20))),
        ]);
        let (mut client, mut events) = QuizwireClient::start(transport, contestant_config());

        let event = recv_until(&mut events, |e| {
            matches!(e, QuizwireEvent::QuestionStarted { .. })
        })
        .await;
        if let QuizwireEvent::QuestionStarted { index, time_left, question } = event {
            assert_eq!(index, 0);
            assert_eq!(time_left, 20);
            assert_eq!(question.id, "q0");
        }
        assert_eq!(client.time_left().await, 20);
        assert!(!client.is_locked().await);

        client.shutdown().await;
    }

    #[tokio::test]
    async fn submit_flow_optimistic_then_confirmed() {
        let (transport, mock) = MockTransport::new(vec![
            Some(Ok(joined_json())),
            Some(Ok(question_json(0, 20))),
        ]);
        let (mut client, mut events) = QuizwireClient::start(transport, contestant_config());

        recv_until(&mut events, |e| {
            matches!(e, QuizwireEvent::QuestionStarted { .. })
        })
        .await;

        client.submit_answer("b").await.unwrap();
        {
            let session = client.session().await;
            assert!(session.lock().is_submitting());
        }

        // A second attempt is blocked locally, before any network call.
        let sent_before = mock.sent.lock().unwrap().len();
        let err = client.submit_answer("a").await.unwrap_err();
        assert!(matches!(err, QuizwireError::SubmitBlocked(_)));
        assert_eq!(mock.sent.lock().unwrap().len(), sent_before);

        tokio::time::sleep(Duration::from_millis(50)).await;
        {
            let messages = mock.sent.lock().unwrap();
            let last: ClientIntent = serde_json::from_str(messages.last().unwrap()).unwrap();
            assert!(matches!(last, ClientIntent::SubmitAnswer { answer } if answer == "b"));
        }

        client.shutdown().await;
    }

    #[tokio::test]
    async fn answer_locked_confirms_and_blocks_resubmission() {
        let locked_json = serde_json::to_string(&ServerEvent::AnswerLocked {
            answer: Some("b".into()),
        })
        .unwrap();
        let (transport, _mock) = MockTransport::new(vec![
            Some(Ok(joined_json())),
            Some(Ok(question_json(0, 20))),
            Some(Ok(locked_json)),
        ]);
        let (mut client, mut events) = QuizwireClient::start(transport, contestant_config());

        let event = recv_until(&mut events, |e| {
            matches!(e, QuizwireEvent::AnswerLocked { .. })
        })
        .await;
        assert_eq!(
            event,
            QuizwireEvent::AnswerLocked { answer: Some("b".into()) }
        );
        assert!(client.is_locked().await);

        let err = client.submit_answer("a").await.unwrap_err();
        assert!(matches!(
            err,
            QuizwireError::SubmitBlocked(crate::session::SubmitBlock::AlreadyLocked)
        ));

        client.shutdown().await;
    }

    #[tokio::test]
    async fn rejection_rolls_back_and_surfaces_reason() {
        let rejected_json = serde_json::to_string(&ServerEvent::AnswerRejected {
            reason: RejectReason::LateSubmission,
        })
        .unwrap();
        let (transport, _mock) = MockTransport::new(vec![
            Some(Ok(joined_json())),
            Some(Ok(question_json(0, 20))),
            Some(Ok(rejected_json)),
        ]);
        let (mut client, mut events) = QuizwireClient::start(transport, contestant_config());

        let event = recv_until(&mut events, |e| {
            matches!(e, QuizwireEvent::AnswerRejected { .. })
        })
        .await;
        assert_eq!(
            event,
            QuizwireEvent::AnswerRejected { reason: RejectReason::LateSubmission }
        );
        let session = client.session().await;
        assert!(!session.lock().is_locked());
        assert!(!session.lock().is_submitting());

        client.shutdown().await;
    }

    #[tokio::test]
    async fn submit_without_question_is_blocked_locally() {
        let (transport, mock) = MockTransport::new(vec![Some(Ok(joined_json()))]);
        let (mut client, mut events) = QuizwireClient::start(transport, contestant_config());

        let _ = events.recv().await; // Connected
        let _ = events.recv().await; // Joined

        let err = client.submit_answer("a").await.unwrap_err();
        assert!(matches!(err, QuizwireError::SubmitBlocked(_)));

        tokio::time::sleep(Duration::from_millis(50)).await;
        // Only the join intent ever went out.
        assert_eq!(mock.sent.lock().unwrap().len(), 1);

        client.shutdown().await;
    }

    #[tokio::test]
    async fn replaced_ends_session_with_distinct_reason_and_closes() {
        let replaced_json = serde_json::to_string(&ServerEvent::Replaced).unwrap();
        let (transport, mock) = MockTransport::new(vec![
            Some(Ok(joined_json())),
            Some(Ok(question_json(0, 20))),
            Some(Ok(replaced_json)),
        ]);
        let (mut client, mut events) = QuizwireClient::start(transport, contestant_config());

        let event = recv_until(&mut events, |e| {
            matches!(e, QuizwireEvent::SessionEnded { .. })
        })
        .await;
        assert_eq!(
            event,
            QuizwireEvent::SessionEnded { reason: LeaveReason::Replaced }
        );

        // The loop terminates the connection and emits a final Disconnected.
        let event = events.recv().await.unwrap();
        assert!(matches!(event, QuizwireEvent::Disconnected { .. }));
        assert!(mock.closed.load(Ordering::Relaxed));
        assert!(!client.is_connected());

        // All session state was discarded.
        let session = client.session().await;
        assert!(session.question().is_none());

        client.shutdown().await;
    }

    #[tokio::test]
    async fn reset_ends_session_with_reset_reason() {
        let reset_json = serde_json::to_string(&ServerEvent::Reset).unwrap();
        let (transport, _mock) = MockTransport::new(vec![
            Some(Ok(joined_json())),
            Some(Ok(reset_json)),
        ]);
        let (mut client, mut events) = QuizwireClient::start(transport, contestant_config());

        let event = recv_until(&mut events, |e| {
            matches!(e, QuizwireEvent::SessionEnded { .. })
        })
        .await;
        assert_eq!(
            event,
            QuizwireEvent::SessionEnded { reason: LeaveReason::Reset }
        );

        client.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_ticks_emit_time_left() {
        let (transport, _mock) = MockTransport::new(vec![
            Some(Ok(joined_json())),
            Some(Ok(question_json(0, 3))),
        ]);
        let (mut client, mut events) = QuizwireClient::start(transport, contestant_config());

        recv_until(&mut events, |e| {
            matches!(e, QuizwireEvent::QuestionStarted { .. })
        })
        .await;

        let event = recv_until(&mut events, |e| matches!(e, QuizwireEvent::TimeLeft(_))).await;
        assert_eq!(event, QuizwireEvent::TimeLeft(2));
        let event = recv_until(&mut events, |e| matches!(e, QuizwireEvent::TimeLeft(_))).await;
        assert_eq!(event, QuizwireEvent::TimeLeft(1));
        let event = recv_until(&mut events, |e| matches!(e, QuizwireEvent::TimeLeft(_))).await;
        assert_eq!(event, QuizwireEvent::TimeLeft(0));

        // At zero the tick is inert; submissions are blocked locally.
        let err = client.submit_answer("b").await.unwrap_err();
        assert!(matches!(
            err,
            QuizwireError::SubmitBlocked(crate::session::SubmitBlock::TimeExpired)
        ));

        client.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn paused_event_freezes_the_tick() {
        let paused_json = serde_json::to_string(&ServerEvent::Paused).unwrap();
        let (transport, _mock) = MockTransport::new(vec![
            Some(Ok(joined_json())),
            Some(Ok(question_json(0, 30))),
            Some(Ok(paused_json)),
        ]);
        let (mut client, mut events) = QuizwireClient::start(transport, contestant_config());

        recv_until(&mut events, |e| matches!(e, QuizwireEvent::Paused)).await;

        // Let several virtual seconds elapse; no TimeLeft may arrive.
        for _ in 0..5 {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        let mut saw_tick = false;
        while let Ok(event) = events.try_recv() {
            if matches!(event, QuizwireEvent::TimeLeft(_)) {
                saw_tick = true;
            }
        }
        assert!(!saw_tick, "countdown decremented while paused");
        assert_eq!(client.time_left().await, 30);

        client.shutdown().await;
    }

    #[tokio::test]
    async fn lifeline_request_guarded_and_granted() {
        let (transport, mock) = MockTransport::new(vec![
            Some(Ok(joined_json())),
            Some(Ok(question_json(0, 20))),
        ]);
        let (mut client, mut events) = QuizwireClient::start(transport, contestant_config());

        recv_until(&mut events, |e| {
            matches!(e, QuizwireEvent::QuestionStarted { .. })
        })
        .await;

        client.request_lifeline(LifelineKind::Hint).await.unwrap();
        // The grant arrives only after the request went out.
        mock.feed(
            serde_json::to_string(&ServerEvent::LifelineHint { hint: "City of Light".into() })
                .unwrap(),
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
        {
            let messages = mock.sent.lock().unwrap();
            let last: ClientIntent = serde_json::from_str(messages.last().unwrap()).unwrap();
            assert!(matches!(
                last,
                ClientIntent::LifelineRequest { lifeline: LifelineKind::Hint }
            ));
        }

        let event = recv_until(&mut events, |e| {
            matches!(e, QuizwireEvent::HintRevealed { .. })
        })
        .await;
        assert_eq!(event, QuizwireEvent::HintRevealed { hint: "City of Light".into() });

        // The grant consumed the flag: a second request is blocked locally.
        let err = client.request_lifeline(LifelineKind::Hint).await.unwrap_err();
        assert!(matches!(err, QuizwireError::LifelineBlocked(_)));

        client.shutdown().await;
    }

    #[tokio::test]
    async fn disconnected_on_transport_close() {
        let (transport, _mock) =
            MockTransport::new(vec![Some(Ok(joined_json())), None]);
        let (mut client, mut events) = QuizwireClient::start(transport, contestant_config());

        let event = recv_until(&mut events, |e| {
            matches!(e, QuizwireEvent::Disconnected { .. })
        })
        .await;
        assert!(matches!(event, QuizwireEvent::Disconnected { reason: None }));
        assert!(!client.is_connected());
        assert!(!client.is_joined());

        client.shutdown().await;
    }

    #[tokio::test]
    async fn transport_recv_error_emits_disconnected() {
        let (transport, _mock) = MockTransport::new(vec![Some(Err(
            QuizwireError::TransportReceive("boom".into()),
        ))]);
        let (mut client, mut events) = QuizwireClient::start(transport, contestant_config());

        let event = recv_until(&mut events, |e| {
            matches!(e, QuizwireEvent::Disconnected { .. })
        })
        .await;
        if let QuizwireEvent::Disconnected { reason } = event {
            assert!(reason.unwrap().contains("boom"));
        }

        client.shutdown().await;
    }

    #[tokio::test]
    async fn not_connected_error_after_shutdown() {
        let (transport, _mock) = MockTransport::new(vec![Some(Ok(joined_json()))]);
        let (mut client, mut events) = QuizwireClient::start(transport, contestant_config());

        let _ = events.recv().await; // Connected
        let _ = events.recv().await; // Joined
        client.shutdown().await;

        let result = client.submit_answer("a").await;
        assert!(matches!(result, Err(QuizwireError::NotConnected)));
    }

    #[tokio::test]
    async fn malformed_authority_event_does_not_kill_the_loop() {
        let (transport, _mock) = MockTransport::new(vec![
            Some(Ok("{not json".into())),
            Some(Ok(joined_json())),
        ]);
        let (mut client, mut events) = QuizwireClient::start(transport, contestant_config());

        // The malformed line is logged and skipped; the join ack still lands.
        let event = recv_until(&mut events, |e| matches!(e, QuizwireEvent::Joined { .. })).await;
        assert!(matches!(event, QuizwireEvent::Joined { .. }));

        client.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_emits_disconnected() {
        let (transport, mock) = MockTransport::new(vec![Some(Ok(joined_json()))]);
        let (mut client, mut events) = QuizwireClient::start(transport, contestant_config());

        let _ = events.recv().await; // Connected
        let _ = events.recv().await; // Joined
        client.shutdown().await;

        let event = recv_until(&mut events, |e| {
            matches!(e, QuizwireEvent::Disconnected { .. })
        })
        .await;
        if let QuizwireEvent::Disconnected { reason } = event {
            assert_eq!(reason.as_deref(), Some("client shut down"));
        }
        assert!(mock.closed.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn double_shutdown_does_not_panic() {
        let (transport, _mock) = MockTransport::new(vec![Some(Ok(joined_json()))]);
        let (mut client, mut events) = QuizwireClient::start(transport, contestant_config());

        let _ = events.recv().await; // Connected
        let _ = events.recv().await; // Joined

        client.shutdown().await;
        client.shutdown().await; // must not panic
    }

    #[tokio::test]
    async fn drop_without_explicit_shutdown() {
        let (transport, _mock) = MockTransport::new(vec![Some(Ok(joined_json()))]);
        let (client, mut events) = QuizwireClient::start(transport, contestant_config());

        let _ = events.recv().await; // Connected
        let _ = events.recv().await; // Joined

        drop(client);

        // The transport loop exits and the event channel closes; we only
        // verify we neither hang nor panic.
        while let Some(_event) = events.recv().await {}
    }

    #[tokio::test]
    async fn event_channel_backpressure_does_not_block() {
        // More status events than the channel can hold; terminal events must
        // still arrive.
        let mut incoming: Vec<Option<std::result::Result<String, QuizwireError>>> = Vec::new();
        incoming.push(Some(Ok(joined_json())));
        let paused = serde_json::to_string(&ServerEvent::Paused).unwrap();
        let resumed = serde_json::to_string(&ServerEvent::Resumed).unwrap();
        for _ in 0..10 {
            incoming.push(Some(Ok(paused.clone())));
            incoming.push(Some(Ok(resumed.clone())));
        }
        incoming.push(None);

        let (transport, _mock) = MockTransport::new(incoming);
        let config = contestant_config().with_event_channel_capacity(1);
        let (mut client, mut events) = QuizwireClient::start(transport, config);

        // Let the channel fill and events drop.
        tokio::time::sleep(Duration::from_millis(100)).await;

        let mut count = 0;
        let mut saw_disconnected = false;
        while let Some(event) = events.recv().await {
            count += 1;
            if matches!(event, QuizwireEvent::Disconnected { .. }) {
                saw_disconnected = true;
            }
        }
        assert!(count < 23, "expected backpressure to drop events, got {count}");
        assert!(saw_disconnected, "Disconnected must always be delivered");

        client.shutdown().await;
    }

    #[tokio::test]
    async fn config_defaults_and_builders() {
        let config = contestant_config();
        assert_eq!(config.event_channel_capacity, 256);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(1));

        let config = QuizwireConfig::display()
            .with_event_channel_capacity(0)
            .with_shutdown_timeout(Duration::from_secs(5));
        assert_eq!(config.event_channel_capacity, 1);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(5));
    }
}
