//! Session state machine: a single reducer over inbound authority events.
//!
//! [`SessionState`] is the client-side projection of one shared quiz session.
//! It is deliberately pure — no timers, no I/O — so any event sequence can be
//! replayed deterministically in tests. The background transport loop in
//! [`client`](crate::client) owns one instance, feeds it every inbound
//! [`ServerEvent`] plus local one-second ticks, and consults its guard methods
//! before emitting any intent.
//!
//! # Invariants upheld here
//!
//! - At most one answer lock per question; the lock is a tagged state
//!   (`Unlocked | Submitting | Locked`), never a nullable field pair.
//! - Duplicate `reveal` events are no-ops once revealed.
//! - `time_left` is monotonically non-increasing between authority updates
//!   and never negative; the tick is inert while paused or revealed.
//! - Each lifeline usage flag falls at most once per question; denials never
//!   touch it.
//! - `reset` and `replaced` tear the session down with distinct reasons.

use thiserror::Error;

use crate::clock::ClockSync;
use crate::protocol::{
    AnswerResultPayload, Choice, ClientIntent, DenyReason, LifelineAvailability, LifelineKind,
    Question, RejectReason, ServerEvent, Standing,
};

// ── State types ─────────────────────────────────────────────────────

/// Where the current question is in its lifecycle.
///
/// The paused flag and the answer lock are orthogonal axes and live outside
/// this enum; "locked" in the protocol sense is [`AnswerLock::Locked`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuestionPhase {
    /// No question has been broadcast yet (or the session was torn down).
    #[default]
    Idle,
    /// Counting down; submissions permitted subject to the guards.
    Active,
    /// Correct answer disclosed; terminal until the next question event.
    Revealed,
    /// Session finished; no further question events expected.
    Complete,
}

/// The optimistic-then-confirmed answer lock for the local participant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AnswerLock {
    /// No submission made for the current question.
    #[default]
    Unlocked,
    /// An intent was emitted and is awaiting the authority's verdict; the
    /// carried value is the optimistic local guess.
    Submitting(String),
    /// The authority confirmed this value. Immutable until the next question.
    Locked(String),
}

impl AnswerLock {
    /// The value to display, optimistic or confirmed.
    pub fn answer(&self) -> Option<&str> {
        match self {
            Self::Unlocked => None,
            Self::Submitting(v) | Self::Locked(v) => Some(v),
        }
    }

    /// Whether the authority has confirmed a lock.
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked(_))
    }

    /// Whether a submission is currently in flight.
    pub fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting(_))
    }
}

/// Terminal record for a revealed question.
#[derive(Debug, Clone, PartialEq)]
pub struct RevealRecord {
    /// Correct choice id or free-text value; `None` for open questions.
    pub correct_answer: Option<String>,
    /// Local arrival timestamp (epoch seconds).
    pub received_at: f64,
}

/// Per-question, per-participant lifeline consumption. Each flag falls at
/// most once per question and never rises again until the next question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifelineUsage {
    halve_choices: bool,
    hint: bool,
}

impl LifelineUsage {
    /// Whether the given kind was already consumed this question.
    pub fn used(&self, kind: LifelineKind) -> bool {
        match kind {
            LifelineKind::HalveChoices => self.halve_choices,
            LifelineKind::Hint => self.hint,
        }
    }

    fn mark_used(&mut self, kind: LifelineKind) {
        match kind {
            LifelineKind::HalveChoices => self.halve_choices = true,
            LifelineKind::Hint => self.hint = true,
        }
    }
}

/// Why the session view was forcibly torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveReason {
    /// The administrator performed a full reset; return to entry.
    Reset,
    /// The same identity connected elsewhere; this connection is stale.
    Replaced,
}

impl std::fmt::Display for LeaveReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reset => write!(f, "the host reset the session"),
            Self::Replaced => write!(f, "your identity connected from another device"),
        }
    }
}

// ── Guard errors ────────────────────────────────────────────────────

/// Why a local submission attempt was refused before reaching the network.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SubmitBlock {
    #[error("no active question to answer")]
    NoActiveQuestion,
    #[error("answer already locked for this question")]
    AlreadyLocked,
    #[error("the correct answer has been revealed")]
    Revealed,
    #[error("the session is paused")]
    Paused,
    #[error("a submission is already in flight")]
    InFlight,
    #[error("time is up for this question")]
    TimeExpired,
}

/// Why a local lifeline request was refused before reaching the network.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LifelineBlock {
    #[error("lifeline disabled by the host")]
    Disabled,
    #[error("lifeline already used this question")]
    AlreadyUsed,
    #[error(transparent)]
    Blocked(#[from] SubmitBlock),
}

// ── Session state ───────────────────────────────────────────────────

/// Read-mostly projection of the shared session for one client role.
///
/// Mutated only through [`apply`](Self::apply), [`tick`](Self::tick) and the
/// two `begin_*` pipelines; everything else is read access.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    clock: ClockSync,
    phase: QuestionPhase,
    paused: bool,
    question: Option<Question>,
    index: Option<u32>,
    total: Option<u32>,
    time_left: u32,
    lock: AnswerLock,
    reveal: Option<RevealRecord>,
    rejection: Option<RejectReason>,
    result: Option<AnswerResultPayload>,
    lifelines_enabled: LifelineAvailability,
    lifelines_used: LifelineUsage,
    kept_choice_ids: Option<Vec<String>>,
    hint: Option<String>,
    last_denial: Option<(LifelineKind, DenyReason)>,
    standings: Vec<Standing>,
    leaderboard_visible: bool,
    participant_code: Option<String>,
}

impl SessionState {
    /// A fresh, pre-join session projection.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Reducer ─────────────────────────────────────────────────────

    /// Apply one inbound authority event.
    ///
    /// Returns `Some(reason)` when the event forces the client to leave the
    /// session entirely (`reset` / `replaced`); the caller must then
    /// terminate the connection and discard this state. Every event is
    /// idempotent: applying it twice leaves the same state as applying it
    /// once.
    pub fn apply(&mut self, event: &ServerEvent, local_now: f64) -> Option<LeaveReason> {
        match event {
            ServerEvent::Joined { participant_code } => {
                if participant_code.is_some() {
                    self.participant_code = participant_code.clone();
                }
            }
            ServerEvent::Question(payload) => {
                // Hard reset of all per-question state, whatever came before.
                self.clock.observe(payload.server_time, local_now);
                self.question = Some(payload.question.clone());
                self.index = Some(payload.index);
                self.phase = QuestionPhase::Active;
                self.paused = false;
                self.time_left = self.clock.time_left(
                    payload.duration,
                    payload.started_at,
                    payload.remaining,
                    local_now,
                );
                self.lock = AnswerLock::Unlocked;
                self.reveal = None;
                self.rejection = None;
                self.result = None;
                self.lifelines_used = LifelineUsage::default();
                self.kept_choice_ids = None;
                self.hint = None;
                self.last_denial = None;
            }
            ServerEvent::Status(st) => {
                if let Some(ts) = st.server_time {
                    self.clock.observe(ts, local_now);
                }
                self.index = Some(st.index);
                self.total = Some(st.total);
                self.paused = st.paused;
                if st.complete {
                    self.phase = QuestionPhase::Complete;
                } else if self.question.is_some() {
                    // Reconcile the reveal axis; a bare status carries no
                    // correct answer, so the RevealRecord only comes from an
                    // explicit reveal event.
                    self.phase = if st.revealed {
                        QuestionPhase::Revealed
                    } else {
                        QuestionPhase::Active
                    };
                }
                if let Some(remaining) = st.remaining {
                    self.time_left = remaining.max(0.0).ceil() as u32;
                } else if let (Some(duration), Some(started_at)) = (st.duration, st.started_at) {
                    if self.phase == QuestionPhase::Active {
                        self.time_left =
                            self.clock.time_left(duration, started_at, None, local_now);
                    }
                }
            }
            ServerEvent::Reveal { correct_answer } => {
                // Idempotent: a duplicate reveal must not alter revealed state.
                if self.phase != QuestionPhase::Revealed {
                    self.phase = QuestionPhase::Revealed;
                    self.reveal = Some(RevealRecord {
                        correct_answer: correct_answer.clone(),
                        received_at: local_now,
                    });
                }
            }
            ServerEvent::AnswerLocked { answer } => {
                // The authority's confirmed value always wins over the
                // optimistic one (they differ only in duplicate-submission
                // races).
                let confirmed = answer
                    .clone()
                    .or_else(|| self.lock.answer().map(str::to_owned));
                if let Some(value) = confirmed {
                    self.lock = AnswerLock::Locked(value);
                    self.rejection = None;
                }
            }
            ServerEvent::AnswerRejected { reason } => {
                // Roll back the optimistic value unless a lock was already
                // confirmed for this question.
                if !self.lock.is_locked() {
                    self.lock = AnswerLock::Unlocked;
                }
                self.rejection = Some(*reason);
            }
            ServerEvent::AnswerResult(result) => {
                self.result = Some(result.clone());
            }
            ServerEvent::LifelineStatus(availability) => {
                self.lifelines_enabled = *availability;
            }
            ServerEvent::LifelineHalveChoices { keep_ids } => {
                self.kept_choice_ids = Some(keep_ids.clone());
                self.lifelines_used.mark_used(LifelineKind::HalveChoices);
                self.last_denial = None;
            }
            ServerEvent::LifelineHint { hint } => {
                self.hint = Some(hint.clone());
                self.lifelines_used.mark_used(LifelineKind::Hint);
                self.last_denial = None;
            }
            ServerEvent::LifelineDenied { lifeline, reason } => {
                // A denial never consumes the usage flag.
                self.last_denial = Some((*lifeline, *reason));
            }
            ServerEvent::Leaderboard(standings) => {
                // Data refresh only; visibility is a separate axis.
                self.standings = standings.clone();
            }
            ServerEvent::LeaderboardShow(standings) => {
                self.standings = standings.clone();
                self.leaderboard_visible = true;
            }
            ServerEvent::LeaderboardHide => {
                self.leaderboard_visible = false;
            }
            ServerEvent::Paused => {
                self.paused = true;
            }
            ServerEvent::Resumed => {
                self.paused = false;
            }
            ServerEvent::Complete => {
                self.phase = QuestionPhase::Complete;
            }
            ServerEvent::Reset => {
                self.teardown();
                return Some(LeaveReason::Reset);
            }
            ServerEvent::Replaced => {
                self.teardown();
                return Some(LeaveReason::Replaced);
            }
            ServerEvent::Error { .. } => {}
        }
        None
    }

    /// One-second local countdown decrement.
    ///
    /// Inert while paused, revealed, complete, idle, or already at zero.
    /// Returns whether the displayed value changed. This is the only local
    /// extrapolation permitted between authority updates.
    pub fn tick(&mut self) -> bool {
        if self.paused || self.phase != QuestionPhase::Active || self.time_left == 0 {
            return false;
        }
        self.time_left -= 1;
        true
    }

    // ── Answer submission pipeline ──────────────────────────────────

    /// Check every submission guard without changing state.
    pub fn submit_guard(&self) -> Result<(), SubmitBlock> {
        match self.phase {
            QuestionPhase::Idle | QuestionPhase::Complete => {
                return Err(SubmitBlock::NoActiveQuestion)
            }
            QuestionPhase::Revealed => return Err(SubmitBlock::Revealed),
            QuestionPhase::Active => {}
        }
        if self.question.is_none() {
            return Err(SubmitBlock::NoActiveQuestion);
        }
        if self.paused {
            return Err(SubmitBlock::Paused);
        }
        match self.lock {
            AnswerLock::Locked(_) => return Err(SubmitBlock::AlreadyLocked),
            AnswerLock::Submitting(_) => return Err(SubmitBlock::InFlight),
            AnswerLock::Unlocked => {}
        }
        if self.time_left == 0 {
            return Err(SubmitBlock::TimeExpired);
        }
        Ok(())
    }

    /// Run the guards and, if they pass, optimistically enter the
    /// `Submitting` state and produce the intent to emit.
    ///
    /// # Errors
    ///
    /// Returns the failing [`SubmitBlock`] guard; no intent is produced and
    /// no state changes.
    pub fn begin_submission(&mut self, answer: impl Into<String>) -> Result<ClientIntent, SubmitBlock> {
        self.submit_guard()?;
        let answer = answer.into();
        self.lock = AnswerLock::Submitting(answer.clone());
        self.rejection = None;
        Ok(ClientIntent::SubmitAnswer { answer })
    }

    // ── Lifeline pipeline ───────────────────────────────────────────

    /// Check every lifeline guard for `kind` without changing state.
    pub fn lifeline_guard(&self, kind: LifelineKind) -> Result<(), LifelineBlock> {
        if !self.lifelines_enabled.enabled(kind) {
            return Err(LifelineBlock::Disabled);
        }
        if self.lifelines_used.used(kind) {
            return Err(LifelineBlock::AlreadyUsed);
        }
        self.submit_guard()?;
        Ok(())
    }

    /// Run the guards and, if they pass, produce the lifeline request intent.
    ///
    /// The usage flag is only consumed when the grant arrives — a denial must
    /// leave it untouched, so emission does not mark anything used.
    ///
    /// # Errors
    ///
    /// Returns the failing [`LifelineBlock`] guard.
    pub fn begin_lifeline(&mut self, kind: LifelineKind) -> Result<ClientIntent, LifelineBlock> {
        self.lifeline_guard(kind)?;
        self.last_denial = None;
        Ok(ClientIntent::LifelineRequest { lifeline: kind })
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// Current question-lifecycle phase.
    pub fn phase(&self) -> QuestionPhase {
        self.phase
    }

    /// Whether the countdown is frozen by an explicit pause.
    pub fn paused(&self) -> bool {
        self.paused
    }

    /// The current question, if one has been broadcast.
    pub fn question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    /// Zero-based index of the current question.
    pub fn index(&self) -> Option<u32> {
        self.index
    }

    /// Total question count, as last reported by the authority.
    pub fn total(&self) -> Option<u32> {
        self.total
    }

    /// Displayed remaining whole seconds. Never negative.
    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    /// The answer lock for the local participant.
    pub fn lock(&self) -> &AnswerLock {
        &self.lock
    }

    /// Terminal reveal record for the current question, if revealed.
    pub fn reveal(&self) -> Option<&RevealRecord> {
        self.reveal.as_ref()
    }

    /// The last rejection reason, kept for display until the next question.
    pub fn rejection(&self) -> Option<RejectReason> {
        self.rejection
    }

    /// Per-participant outcome delivered after the reveal.
    pub fn result(&self) -> Option<&AnswerResultPayload> {
        self.result.as_ref()
    }

    /// Global lifeline enablement as last broadcast.
    pub fn lifelines_enabled(&self) -> LifelineAvailability {
        self.lifelines_enabled
    }

    /// Per-question lifeline consumption for the local participant.
    pub fn lifelines_used(&self) -> LifelineUsage {
        self.lifelines_used
    }

    /// The last lifeline denial, if any, for display.
    pub fn last_denial(&self) -> Option<(LifelineKind, DenyReason)> {
        self.last_denial
    }

    /// Hint text granted for the current question.
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// Choice ids retained by a granted halve-choices lifeline.
    pub fn kept_choice_ids(&self) -> Option<&[String]> {
        self.kept_choice_ids.as_deref()
    }

    /// The choices the local participant should see: the full set, narrowed
    /// to the retained subset after a halve-choices grant. `None` for
    /// free-text questions or before any question arrived.
    pub fn visible_choices(&self) -> Option<Vec<&Choice>> {
        let choices = self.question.as_ref()?.choices.as_ref()?;
        match &self.kept_choice_ids {
            Some(keep) => Some(choices.iter().filter(|c| keep.contains(&c.id)).collect()),
            None => Some(choices.iter().collect()),
        }
    }

    /// Current leaderboard standings (may be non-empty while hidden).
    pub fn standings(&self) -> &[Standing] {
        &self.standings
    }

    /// Whether the leaderboard overlay should currently be rendered.
    pub fn leaderboard_visible(&self) -> bool {
        self.leaderboard_visible
    }

    /// Participant code echoed by the join acknowledgement.
    pub fn participant_code(&self) -> Option<&str> {
        self.participant_code.as_deref()
    }

    // ── Internal ────────────────────────────────────────────────────

    /// Discard every piece of session state, returning to the pre-join view.
    fn teardown(&mut self) {
        *self = Self::new();
    }
}

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
    use crate::protocol::{QuestionPayload, StatusPayload};

    fn question_event(index: u32, duration: u32, started_at: f64, server_time: f64) -> ServerEvent {
        ServerEvent::Question(Box::new(QuestionPayload {
            question: Question {
                id: format!("q{index}"),
                text: "2 + 2 = ?".into(),
                choices: Some(vec![
                    Choice { id: "a".into(), text: "3".into() },
                    Choice { id: "b".into(), text: "4".into() },
                    Choice { id: "c".into(), text: "5".into() },
                    Choice { id: "d".into(), text: "22".into() },
                ]),
                answer: None,
                duration,
                hint: Some("Even number".into()),
            },
            index,
            duration,
            started_at,
            remaining: None,
            server_time,
        }))
    }

    fn active_session() -> SessionState {
        let mut state = SessionState::new();
        state.apply(&question_event(0, 20, 1000.0, 1000.0), 1000.0);
        state
    }

    #[test]
    fn question_event_hard_resets_per_question_state() {
        let mut state = active_session();
        state.begin_submission("b").ok();
        state.apply(&ServerEvent::AnswerLocked { answer: Some("b".into()) }, 1001.0);
        state.apply(&ServerEvent::Reveal { correct_answer: Some("b".into()) }, 1002.0);
        state.apply(&ServerEvent::LifelineHint { hint: "x".into() }, 1003.0);

        state.apply(&question_event(1, 25, 1100.0, 1100.0), 1100.0);
        assert_eq!(state.phase(), QuestionPhase::Active);
        assert_eq!(state.index(), Some(1));
        assert_eq!(state.time_left(), 25);
        assert_eq!(*state.lock(), AnswerLock::Unlocked);
        assert!(state.reveal().is_none());
        assert!(state.hint().is_none());
        assert!(!state.lifelines_used().used(LifelineKind::Hint));
    }

    #[test]
    fn duplicate_reveal_is_idempotent() {
        let mut state = active_session();
        state.apply(&ServerEvent::Reveal { correct_answer: Some("b".into()) }, 1005.0);
        let first = state.reveal().cloned();
        state.apply(&ServerEvent::Reveal { correct_answer: Some("b".into()) }, 1009.0);
        assert_eq!(state.reveal().cloned(), first);
        assert_eq!(state.phase(), QuestionPhase::Revealed);
    }

    #[test]
    fn tick_is_inert_while_paused_and_after_reveal() {
        let mut state = active_session();
        assert!(state.tick());
        assert_eq!(state.time_left(), 19);

        state.apply(&ServerEvent::Paused, 1001.0);
        assert!(!state.tick());
        assert_eq!(state.time_left(), 19);

        state.apply(&ServerEvent::Resumed, 1002.0);
        assert!(state.tick());
        assert_eq!(state.time_left(), 18);

        state.apply(&ServerEvent::Reveal { correct_answer: None }, 1003.0);
        assert!(!state.tick());
        assert_eq!(state.time_left(), 18);
    }

    #[test]
    fn tick_never_goes_below_zero() {
        let mut state = active_session();
        for _ in 0..40 {
            state.tick();
        }
        assert_eq!(state.time_left(), 0);
        assert!(!state.tick());
    }

    #[test]
    fn submission_rejected_locally_after_time_expired() {
        let mut state = active_session();
        while state.tick() {}
        assert_eq!(
            state.begin_submission("a").map(|_| ()),
            Err(SubmitBlock::TimeExpired)
        );
    }

    #[test]
    fn optimistic_submit_then_confirm() {
        let mut state = active_session();
        let intent = state.begin_submission("b").ok();
        assert_eq!(
            intent,
            Some(ClientIntent::SubmitAnswer { answer: "b".into() })
        );
        assert!(state.lock().is_submitting());

        // A second attempt is blocked before any network round-trip.
        assert_eq!(
            state.begin_submission("c").map(|_| ()),
            Err(SubmitBlock::InFlight)
        );

        state.apply(&ServerEvent::AnswerLocked { answer: Some("b".into()) }, 1001.0);
        assert_eq!(*state.lock(), AnswerLock::Locked("b".into()));
        assert_eq!(
            state.begin_submission("c").map(|_| ()),
            Err(SubmitBlock::AlreadyLocked)
        );
    }

    #[test]
    fn authority_confirmed_value_wins_over_optimistic() {
        let mut state = active_session();
        state.begin_submission("c").ok();
        state.apply(&ServerEvent::AnswerLocked { answer: Some("b".into()) }, 1001.0);
        assert_eq!(state.lock().answer(), Some("b"));
    }

    #[test]
    fn rejection_without_confirmed_lock_rolls_back() {
        let mut state = active_session();
        state.begin_submission("d").ok();
        state.apply(
            &ServerEvent::AnswerRejected { reason: RejectReason::LateSubmission },
            1001.0,
        );
        assert_eq!(*state.lock(), AnswerLock::Unlocked);
        assert_eq!(state.rejection(), Some(RejectReason::LateSubmission));
        // The pipeline is usable again.
        assert!(state.begin_submission("a").is_ok());
    }

    #[test]
    fn rejection_after_confirmed_lock_keeps_the_lock() {
        let mut state = active_session();
        state.begin_submission("b").ok();
        state.apply(&ServerEvent::AnswerLocked { answer: Some("b".into()) }, 1001.0);
        // Pathological duplicate-submission race: a stale rejection arrives.
        state.apply(
            &ServerEvent::AnswerRejected { reason: RejectReason::DuplicateSubmission },
            1002.0,
        );
        assert_eq!(*state.lock(), AnswerLock::Locked("b".into()));
    }

    #[test]
    fn lifeline_grant_consumes_flag_once_denial_never_does() {
        let mut state = active_session();
        assert!(state.begin_lifeline(LifelineKind::Hint).is_ok());
        state.apply(
            &ServerEvent::LifelineDenied {
                lifeline: LifelineKind::Hint,
                reason: DenyReason::Disabled,
            },
            1001.0,
        );
        assert!(!state.lifelines_used().used(LifelineKind::Hint));

        state.apply(&ServerEvent::LifelineHint { hint: "Even number".into() }, 1002.0);
        assert!(state.lifelines_used().used(LifelineKind::Hint));
        assert_eq!(
            state.begin_lifeline(LifelineKind::Hint).map(|_| ()),
            Err(LifelineBlock::AlreadyUsed)
        );
        // Redelivered grant leaves the flag where it is.
        state.apply(&ServerEvent::LifelineHint { hint: "Even number".into() }, 1003.0);
        assert!(state.lifelines_used().used(LifelineKind::Hint));
    }

    #[test]
    fn globally_disabled_lifeline_is_blocked_locally() {
        let mut state = active_session();
        state.apply(
            &ServerEvent::LifelineStatus(LifelineAvailability {
                halve_choices: false,
                hint: true,
            }),
            1001.0,
        );
        assert_eq!(
            state.begin_lifeline(LifelineKind::HalveChoices).map(|_| ()),
            Err(LifelineBlock::Disabled)
        );
        assert!(state.begin_lifeline(LifelineKind::Hint).is_ok());
    }

    #[test]
    fn halve_choices_narrows_visible_set() {
        let mut state = active_session();
        state.apply(
            &ServerEvent::LifelineHalveChoices { keep_ids: vec!["b".into(), "d".into()] },
            1001.0,
        );
        let visible: Vec<&str> = state
            .visible_choices()
            .unwrap_or_default()
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(visible, vec!["b", "d"]);
    }

    #[test]
    fn leaderboard_hide_then_update_stays_hidden() {
        let mut state = active_session();
        let standing = Standing {
            id: "p1".into(),
            name: "Alice".into(),
            score: 900,
            participant_code: None,
            firsts: None,
            cumulative_time: None,
            online: None,
        };
        state.apply(&ServerEvent::LeaderboardShow(vec![standing.clone()]), 1001.0);
        assert!(state.leaderboard_visible());

        state.apply(&ServerEvent::LeaderboardHide, 1002.0);
        let refreshed = Standing { score: 1200, ..standing };
        state.apply(&ServerEvent::Leaderboard(vec![refreshed]), 1003.0);
        assert!(!state.leaderboard_visible());
        assert_eq!(state.standings().first().map(|s| s.score), Some(1200));
    }

    #[test]
    fn status_reconciles_pause_reveal_and_time() {
        let mut state = active_session();
        state.apply(
            &ServerEvent::Status(StatusPayload {
                index: 0,
                total: 10,
                paused: true,
                revealed: false,
                duration: Some(20),
                started_at: Some(1000.0),
                remaining: Some(7.4),
                server_time: Some(1012.6),
                complete: false,
            }),
            1012.6,
        );
        assert!(state.paused());
        assert_eq!(state.time_left(), 8);
        assert_eq!(state.total(), Some(10));

        // Status with startedAt/duration but no explicit remaining.
        state.apply(
            &ServerEvent::Status(StatusPayload {
                index: 0,
                total: 10,
                paused: false,
                revealed: false,
                duration: Some(20),
                started_at: Some(1000.0),
                remaining: None,
                server_time: Some(1005.0),
                complete: false,
            }),
            1005.0,
        );
        assert_eq!(state.time_left(), 15);
    }

    #[test]
    fn complete_is_terminal_for_submissions() {
        let mut state = active_session();
        state.apply(&ServerEvent::Complete, 1001.0);
        assert_eq!(state.phase(), QuestionPhase::Complete);
        assert_eq!(
            state.begin_submission("a").map(|_| ()),
            Err(SubmitBlock::NoActiveQuestion)
        );
    }

    #[test]
    fn reset_and_replaced_tear_down_with_distinct_reasons() {
        let mut state = active_session();
        state.begin_submission("b").ok();
        assert_eq!(state.apply(&ServerEvent::Replaced, 1001.0), Some(LeaveReason::Replaced));
        assert_eq!(state.phase(), QuestionPhase::Idle);
        assert!(state.question().is_none());
        assert_eq!(*state.lock(), AnswerLock::Unlocked);

        let mut state = active_session();
        assert_eq!(state.apply(&ServerEvent::Reset, 1001.0), Some(LeaveReason::Reset));
        assert_ne!(LeaveReason::Reset, LeaveReason::Replaced);
    }

    #[test]
    fn submission_blocked_while_paused_or_revealed() {
        let mut state = active_session();
        state.apply(&ServerEvent::Paused, 1001.0);
        assert_eq!(state.begin_submission("a").map(|_| ()), Err(SubmitBlock::Paused));

        state.apply(&ServerEvent::Resumed, 1002.0);
        state.apply(&ServerEvent::Reveal { correct_answer: None }, 1003.0);
        assert_eq!(state.begin_submission("a").map(|_| ()), Err(SubmitBlock::Revealed));
    }
}
