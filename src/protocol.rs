//! Wire types for the Quizwire session protocol.
//!
//! Every type in this module produces JSON identical to what the session
//! authority emits and accepts. Envelopes are adjacently tagged —
//! `{"type": "...", "data": {...}}` — and events with no payload omit the
//! `data` field entirely. Payload keys are `camelCase` on the wire.
//!
//! Timestamps (`server_time`, `started_at`) are seconds since the Unix epoch,
//! fractional, measured on the authority's clock.

use serde::{Deserialize, Serialize};

// ── Type aliases ────────────────────────────────────────────────────

/// Opaque participant identifier issued by the authority at registration.
pub type ParticipantId = String;

// ── Enums ───────────────────────────────────────────────────────────

/// The two single-use-per-question bonus actions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LifelineKind {
    /// Narrow the visible choice set to an authority-chosen subset that
    /// always retains the correct choice.
    #[serde(rename = "halve-choices")]
    HalveChoices,
    /// Reveal the question's supplementary hint text.
    #[serde(rename = "hint")]
    Hint,
}

/// Why the authority refused a submitted answer.
///
/// The taxonomy is closed on the authority side; [`RejectReason::Other`]
/// absorbs strings introduced by a newer authority so deserialization of an
/// `answer_rejected` event can never fail.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The countdown had already expired when the submission arrived.
    LateSubmission,
    /// A lock already existed for this participant and question.
    DuplicateSubmission,
    /// The chosen value is not among the question's choices.
    InvalidChoice,
    /// No question is currently active (paused, revealed, or between questions).
    SessionNotActive,
    /// Unrecognized reason from a newer authority.
    #[serde(other)]
    Other,
}

impl RejectReason {
    /// Human-readable explanation suitable for display.
    pub fn description(&self) -> &'static str {
        match self {
            Self::LateSubmission => "Time was already up when your answer arrived.",
            Self::DuplicateSubmission => "You had already locked an answer for this question.",
            Self::InvalidChoice => "That answer is not one of the available choices.",
            Self::SessionNotActive => "The session is not accepting answers right now.",
            Self::Other => "Your answer was rejected.",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Why the authority denied a lifeline request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The administrator has disabled this lifeline globally.
    Disabled,
    /// This lifeline was already consumed for the current question.
    AlreadyUsed,
    /// No question is currently active.
    SessionNotActive,
    /// Unrecognized reason from a newer authority.
    #[serde(other)]
    Other,
}

impl DenyReason {
    /// Human-readable explanation suitable for display.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Disabled => "This lifeline is currently disabled by the host.",
            Self::AlreadyUsed => "You already used this lifeline on this question.",
            Self::SessionNotActive => "Lifelines are only available during an active question.",
            Self::Other => "This lifeline is unavailable right now.",
        }
    }
}

impl std::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// ── Structs ─────────────────────────────────────────────────────────

/// One selectable choice of a multiple-choice question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Choice {
    pub id: String,
    pub text: String,
}

/// A quiz question as broadcast by the authority. Immutable once received.
///
/// `answer` is stripped by the authority before broadcast and only arrives
/// through a [`reveal`](ServerEvent::Reveal) event; the field exists so admin
/// tooling can carry unstripped question sets through the same type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: String,
    pub text: String,
    /// `None` for free-text questions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Choice>>,
    /// Correct choice id or free-text value. `None` on contestant broadcasts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Countdown duration in seconds.
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Global lifeline enablement, admin-controlled, broadcast via
/// [`lifeline_status`](ServerEvent::LifelineStatus).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LifelineAvailability {
    #[serde(rename = "halve-choices")]
    pub halve_choices: bool,
    pub hint: bool,
}

impl Default for LifelineAvailability {
    fn default() -> Self {
        Self {
            halve_choices: true,
            hint: true,
        }
    }
}

impl LifelineAvailability {
    /// Whether the given kind is globally enabled.
    pub fn enabled(&self, kind: LifelineKind) -> bool {
        match kind {
            LifelineKind::HalveChoices => self.halve_choices,
            LifelineKind::Hint => self.hint,
        }
    }
}

/// One row of the leaderboard as broadcast by the authority.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub id: ParticipantId,
    pub name: String,
    pub score: i64,
    /// Uniqueness key (contact code) — present on admin-facing payloads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_code: Option<String>,
    /// Count of first-correct bonuses, used as a tie-break.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firsts: Option<u32>,
    /// Cumulative answer time in seconds, used as a tie-break.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "cumTime")]
    pub cumulative_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online: Option<bool>,
}

// ── Payload structs ─────────────────────────────────────────────────

/// Payload for the [`question`](ServerEvent::Question) event.
/// Boxed in `ServerEvent` to reduce enum size.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPayload {
    pub question: Question,
    /// Zero-based index of this question within the session.
    pub index: u32,
    /// Nominal countdown duration in seconds.
    pub duration: u32,
    /// Authority-side timestamp at which the countdown started.
    pub started_at: f64,
    /// Authoritative remaining seconds, if the authority computed one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<f64>,
    /// Authority-side send timestamp; re-anchors the skew estimate.
    pub server_time: f64,
}

/// Payload for the [`status`](ServerEvent::Status) event.
///
/// A newer status always supersedes the previous one wholesale; fields are
/// never merged across statuses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatusPayload {
    pub index: u32,
    pub total: u32,
    pub paused: bool,
    pub revealed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_time: Option<f64>,
    #[serde(default)]
    pub complete: bool,
}

/// Payload for the [`answer_result`](ServerEvent::AnswerResult) event,
/// sent per-participant after a reveal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResultPayload {
    pub correct: bool,
    /// Cumulative score after this question.
    pub score: i64,
    /// Rank among correct responders by submission time; `None` if incorrect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    /// Points awarded for this question.
    #[serde(default)]
    pub awarded: i64,
}

// ── Events ──────────────────────────────────────────────────────────

/// Events sent from the session authority to a client.
///
/// Every variant is idempotent: redelivery or admin double-action must not
/// corrupt client state (see [`SessionState::apply`](crate::session::SessionState::apply)).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Join handshake acknowledged.
    Joined {
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            rename = "participantCode"
        )]
        participant_code: Option<String>,
    },
    /// New question broadcast — hard reset of all per-question state.
    Question(Box<QuestionPayload>),
    /// Full session status reconciliation.
    Status(StatusPayload),
    /// Correct answer disclosed; terminal for the current question.
    Reveal {
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            rename = "correctAnswer"
        )]
        correct_answer: Option<String>,
    },
    /// The authority confirmed this participant's answer lock.
    AnswerLocked {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        answer: Option<String>,
    },
    /// The authority refused the submission; local optimistic state rolls back.
    AnswerRejected { reason: RejectReason },
    /// Per-participant outcome after a reveal.
    AnswerResult(AnswerResultPayload),
    /// Global lifeline enablement changed.
    LifelineStatus(LifelineAvailability),
    /// Halve-choices granted: only `keep_ids` remain visible.
    LifelineHalveChoices {
        #[serde(rename = "keepIds")]
        keep_ids: Vec<String>,
    },
    /// Hint granted.
    LifelineHint { hint: String },
    /// Lifeline request denied; usage flag is left untouched.
    LifelineDenied {
        lifeline: LifelineKind,
        reason: DenyReason,
    },
    /// Standings refresh without changing visibility.
    Leaderboard(Vec<Standing>),
    /// Standings refresh and make the leaderboard visible.
    LeaderboardShow(Vec<Standing>),
    /// Hide the leaderboard without discarding data.
    LeaderboardHide,
    /// Freeze the countdown.
    Paused,
    /// Resume the countdown.
    Resumed,
    /// Session finished; no further question events expected.
    Complete,
    /// Full reset: terminate and return to the pre-join entry state.
    Reset,
    /// Same identity connected elsewhere; this connection must terminate.
    Replaced,
    /// Non-fatal authority complaint (bad intent, unauthorized, ...).
    Error { message: String },
}

/// Intents sent from a client to the session authority.
///
/// All intents are fire-and-forget; confirmation arrives asynchronously via
/// [`ServerEvent`]s.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientIntent {
    /// Contestant join handshake (MUST be the first message for this role).
    JoinContestant {
        name: String,
        #[serde(rename = "participantId")]
        participant_id: ParticipantId,
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            rename = "contactCode"
        )]
        contact_code: Option<String>,
    },
    /// Public display join handshake — read-only broadcast subscription.
    JoinDisplay,
    /// Administrator join handshake with the admin credential.
    JoinAdmin { token: String },
    /// Submit this participant's single answer for the current question.
    SubmitAnswer { answer: String },
    /// Request a lifeline for the current question.
    LifelineRequest { lifeline: LifelineKind },
}
