//! Typed events emitted to the consumer of a [`QuizwireClient`](crate::client::QuizwireClient).
//!
//! These are not wire types: they are what the client surfaces after the
//! session reducer has applied an inbound [`ServerEvent`](crate::protocol::ServerEvent),
//! plus synthetic connection-lifecycle events (`Connected`, `TimeLeft`,
//! `Disconnected`) the authority never sends.

use crate::protocol::{
    AnswerResultPayload, DenyReason, LifelineAvailability, LifelineKind, Question, RejectReason,
    Standing,
};
use crate::session::LeaveReason;

/// Events delivered on the channel returned by
/// [`QuizwireClient::start`](crate::client::QuizwireClient::start).
#[derive(Debug, Clone, PartialEq)]
pub enum QuizwireEvent {
    /// The transport is up and the join intent has been queued.
    Connected,
    /// The authority acknowledged the join handshake.
    Joined {
        /// Participant code echoed back for contestants.
        participant_code: Option<String>,
    },
    /// A new question is active; all per-question state was reset.
    QuestionStarted {
        question: Question,
        index: u32,
        time_left: u32,
    },
    /// A status broadcast reconciled pause/reveal/time.
    StatusUpdated {
        index: u32,
        total: u32,
        paused: bool,
        revealed: bool,
        time_left: u32,
    },
    /// The local one-second countdown decremented.
    TimeLeft(u32),
    /// The countdown was frozen by the administrator.
    Paused,
    /// The countdown resumed.
    Resumed,
    /// The correct answer was disclosed; the question is over.
    Revealed { correct_answer: Option<String> },
    /// The authority confirmed the local answer lock.
    AnswerLocked { answer: Option<String> },
    /// The authority refused the submission; optimistic state rolled back.
    AnswerRejected { reason: RejectReason },
    /// Per-participant outcome after the reveal.
    AnswerResult(AnswerResultPayload),
    /// Global lifeline enablement changed.
    LifelineStatus(LifelineAvailability),
    /// Halve-choices was granted; only these choice ids remain visible.
    ChoicesNarrowed { keep_ids: Vec<String> },
    /// The hint lifeline was granted.
    HintRevealed { hint: String },
    /// A lifeline request was denied; usage flags are untouched.
    LifelineDenied {
        lifeline: LifelineKind,
        reason: DenyReason,
    },
    /// Standings refreshed without a visibility change.
    LeaderboardUpdated { standings: Vec<Standing> },
    /// Standings refreshed and the leaderboard became visible.
    LeaderboardShown { standings: Vec<Standing> },
    /// The leaderboard was hidden; standings are retained.
    LeaderboardHidden,
    /// The session finished; no further questions are coming.
    SessionComplete,
    /// The session view was forcibly torn down (`reset` or `replaced`); the
    /// client must navigate back to entry. The reason is distinct per cause.
    SessionEnded { reason: LeaveReason },
    /// The authority complained about an intent; informational.
    AuthorityError { message: String },
    /// The transport closed. Always the final event on the channel.
    Disconnected { reason: Option<String> },
}
