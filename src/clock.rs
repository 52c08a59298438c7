//! Clock-skew estimation and drift-free countdown arithmetic.
//!
//! Every authority event that carries a timestamp re-anchors the skew
//! estimate (last-write-wins, no smoothing), so cumulative client-side drift
//! can never exceed one inter-event interval. Countdown values derived here
//! are clamped non-negative and rounded up to whole seconds for display.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current local wall-clock time as fractional seconds since the Unix epoch.
///
/// Clamped to zero if the system clock reports a pre-epoch time.
pub fn local_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Last-write-wins estimate of `authority_clock - local_clock`.
///
/// Kept as a dedicated value type rather than inline arithmetic so the
/// countdown invariants (never negative, no extrapolation beyond one-second
/// decrements) stay independently testable.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClockSync {
    skew: f64,
}

impl ClockSync {
    /// A fresh estimate with zero skew.
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-anchor the skew estimate from a timestamped authority event.
    pub fn observe(&mut self, server_time: f64, local_now: f64) {
        self.skew = server_time - local_now;
    }

    /// Current skew estimate in seconds (positive = authority clock is ahead).
    pub fn skew(&self) -> f64 {
        self.skew
    }

    /// The authority's clock projected onto the local clock.
    pub fn server_now(&self, local_now: f64) -> f64 {
        local_now + self.skew
    }

    /// Fractional remaining seconds for a countdown.
    ///
    /// An explicit authority-provided `remaining` always wins; otherwise the
    /// value is derived as `duration - max(0, server_now - started_at)`.
    /// Never negative.
    pub fn remaining(
        &self,
        duration: u32,
        started_at: f64,
        explicit_remaining: Option<f64>,
        local_now: f64,
    ) -> f64 {
        let remaining = match explicit_remaining {
            Some(r) => r,
            None => {
                let elapsed = (self.server_now(local_now) - started_at).max(0.0);
                f64::from(duration) - elapsed
            }
        };
        remaining.max(0.0)
    }

    /// Whole displayed seconds: `ceil(max(0, remaining))`.
    pub fn time_left(
        &self,
        duration: u32,
        started_at: f64,
        explicit_remaining: Option<f64>,
        local_now: f64,
    ) -> u32 {
        let remaining = self.remaining(duration, started_at, explicit_remaining, local_now);
        // Durations are bounded by u32 on the wire, so the cast cannot wrap.
        remaining.ceil() as u32
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

    #[test]
    fn observe_is_last_write_wins() {
        let mut clock = ClockSync::new();
        clock.observe(1000.0, 990.0);
        assert_eq!(clock.skew(), 10.0);
        clock.observe(2000.0, 2003.0);
        assert_eq!(clock.skew(), -3.0);
    }

    #[test]
    fn server_now_applies_skew() {
        let mut clock = ClockSync::new();
        clock.observe(500.0, 480.0);
        assert_eq!(clock.server_now(490.0), 510.0);
    }

    #[test]
    fn explicit_remaining_wins_over_derivation() {
        let mut clock = ClockSync::new();
        clock.observe(100.0, 100.0);
        // Derivation would give 20 - 10 = 10, but the authority said 4.5.
        assert_eq!(clock.remaining(20, 90.0, Some(4.5), 100.0), 4.5);
    }

    #[test]
    fn derived_remaining_uses_authority_clock() {
        let mut clock = ClockSync::new();
        // Authority is 50 seconds ahead of the local clock.
        clock.observe(1050.0, 1000.0);
        // Question started at authority time 1050; local clock says 1005,
        // which is authority time 1055 — five seconds elapsed.
        assert_eq!(clock.remaining(20, 1050.0, None, 1005.0), 15.0);
    }

    #[test]
    fn question_at_server_time_t0_gives_full_duration() {
        let mut clock = ClockSync::new();
        let t0 = 1_700_000_000.0;
        clock.observe(t0, t0 + 2.0); // local clock two seconds ahead
        assert_eq!(clock.time_left(20, t0, None, t0 + 2.0), 20);
    }

    #[test]
    fn status_five_seconds_later_recomputes_to_fifteen() {
        let mut clock = ClockSync::new();
        let t0 = 1_700_000_000.0;
        clock.observe(t0, t0);
        assert_eq!(clock.time_left(20, t0, None, t0), 20);
        // A status at serverTime = T0+5 with no explicit remaining.
        clock.observe(t0 + 5.0, t0 + 5.0);
        assert_eq!(clock.time_left(20, t0, None, t0 + 5.0), 15);
    }

    #[test]
    fn remaining_never_negative() {
        let clock = ClockSync::new();
        assert_eq!(clock.remaining(10, 0.0, None, 5000.0), 0.0);
        assert_eq!(clock.remaining(10, 0.0, Some(-3.0), 0.0), 0.0);
        assert_eq!(clock.time_left(10, 0.0, None, 5000.0), 0);
    }

    #[test]
    fn fractional_remaining_rounds_up_for_display() {
        let clock = ClockSync::new();
        assert_eq!(clock.time_left(10, 0.0, Some(0.2), 0.0), 1);
        assert_eq!(clock.time_left(10, 0.0, Some(9.01), 0.0), 10);
        assert_eq!(clock.time_left(10, 0.0, Some(0.0), 0.0), 0);
    }

    #[test]
    fn started_in_future_clamps_elapsed_to_zero() {
        let mut clock = ClockSync::new();
        clock.observe(100.0, 100.0);
        // startedAt slightly in the authority's future (scheduling jitter).
        assert_eq!(clock.remaining(30, 101.5, None, 100.0), 30.0);
    }
}
