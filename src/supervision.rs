use std::time::{Duration, SystemTime};

/// Rolling counter of failures within a window, owned by a child's
/// context and consulted by its parent's strategy (spec §4.4).
#[derive(Debug, Clone, Default)]
pub struct RestartStatistics {
    pub failure_count: u32,
    pub last_failure: Option<SystemTime>,
}

impl RestartStatistics {
    /// Record a failure, resetting the count first if `window` has
    /// elapsed since the last one.
    pub fn fail_within(&mut self, window: Duration) -> u32 {
        let now = SystemTime::now();
        let stale = match self.last_failure {
            Some(last) => now.duration_since(last).map(|d| d > window).unwrap_or(true),
            None => false,
        };
        if stale {
            self.failure_count = 0;
        }
        self.failure_count += 1;
        self.last_failure = Some(now);
        self.failure_count
    }

    pub fn reset(&mut self) {
        self.failure_count = 0;
        self.last_failure = None;
    }
}

/// What a supervisor decides to do about a failed child (spec §4.4,
/// GLOSSARY "Supervisor directive").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Resume,
    Restart,
    Stop,
    Escalate,
}

/// The four supervisor strategies spec.md §4.4 requires be providable.
#[derive(Debug, Clone)]
pub enum Strategy {
    OneForOne {
        max_retries: u32,
        within: Duration,
        directive: Directive,
    },
    AllForOne {
        max_retries: u32,
        within: Duration,
        directive: Directive,
    },
    ExponentialBackoff {
        min_backoff: Duration,
        max_backoff: Duration,
        reset_after: Duration,
    },
    AlwaysRestart,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::AlwaysRestart
    }
}

impl Strategy {
    /// Whether this directive targets every sibling, not only the
    /// failing child (spec §4.4 AllForOne).
    pub fn is_all_for_one(&self) -> bool {
        matches!(self, Strategy::AllForOne { .. })
    }

    /// Decide the directive for a child that just failed, given its
    /// updated restart statistics.
    pub fn decide(&self, stats: &RestartStatistics) -> Directive {
        match self {
            Strategy::OneForOne {
                max_retries,
                directive,
                ..
            }
            | Strategy::AllForOne {
                max_retries,
                directive,
                ..
            } => {
                if stats.failure_count > *max_retries {
                    Directive::Escalate
                } else {
                    *directive
                }
            }
            Strategy::ExponentialBackoff { .. } => Directive::Restart,
            Strategy::AlwaysRestart => Directive::Restart,
        }
    }

    /// Backoff delay to apply before resuming a restarted child, `None`
    /// for strategies without one.
    pub fn backoff_for(&self, stats: &RestartStatistics) -> Option<Duration> {
        match self {
            Strategy::ExponentialBackoff {
                min_backoff,
                max_backoff,
                ..
            } => {
                let exp = stats.failure_count.saturating_sub(1).min(30);
                let scaled = min_backoff.as_millis().saturating_mul(1u128 << exp);
                let capped = scaled.min(max_backoff.as_millis());
                let jitter_pct = 0.9 + (rand::random::<f64>() * 0.2); // +/-10%
                let jittered = (capped as f64 * jitter_pct) as u64;
                Some(Duration::from_millis(jittered))
            }
            _ => None,
        }
    }
}
