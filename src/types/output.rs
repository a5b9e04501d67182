//! Output structures for terminal display

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::types::{RegistrationState, SampleVerdict, UserId};

/// Published for every sample the trigger handles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerdictRecord {
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Sample magnitude
    pub magnitude: f64,
    /// Decision
    pub verdict: SampleVerdict,
}

impl VerdictRecord {
    pub fn new(magnitude: f64, verdict: SampleVerdict) -> Self {
        Self {
            timestamp: Utc::now(),
            magnitude,
            verdict,
        }
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!("magnitude={:.3} | verdict={}", self.magnitude, self.verdict.code())
    }
}

/// Counters kept by the lock trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TriggerStats {
    pub samples_seen: u64,
    pub locks_invoked: u64,
    pub lock_failures: u64,
}

/// Snapshot of the service after an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusOutput {
    pub timestamp: DateTime<Utc>,
    pub state: RegistrationState,
    pub active_user: Option<UserId>,
    pub stats: TriggerStats,
}

impl StatusOutput {
    pub fn new(state: RegistrationState, active_user: Option<UserId>, stats: TriggerStats) -> Self {
        Self {
            timestamp: Utc::now(),
            state,
            active_user,
            stats,
        }
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let color = self.state.color_code();
        let reset = RegistrationState::color_reset();
        format!(
            "{}{} state={} | user={} | samples={} | locks={}{}",
            color,
            self.state.emoji(),
            self.state,
            self.user_label(),
            self.stats.samples_seen,
            self.stats.locks_invoked,
            reset
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "state={} | user={} | samples={} | locks={} | lock_failures={}",
            self.state,
            self.user_label(),
            self.stats.samples_seen,
            self.stats.locks_invoked,
            self.stats.lock_failures
        )
    }

    fn user_label(&self) -> String {
        self.active_user
            .map(|u| u.to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

/// JSON status line when the feature flag kept the service from starting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisabledOutput {
    pub feature_enabled: bool,
    pub status: StatusOutput,
}

impl Default for DisabledOutput {
    fn default() -> Self {
        Self {
            feature_enabled: false,
            status: StatusOutput::new(RegistrationState::Unregistered, None, TriggerStats::default()),
        }
    }
}
