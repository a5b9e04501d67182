//! Verdicts for each delivered sample

use serde::{Deserialize, Serialize};

/// What the lock trigger decided for one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SampleVerdict {
    // =========================================================================
    // V001: Discarded before evaluation
    // =========================================================================
    /// Delivered while unregistered (delivery raced with unregister)
    Unregistered,
    /// Screen locked, device not interactive, or a state query failed
    GuardDenied,

    // =========================================================================
    // V002: Evaluated
    // =========================================================================
    /// Magnitude at or below threshold
    BelowThreshold,
    /// Qualified, but unregistration was requested before the lock fired
    Revoked,

    // =========================================================================
    // V003: Dispatched
    // =========================================================================
    /// lock_now() succeeded
    Locked,
    /// lock_now() failed; logged and dropped
    LockFailed,
}

impl SampleVerdict {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unregistered => "V001_UNREGISTERED",
            Self::GuardDenied => "V001_GUARD_DENIED",
            Self::BelowThreshold => "V002_BELOW_THRESHOLD",
            Self::Revoked => "V002_REVOKED",
            Self::Locked => "V003_LOCKED",
            Self::LockFailed => "V003_LOCK_FAILED",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Unregistered => "Ignored - listener unregistered",
            Self::GuardDenied => "Ignored - screen locked or device not interactive",
            Self::BelowThreshold => "Movement below threshold",
            Self::Revoked => "Ignored - unregistered before dispatch",
            Self::Locked => "Device locked",
            Self::LockFailed => "Error while trying to lock device",
        }
    }

    /// Did this sample reach the lock action?
    pub fn dispatched(&self) -> bool {
        matches!(self, Self::Locked | Self::LockFailed)
    }
}

impl std::fmt::Display for SampleVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
