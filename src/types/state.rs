//! Registration state definitions

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Whether the lock trigger is currently subscribed to sample delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationState {
    /// No sample delivery
    #[default]
    Unregistered,
    /// Subscribed to the motion sensor
    Registered,
}

impl RegistrationState {
    pub fn is_registered(&self) -> bool {
        matches!(self, RegistrationState::Registered)
    }

    /// Snapshot of a shared registration flag
    pub fn from_flag(flag: &Arc<AtomicBool>) -> Self {
        if flag.load(Ordering::Acquire) {
            RegistrationState::Registered
        } else {
            RegistrationState::Unregistered
        }
    }

    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            RegistrationState::Unregistered => "\x1b[90m", // Gray
            RegistrationState::Registered => "\x1b[32m",   // Green
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }

    /// Get emoji for state
    pub fn emoji(&self) -> &'static str {
        match self {
            RegistrationState::Unregistered => "💤",
            RegistrationState::Registered => "📡",
        }
    }
}

impl std::fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RegistrationState::Unregistered => "UNREGISTERED",
            RegistrationState::Registered => "REGISTERED",
        };
        write!(f, "{}", name)
    }
}
