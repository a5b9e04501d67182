//! Identifiers handed out by external collaborators

use serde::{Deserialize, Serialize};

/// Foreground user session identifier
pub type UserId = i32;

/// An acquired motion sensor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorHandle {
    pub id: u32,
    pub name: String,
}

impl SensorHandle {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

impl std::fmt::Display for SensorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.name, self.id)
    }
}

/// A live settings watch, returned by `SettingsStore::watch`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WatchHandle(pub u64);

/// A live user-switch listener, returned by `UserSessionSource::on_user_switch`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerHandle(pub u64);
