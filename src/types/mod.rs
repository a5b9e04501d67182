//! Core types for motionlock

mod state;
mod sample;
mod handles;
mod verdict;
mod output;
mod error;

pub use state::RegistrationState;
pub use sample::Sample;
pub use handles::{UserId, SensorHandle, WatchHandle, ListenerHandle};
pub use verdict::SampleVerdict;
pub use output::{VerdictRecord, StatusOutput, TriggerStats, DisabledOutput};
pub use error::{CapabilityError, RegistrationError, ConfigError, ScriptError};
