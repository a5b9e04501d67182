//! Configuration for motionlock
//!
//! Read once at startup. Nothing here is a live setting.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::types::ConfigError;
use crate::{DEFAULT_THRESHOLD, DISABLED_WHEN_ABSENT, SETTING_GESTURE_DISABLED};

/// Static configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionLockConfig {
    /// Build-time feature flag. When false the subsystem never starts.
    pub feature_enabled: bool,

    /// Magnitude a sample must exceed to trigger a lock
    pub threshold: f64,

    /// Settings key of the per-user "gesture disabled" flag
    pub setting_key: String,

    /// Value of the per-user flag when the store has no entry
    pub disabled_by_default: bool,

    /// Default log filter for the binary
    pub log_level: String,
}

impl Default for MotionLockConfig {
    fn default() -> Self {
        Self {
            feature_enabled: true,
            threshold: DEFAULT_THRESHOLD,
            setting_key: SETTING_GESTURE_DISABLED.to_string(),
            disabled_by_default: DISABLED_WHEN_ABSENT,
            log_level: "info".to_string(),
        }
    }
}

impl MotionLockConfig {
    /// Load from a TOML file, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                Self::from_toml(&text)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }
}
