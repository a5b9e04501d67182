//! motionlock: movement based lock gesture
//!
//! Sensor → LockTrigger → DeviceStateGuard → ThresholdEvaluator → lock action.
//! Settings / user switch → SettingsBinding → RegistrationController → sensor.

pub mod config;
pub mod core;
pub mod types;

// =============================================================================
// POLICY DEFAULTS
// =============================================================================

/// Magnitude (m/s²) a linear acceleration sample must exceed to lock the device.
/// Strictly greater: a sample exactly at the threshold does not qualify.
pub const DEFAULT_THRESHOLD: f64 = 40.0;

/// Per-user settings key holding the "gesture disabled" flag
pub const SETTING_GESTURE_DISABLED: &str = "movement_based_lock_gesture_disabled";

/// Value assumed for the per-user setting when the store has no entry.
/// The gesture stays off until a user opts in.
pub const DISABLED_WHEN_ABSENT: bool = true;

/// User the simulator starts with when none is given
pub const DEFAULT_USER: i32 = 0;

/// Capacity of the verdict broadcast channel
pub const VERDICT_CHANNEL_CAPACITY: usize = 100;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
