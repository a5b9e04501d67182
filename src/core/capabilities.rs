//! External collaborators
//!
//! Everything the subsystem needs from the platform is injected through these
//! traits. `SimulatedDevice` implements all of them for tests and the CLI.

use std::sync::Arc;

use crate::types::{CapabilityError, ListenerHandle, Sample, SensorHandle, UserId, WatchHandle};

/// Callback receiving delivered samples
pub type SampleCallback = Arc<dyn Fn(Sample) + Send + Sync>;

/// Callback receiving a user id (setting change or user switch)
pub type UserCallback = Arc<dyn Fn(UserId) + Send + Sync>;

/// Linear acceleration sensor
pub trait MotionSensor: Send + Sync {
    /// None when the device has no such sensor
    fn try_acquire(&self) -> Option<SensorHandle>;
    fn subscribe(&self, handle: &SensorHandle, callback: SampleCallback) -> Result<(), CapabilityError>;
    fn unsubscribe(&self, handle: &SensorHandle);
}

/// Per-user settings store with change notifications
pub trait SettingsStore: Send + Sync {
    /// Returns `default` when the key is absent for this user
    fn read_bool(&self, key: &str, user_id: UserId, default: bool) -> bool;
    /// Notifies `on_change` with the user id whose value changed
    fn watch(&self, key: &str, user_id: UserId, on_change: UserCallback) -> WatchHandle;
    fn unwatch(&self, handle: WatchHandle);
}

/// Foreground user session
pub trait UserSessionSource: Send + Sync {
    fn current_user(&self) -> UserId;
    /// Register for user-switch notifications carrying the new user id
    fn on_user_switch(&self, callback: UserCallback) -> ListenerHandle;
    fn remove_user_switch_listener(&self, handle: ListenerHandle);
}

pub trait ScreenState: Send + Sync {
    fn is_locked(&self) -> Result<bool, CapabilityError>;
}

pub trait PowerState: Send + Sync {
    fn is_interactive(&self) -> Result<bool, CapabilityError>;
}

pub trait LockAction: Send + Sync {
    fn lock_now(&self) -> Result<(), CapabilityError>;
}

/// Static feature switch, read once at startup
pub trait FeatureFlag: Send + Sync {
    fn is_enabled(&self) -> bool;
}

impl FeatureFlag for bool {
    fn is_enabled(&self) -> bool {
        *self
    }
}

/// All collaborators, injected at construction
#[derive(Clone)]
pub struct Collaborators {
    pub sensor: Arc<dyn MotionSensor>,
    pub settings: Arc<dyn SettingsStore>,
    pub users: Arc<dyn UserSessionSource>,
    pub screen: Arc<dyn ScreenState>,
    pub power: Arc<dyn PowerState>,
    pub lock: Arc<dyn LockAction>,
}

impl Collaborators {
    /// Wire every collaborator to the same implementation
    pub fn from_device<D>(device: Arc<D>) -> Self
    where
        D: MotionSensor + SettingsStore + UserSessionSource + ScreenState + PowerState + LockAction + 'static,
    {
        Self {
            sensor: device.clone(),
            settings: device.clone(),
            users: device.clone(),
            screen: device.clone(),
            power: device.clone(),
            lock: device,
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
