//! In-memory device implementing every collaborator
//!
//! Drives the CLI and the tests. Callbacks are always invoked with the
//! internal lock released.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::core::capabilities::{
    LockAction, MotionSensor, PowerState, SampleCallback, ScreenState, SettingsStore, UserCallback,
    UserSessionSource,
};
use crate::types::{CapabilityError, ListenerHandle, Sample, SensorHandle, UserId, WatchHandle};
use crate::SETTING_GESTURE_DISABLED;

/// Call counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DeviceCounters {
    pub subscribes: u64,
    pub unsubscribes: u64,
    pub watches: u64,
    pub unwatches: u64,
    /// lock_now() calls, failed ones included
    pub locks: u64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Failures {
    subscribe: bool,
    screen: bool,
    power: bool,
    lock: bool,
}

struct Watch {
    key: String,
    user_id: UserId,
    on_change: UserCallback,
}

struct Inner {
    sensor: Option<SensorHandle>,
    subscribers: Vec<(SensorHandle, SampleCallback)>,
    settings: HashMap<(String, UserId), bool>,
    watches: HashMap<WatchHandle, Watch>,
    next_watch: u64,
    current_user: UserId,
    user_listeners: Vec<(ListenerHandle, UserCallback)>,
    next_listener: u64,
    screen_locked: bool,
    interactive: bool,
    failures: Failures,
    counters: DeviceCounters,
}

/// Simulated handset: one accelerometer, a settings store, a screen
pub struct SimulatedDevice {
    inner: Mutex<Inner>,
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new(crate::DEFAULT_USER)
    }
}

impl SimulatedDevice {
    /// Unlocked, interactive device with `user` in the foreground
    pub fn new(user: UserId) -> Self {
        Self {
            inner: Mutex::new(Inner {
                sensor: Some(SensorHandle::new(1, "linear_acceleration")),
                subscribers: Vec::new(),
                settings: HashMap::new(),
                watches: HashMap::new(),
                next_watch: 1,
                current_user: user,
                user_listeners: Vec::new(),
                next_listener: 1,
                screen_locked: false,
                interactive: true,
                failures: Failures::default(),
                counters: DeviceCounters::default(),
            }),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // =========================================================================
    // Driving the device
    // =========================================================================

    /// Deliver a sample to every subscriber. Returns how many received it.
    pub fn deliver(&self, sample: Sample) -> usize {
        let callbacks: Vec<SampleCallback> = self
            .inner()
            .subscribers
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();
        for cb in &callbacks {
            cb(sample);
        }
        callbacks.len()
    }

    /// Write a per-user setting and notify matching watches
    pub fn set_user_setting(&self, key: &str, user_id: UserId, value: bool) {
        let listeners: Vec<UserCallback> = {
            let mut inner = self.inner();
            inner.settings.insert((key.to_string(), user_id), value);
            inner
                .watches
                .values()
                .filter(|w| w.key == key && w.user_id == user_id)
                .map(|w| w.on_change.clone())
                .collect()
        };
        for cb in &listeners {
            cb(user_id);
        }
    }

    /// Shorthand for the gesture-disabled flag
    pub fn set_gesture_disabled(&self, user_id: UserId, disabled: bool) {
        self.set_user_setting(SETTING_GESTURE_DISABLED, user_id, disabled);
    }

    /// Change the foreground user and broadcast the switch
    pub fn switch_user(&self, user_id: UserId) {
        let listeners: Vec<UserCallback> = {
            let mut inner = self.inner();
            inner.current_user = user_id;
            inner.user_listeners.iter().map(|(_, cb)| cb.clone()).collect()
        };
        for cb in &listeners {
            cb(user_id);
        }
    }

    pub fn set_screen_locked(&self, locked: bool) {
        self.inner().screen_locked = locked;
    }

    pub fn set_interactive(&self, interactive: bool) {
        self.inner().interactive = interactive;
    }

    pub fn remove_sensor(&self) {
        self.inner().sensor = None;
    }

    pub fn restore_sensor(&self) {
        self.inner().sensor = Some(SensorHandle::new(1, "linear_acceleration"));
    }

    // =========================================================================
    // Failure injection
    // =========================================================================

    pub fn fail_subscribe(&self, fail: bool) {
        self.inner().failures.subscribe = fail;
    }

    pub fn fail_screen(&self, fail: bool) {
        self.inner().failures.screen = fail;
    }

    pub fn fail_power(&self, fail: bool) {
        self.inner().failures.power = fail;
    }

    pub fn fail_lock(&self, fail: bool) {
        self.inner().failures.lock = fail;
    }

    /// Clear all injected failures and restore the sensor
    pub fn heal(&self) {
        let mut inner = self.inner();
        inner.failures = Failures::default();
        if inner.sensor.is_none() {
            inner.sensor = Some(SensorHandle::new(1, "linear_acceleration"));
        }
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn counters(&self) -> DeviceCounters {
        self.inner().counters
    }

    pub fn screen_locked(&self) -> bool {
        self.inner().screen_locked
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner().subscribers.len()
    }

    /// (key, user) of every live watch, sorted by user
    pub fn active_watches(&self) -> Vec<(String, UserId)> {
        let mut watches: Vec<(String, UserId)> = self
            .inner()
            .watches
            .values()
            .map(|w| (w.key.clone(), w.user_id))
            .collect();
        watches.sort_by_key(|(_, user)| *user);
        watches
    }

    pub fn user_listener_count(&self) -> usize {
        self.inner().user_listeners.len()
    }
}

impl MotionSensor for SimulatedDevice {
    fn try_acquire(&self) -> Option<SensorHandle> {
        self.inner().sensor.clone()
    }

    fn subscribe(&self, handle: &SensorHandle, callback: SampleCallback) -> Result<(), CapabilityError> {
        let mut inner = self.inner();
        if inner.failures.subscribe {
            return Err(CapabilityError::Rejected("sensor service".to_string()));
        }
        inner.subscribers.push((handle.clone(), callback));
        inner.counters.subscribes += 1;
        Ok(())
    }

    fn unsubscribe(&self, handle: &SensorHandle) {
        let mut inner = self.inner();
        inner.subscribers.retain(|(h, _)| h != handle);
        inner.counters.unsubscribes += 1;
    }
}

impl SettingsStore for SimulatedDevice {
    fn read_bool(&self, key: &str, user_id: UserId, default: bool) -> bool {
        self.inner()
            .settings
            .get(&(key.to_string(), user_id))
            .copied()
            .unwrap_or(default)
    }

    fn watch(&self, key: &str, user_id: UserId, on_change: UserCallback) -> WatchHandle {
        let mut inner = self.inner();
        let handle = WatchHandle(inner.next_watch);
        inner.next_watch += 1;
        inner.watches.insert(
            handle,
            Watch {
                key: key.to_string(),
                user_id,
                on_change,
            },
        );
        inner.counters.watches += 1;
        handle
    }

    fn unwatch(&self, handle: WatchHandle) {
        let mut inner = self.inner();
        if inner.watches.remove(&handle).is_some() {
            inner.counters.unwatches += 1;
        }
    }
}

impl UserSessionSource for SimulatedDevice {
    fn current_user(&self) -> UserId {
        self.inner().current_user
    }

    fn on_user_switch(&self, callback: UserCallback) -> ListenerHandle {
        let mut inner = self.inner();
        let handle = ListenerHandle(inner.next_listener);
        inner.next_listener += 1;
        inner.user_listeners.push((handle, callback));
        handle
    }

    fn remove_user_switch_listener(&self, handle: ListenerHandle) {
        self.inner().user_listeners.retain(|(h, _)| *h != handle);
    }
}

impl ScreenState for SimulatedDevice {
    fn is_locked(&self) -> Result<bool, CapabilityError> {
        let inner = self.inner();
        if inner.failures.screen {
            return Err(CapabilityError::Unreachable("window manager".to_string()));
        }
        Ok(inner.screen_locked)
    }
}

impl PowerState for SimulatedDevice {
    fn is_interactive(&self) -> Result<bool, CapabilityError> {
        let inner = self.inner();
        if inner.failures.power {
            return Err(CapabilityError::Unreachable("power manager".to_string()));
        }
        Ok(inner.interactive)
    }
}

impl LockAction for SimulatedDevice {
    /// A successful lock leaves the screen locked
    fn lock_now(&self) -> Result<(), CapabilityError> {
        let mut inner = self.inner();
        inner.counters.locks += 1;
        if inner.failures.lock {
            return Err(CapabilityError::Unreachable("window manager".to_string()));
        }
        inner.screen_locked = true;
        Ok(())
    }
}
