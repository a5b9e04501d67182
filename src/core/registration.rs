//! Registration controller: the only path that subscribes or unsubscribes
//! the lock trigger.
//!
//! State transitions:
//! - UNREGISTERED → REGISTERED: register() with a sensor available and subscribe accepted
//! - REGISTERED → UNREGISTERED: unregister()
//! - any other call is a no-op
//!
//! Methods take `&mut self`, so whoever owns the controller serializes every
//! transition. The registered flag is shared with the trigger for lock-free
//! reads on the delivery path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::capabilities::MotionSensor;
use crate::core::trigger::LockTrigger;
use crate::types::{RegistrationError, RegistrationState, SensorHandle};

pub struct RegistrationController {
    sensor: Arc<dyn MotionSensor>,
    trigger: Arc<LockTrigger>,
    /// true iff `handle` is Some
    registered: Arc<AtomicBool>,
    /// Sensor the trigger is currently subscribed to
    handle: Option<SensorHandle>,
    /// Number of state changes
    transition_count: u64,
}

impl RegistrationController {
    /// `registered` must be the flag the trigger was built with
    pub fn new(sensor: Arc<dyn MotionSensor>, trigger: Arc<LockTrigger>, registered: Arc<AtomicBool>) -> Self {
        registered.store(false, Ordering::Release);
        Self {
            sensor,
            trigger,
            registered,
            handle: None,
            transition_count: 0,
        }
    }

    /// Subscribe the trigger to sample delivery. No-op when already registered.
    pub fn register(&mut self) -> Result<(), RegistrationError> {
        if self.handle.is_some() {
            return Ok(());
        }

        let handle = match self.sensor.try_acquire() {
            Some(handle) => handle,
            None => {
                warn!("no linear acceleration sensor, movement based lock stays unregistered");
                return Err(RegistrationError::SensorUnavailable);
            }
        };

        if let Err(e) = self.sensor.subscribe(&handle, self.trigger.callback()) {
            warn!(sensor = %handle, error = %e, "linear acceleration sensor registration failed");
            return Err(e.into());
        }

        self.handle = Some(handle);
        self.registered.store(true, Ordering::Release);
        self.transition_count += 1;
        info!("linear acceleration sensor registered");
        Ok(())
    }

    /// Stop sample delivery. No-op when already unregistered.
    /// Returns whether a transition happened.
    pub fn unregister(&mut self) -> bool {
        let Some(handle) = self.handle.take() else {
            return false;
        };

        // Cleared before unsubscribing so in-flight samples are discarded
        self.registered.store(false, Ordering::Release);
        self.sensor.unsubscribe(&handle);
        self.transition_count += 1;
        info!(sensor = %handle, "linear acceleration sensor unregistered");
        true
    }

    /// Drive toward the desired state
    pub fn apply(&mut self, desired: RegistrationState) -> Result<(), RegistrationError> {
        debug!(%desired, current = %self.state(), "applying registration");
        match desired {
            RegistrationState::Registered => self.register(),
            RegistrationState::Unregistered => {
                self.unregister();
                Ok(())
            }
        }
    }

    /// Get current state
    pub fn state(&self) -> RegistrationState {
        RegistrationState::from_flag(&self.registered)
    }

    /// Shared flag read by the trigger
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.registered)
    }

    pub fn trigger(&self) -> &Arc<LockTrigger> {
        &self.trigger
    }

    /// Get transition count
    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }
}

impl std::fmt::Debug for RegistrationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationController")
            .field("state", &self.state())
            .field("handle", &self.handle)
            .field("transition_count", &self.transition_count)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// TESTS
// =============================================================================
