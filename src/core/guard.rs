//! Device state guard
//!
//! Locking only makes sense on an unlocked, interactive device. Query failures
//! count as "not permitted".

use std::sync::Arc;
use tracing::warn;

use crate::core::capabilities::{PowerState, ScreenState};

#[derive(Clone)]
pub struct DeviceStateGuard {
    screen: Arc<dyn ScreenState>,
    power: Arc<dyn PowerState>,
}

impl DeviceStateGuard {
    pub fn new(screen: Arc<dyn ScreenState>, power: Arc<dyn PowerState>) -> Self {
        Self { screen, power }
    }

    /// True iff the screen is not locked and the device is interactive
    pub fn permits_action(&self) -> bool {
        let locked = match self.screen.is_locked() {
            Ok(locked) => locked,
            Err(e) => {
                warn!(error = %e, "screen lock query failed, ignoring gesture");
                return false;
            }
        };
        if locked {
            return false;
        }
        match self.power.is_interactive() {
            Ok(interactive) => interactive,
            Err(e) => {
                warn!(error = %e, "interactive query failed, ignoring gesture");
                false
            }
        }
    }
}

impl std::fmt::Debug for DeviceStateGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceStateGuard").finish_non_exhaustive()
    }
}
