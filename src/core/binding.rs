//! Settings binding: keeps the registration state equal to
//! `feature_enabled && !gesture_disabled(active_user)`.
//!
//! The settings watch always follows the active user; notifications for any
//! other user are stale and dropped.

use std::sync::Arc;
use tracing::{debug, info, trace};

use crate::config::MotionLockConfig;
use crate::core::capabilities::{FeatureFlag, SettingsStore, UserCallback, UserSessionSource};
use crate::core::registration::RegistrationController;
use crate::types::{ListenerHandle, RegistrationState, UserId, WatchHandle};

/// Desired state for a feature flag and a user's "disabled" setting
pub fn desired_registration(feature_enabled: bool, gesture_disabled: bool) -> RegistrationState {
    if feature_enabled && !gesture_disabled {
        RegistrationState::Registered
    } else {
        RegistrationState::Unregistered
    }
}

pub struct SettingsBinding {
    settings: Arc<dyn SettingsStore>,
    users: Arc<dyn UserSessionSource>,
    controller: RegistrationController,
    setting_key: String,
    disabled_by_default: bool,
    /// Handed to every settings watch
    on_change: UserCallback,
    /// Set once by on_startup; None until then
    feature_enabled: Option<bool>,
    active_user: Option<UserId>,
    watch: Option<WatchHandle>,
    switch_listener: Option<ListenerHandle>,
}

impl SettingsBinding {
    pub fn new(
        config: &MotionLockConfig,
        settings: Arc<dyn SettingsStore>,
        users: Arc<dyn UserSessionSource>,
        controller: RegistrationController,
        on_change: UserCallback,
    ) -> Self {
        Self {
            settings,
            users,
            controller,
            setting_key: config.setting_key.clone(),
            disabled_by_default: config.disabled_by_default,
            on_change,
            feature_enabled: None,
            active_user: None,
            watch: None,
            switch_listener: None,
        }
    }

    /// Subscribe `callback` to user switches until `shutdown`. Call before
    /// `on_startup` so a switch racing the first read is still delivered.
    pub fn listen_for_switches(&mut self, callback: UserCallback) {
        if let Some(old) = self.switch_listener.replace(self.users.on_user_switch(callback)) {
            self.users.remove_user_switch_listener(old);
        }
    }

    /// Read the feature flag once. When it is off nothing else ever happens:
    /// no watch, no sensor, and every later event is ignored.
    pub fn on_startup(&mut self, feature: &dyn FeatureFlag) -> bool {
        if self.feature_enabled.is_some() {
            return self.is_active();
        }
        let enabled = feature.is_enabled();
        self.feature_enabled = Some(enabled);
        if !enabled {
            debug!("movement based lock is disabled by configuration");
            return false;
        }

        let user = self.users.current_user();
        self.bind(user);
        self.reconcile();
        true
    }

    /// Rebind the watch to the new user, then reconcile
    pub fn on_user_switch(&mut self, new_user: UserId) {
        if !self.is_active() {
            return;
        }
        info!(user = new_user, "user switched");
        self.bind(new_user);
        self.reconcile();
    }

    /// Returns whether the notification was acted on
    pub fn on_setting_changed(&mut self, user_id: UserId) -> bool {
        if !self.is_active() || self.active_user != Some(user_id) {
            trace!(user = user_id, active = ?self.active_user, "ignoring stale setting notification");
            return false;
        }
        self.reconcile();
        true
    }

    /// Converge the registration state to the desired one
    pub fn reconcile(&mut self) -> RegistrationState {
        let (Some(feature_enabled), Some(user)) = (self.feature_enabled, self.active_user) else {
            return self.controller.state();
        };
        let disabled = self
            .settings
            .read_bool(&self.setting_key, user, self.disabled_by_default);
        let desired = desired_registration(feature_enabled, disabled);
        debug!(user, disabled, %desired, "reconciling movement based lock");

        // Failures are logged by the controller; the next event retries
        let _ = self.controller.apply(desired);
        self.controller.state()
    }

    /// Drop the watch and the switch listener, stop sample delivery
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.switch_listener.take() {
            self.users.remove_user_switch_listener(handle);
        }
        if let Some(handle) = self.watch.take() {
            self.settings.unwatch(handle);
        }
        self.controller.unregister();
    }

    fn bind(&mut self, user: UserId) {
        if let Some(handle) = self.watch.take() {
            self.settings.unwatch(handle);
        }
        self.active_user = Some(user);
        self.watch = Some(
            self.settings
                .watch(&self.setting_key, user, Arc::clone(&self.on_change)),
        );
    }

    fn is_active(&self) -> bool {
        self.feature_enabled == Some(true)
    }

    pub fn active_user(&self) -> Option<UserId> {
        self.active_user
    }

    pub fn state(&self) -> RegistrationState {
        self.controller.state()
    }

    pub fn controller(&self) -> &RegistrationController {
        &self.controller
    }
}

impl std::fmt::Debug for SettingsBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsBinding")
            .field("setting_key", &self.setting_key)
            .field("feature_enabled", &self.feature_enabled)
            .field("active_user", &self.active_user)
            .field("watch", &self.watch)
            .field("controller", &self.controller)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// TESTS
// =============================================================================
