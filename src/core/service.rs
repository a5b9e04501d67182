//! Movement lock service
//!
//! One tokio task owns the `SettingsBinding` (and through it the
//! `RegistrationController`). Settings watches and user switches only enqueue
//! `ControlEvent`s, so every registration change happens on that task in
//! arrival order. Sample delivery never touches the task: it reads the shared
//! registered flag.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::MotionLockConfig;
use crate::core::binding::SettingsBinding;
use crate::core::capabilities::{Collaborators, FeatureFlag, UserCallback};
use crate::core::guard::DeviceStateGuard;
use crate::core::registration::RegistrationController;
use crate::core::threshold::ThresholdEvaluator;
use crate::core::trigger::LockTrigger;
use crate::types::{RegistrationState, StatusOutput, TriggerStats, UserId, VerdictRecord};
use crate::VERDICT_CHANNEL_CAPACITY;

/// Messages processed by the reconciliation task
#[derive(Debug)]
pub enum ControlEvent {
    UserSwitched(UserId),
    SettingChanged(UserId),
    /// Acknowledged once every earlier event has been handled
    Settle(oneshot::Sender<()>),
    /// Unwatch, unregister, stop the task
    Shutdown(oneshot::Sender<()>),
}

/// Result of starting the service
#[derive(Debug)]
pub enum Startup {
    /// Feature flag off: nothing was registered or watched, ever
    Disabled,
    Running(ServiceHandle),
}

impl Startup {
    pub fn handle(&self) -> Option<&ServiceHandle> {
        match self {
            Startup::Disabled => None,
            Startup::Running(handle) => Some(handle),
        }
    }

    pub fn into_handle(self) -> Option<ServiceHandle> {
        match self {
            Startup::Disabled => None,
            Startup::Running(handle) => Some(handle),
        }
    }
}

pub struct MovementLockService;

impl MovementLockService {
    /// Start the subsystem. Must be called from within a tokio runtime.
    pub fn start(config: &MotionLockConfig, deps: Collaborators) -> Startup {
        let (tx, rx) = mpsc::unbounded_channel();
        let (verdict_tx, _) = broadcast::channel(VERDICT_CHANNEL_CAPACITY);

        let registered = Arc::new(AtomicBool::new(false));
        let trigger = Arc::new(
            LockTrigger::new(
                Arc::clone(&registered),
                DeviceStateGuard::new(deps.screen.clone(), deps.power.clone()),
                ThresholdEvaluator::new(config.threshold),
                deps.lock.clone(),
            )
            .with_verdicts(verdict_tx.clone()),
        );
        let controller =
            RegistrationController::new(deps.sensor.clone(), Arc::clone(&trigger), Arc::clone(&registered));

        let mut binding = SettingsBinding::new(
            config,
            deps.settings.clone(),
            deps.users.clone(),
            controller,
            forward(&tx, ControlEvent::SettingChanged),
        );

        if !config.feature_enabled.is_enabled() {
            binding.on_startup(&false);
            return Startup::Disabled;
        }

        // Listen before the first current_user() read; a switch racing
        // startup is queued behind the initial bind and applied in order
        binding.listen_for_switches(forward(&tx, ControlEvent::UserSwitched));
        binding.on_startup(&true);

        let (user_tx, user_rx) = watch::channel(binding.active_user());
        info!(
            threshold = config.threshold,
            user = ?binding.active_user(),
            state = %binding.state(),
            "movement based lock service started"
        );
        let task = tokio::spawn(run_loop(binding, rx, user_tx));

        Startup::Running(ServiceHandle {
            tx,
            registered,
            active_user: user_rx,
            trigger,
            verdict_tx,
            task,
        })
    }
}

/// Callbacks hold a weak sender: the handle owns the only strong one, so
/// dropping it closes the queue and the loop shuts the binding down.
fn forward(tx: &mpsc::UnboundedSender<ControlEvent>, event: fn(UserId) -> ControlEvent) -> UserCallback {
    let tx = tx.downgrade();
    Arc::new(move |user| {
        if let Some(tx) = tx.upgrade() {
            let _ = tx.send(event(user));
        }
    })
}

async fn run_loop(
    mut binding: SettingsBinding,
    mut rx: mpsc::UnboundedReceiver<ControlEvent>,
    user_tx: watch::Sender<Option<UserId>>,
) {
    while let Some(event) = rx.recv().await {
        match event {
            ControlEvent::UserSwitched(user) => {
                binding.on_user_switch(user);
                user_tx.send_replace(binding.active_user());
            }
            ControlEvent::SettingChanged(user) => {
                binding.on_setting_changed(user);
            }
            ControlEvent::Settle(ack) => {
                let _ = ack.send(());
            }
            ControlEvent::Shutdown(ack) => {
                binding.shutdown();
                let _ = ack.send(());
                debug!("movement based lock service stopped");
                return;
            }
        }
    }
    binding.shutdown();
    debug!("service handle dropped, movement based lock service stopped");
}

/// Handle to a running service
#[derive(Debug)]
pub struct ServiceHandle {
    tx: mpsc::UnboundedSender<ControlEvent>,
    registered: Arc<AtomicBool>,
    active_user: watch::Receiver<Option<UserId>>,
    trigger: Arc<LockTrigger>,
    verdict_tx: broadcast::Sender<VerdictRecord>,
    task: JoinHandle<()>,
}

impl ServiceHandle {
    /// For hosts that receive user switches themselves
    pub fn notify_user_switched(&self, user: UserId) {
        let _ = self.tx.send(ControlEvent::UserSwitched(user));
    }

    /// For hosts that receive setting changes themselves
    pub fn notify_setting_changed(&self, user: UserId) {
        let _ = self.tx.send(ControlEvent::SettingChanged(user));
    }

    /// Wait until every event queued so far has been processed.
    /// False if the service has stopped.
    pub async fn settle(&self) -> bool {
        let (ack, done) = oneshot::channel();
        if self.tx.send(ControlEvent::Settle(ack)).is_err() {
            return false;
        }
        done.await.is_ok()
    }

    /// Lock-free snapshot
    pub fn registration(&self) -> RegistrationState {
        RegistrationState::from_flag(&self.registered)
    }

    pub fn active_user(&self) -> Option<UserId> {
        *self.active_user.borrow()
    }

    pub fn stats(&self) -> TriggerStats {
        self.trigger.stats()
    }

    pub fn threshold(&self) -> f64 {
        self.trigger.threshold()
    }

    pub fn status(&self) -> StatusOutput {
        StatusOutput::new(self.registration(), self.active_user(), self.stats())
    }

    pub fn subscribe_verdicts(&self) -> broadcast::Receiver<VerdictRecord> {
        self.verdict_tx.subscribe()
    }

    /// Unwatch settings, unregister, and stop the task. Dropping the handle
    /// does the same without waiting.
    pub async fn shutdown(self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(ControlEvent::Shutdown(ack)).is_ok() {
            let _ = done.await;
        }
        let _ = self.task.await;
    }
}
