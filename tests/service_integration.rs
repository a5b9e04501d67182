//! Integration tests for the movement lock service
//!
//! Tests end-to-end: device events → reconciliation task → registration → lock

use motionlock::config::MotionLockConfig;
use motionlock::core::{
    Collaborators, MovementLockService, ScriptParser, SimulatedDevice, Startup, UserCallback,
    UserSessionSource,
};
use motionlock::types::{ListenerHandle, RegistrationState, Sample, SampleVerdict, UserId};
use motionlock::SETTING_GESTURE_DISABLED;
use pretty_assertions::assert_eq;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex};

fn start(device: &Arc<SimulatedDevice>) -> motionlock::core::ServiceHandle {
    MovementLockService::start(&MotionLockConfig::default(), Collaborators::from_device(device.clone()))
        .into_handle()
        .expect("feature enabled")
}

/// Scenarios A through D in one session
#[tokio::test]
async fn test_end_to_end_scenarios() {
    let device = Arc::new(SimulatedDevice::new(1));
    device.set_gesture_disabled(1, false);

    // A
    let handle = start(&device);
    assert_eq!(handle.registration(), RegistrationState::Registered);

    // C
    device.deliver(Sample::new(50.0, 0.0, 0.0));
    assert_eq!(device.counters().locks, 1);

    // D: screen is now locked
    device.deliver(Sample::new(50.0, 0.0, 0.0));
    assert_eq!(device.counters().locks, 1);

    // B
    device.set_gesture_disabled(1, true);
    handle.settle().await;
    assert_eq!(handle.registration(), RegistrationState::Unregistered);

    device.set_screen_locked(false);
    device.deliver(Sample::new(50.0, 0.0, 0.0));
    assert_eq!(device.counters().locks, 1);

    handle.shutdown().await;
}

#[tokio::test]
async fn test_feature_flag_off() {
    let device = Arc::new(SimulatedDevice::new(1));
    device.set_gesture_disabled(1, false);
    let config = MotionLockConfig::from_toml("feature_enabled = false").unwrap();

    let startup = MovementLockService::start(&config, Collaborators::from_device(device.clone()));
    assert!(matches!(startup, Startup::Disabled));

    device.switch_user(2);
    device.set_gesture_disabled(2, false);
    assert_eq!(device.counters().subscribes, 0);
    assert_eq!(device.counters().watches, 0);
    assert_eq!(device.deliver(Sample::new(99.0, 0.0, 0.0)), 0);
}

#[tokio::test]
async fn test_configured_threshold() {
    let device = Arc::new(SimulatedDevice::new(1));
    device.set_gesture_disabled(1, false);
    let config = MotionLockConfig::from_toml("threshold = 12.0").unwrap();
    let handle = MovementLockService::start(&config, Collaborators::from_device(device.clone()))
        .into_handle()
        .unwrap();
    let mut verdicts = handle.subscribe_verdicts();

    device.deliver(Sample::new(12.0, 0.0, 0.0));
    device.deliver(Sample::new(12.5, 0.0, 0.0));

    assert_eq!(verdicts.try_recv().unwrap().verdict, SampleVerdict::BelowThreshold);
    assert_eq!(verdicts.try_recv().unwrap().verdict, SampleVerdict::Locked);
    handle.shutdown().await;
}

/// Stale notification through the public handle
#[tokio::test]
async fn test_stale_notification_via_handle() {
    let device = Arc::new(SimulatedDevice::new(7));
    device.set_gesture_disabled(7, false);
    let handle = start(&device);

    device.set_user_setting(motionlock::SETTING_GESTURE_DISABLED, 5, false);
    handle.notify_setting_changed(5);
    handle.settle().await;

    assert_eq!(handle.registration(), RegistrationState::Registered);
    assert_eq!(device.counters().subscribes, 1);
    assert_eq!(device.counters().unsubscribes, 0);
    handle.shutdown().await;
}

#[tokio::test]
async fn test_rapid_user_switches_converge() {
    let device = Arc::new(SimulatedDevice::new(0));
    for user in 0..10 {
        device.set_gesture_disabled(user, user % 2 == 1);
    }
    let handle = start(&device);

    for user in 0..10 {
        device.switch_user(user);
    }
    handle.settle().await;

    // Last user (9) has the gesture disabled
    assert_eq!(handle.active_user(), Some(9));
    assert_eq!(handle.registration(), RegistrationState::Unregistered);
    assert_eq!(device.subscriber_count(), 0);
    assert_eq!(
        device.active_watches(),
        vec![(SETTING_GESTURE_DISABLED.to_string(), 9)]
    );
    handle.shutdown().await;
}

/// Samples delivered from several threads while settings toggle
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_delivery_concurrent_with_reconciliation() {
    let device = Arc::new(SimulatedDevice::new(1));
    device.set_gesture_disabled(1, false);
    let handle = start(&device);

    let d = device.clone();
    let sender = std::thread::spawn(move || {
        for _ in 0..500 {
            d.set_screen_locked(false);
            d.deliver(Sample::new(45.0, 0.0, 0.0));
        }
    });

    for i in 0..50 {
        device.set_gesture_disabled(1, i % 2 == 0);
    }
    sender.join().unwrap();
    handle.settle().await;

    // Last write: i = 49 → enabled
    assert_eq!(handle.registration(), RegistrationState::Registered);
    assert_eq!(device.subscriber_count(), 1);
    assert_eq!(handle.stats().locks_invoked, device.counters().locks);
    handle.shutdown().await;
}

/// Scripted session, as replayed by the CLI
#[tokio::test]
async fn test_scripted_session() {
    let script = "\
# opt in and shake
enable 3
sample 30 30 30
# locked now, shake again
sample 30 30 30
screen unlocked
power off
sample 60 0 0
power on
fail lock
sample 60 0 0
heal
disable 3
sample 60 0 0
";
    let events = ScriptParser::new().parse_script(script).unwrap();
    let device = Arc::new(SimulatedDevice::new(3));
    let handle = start(&device);
    let mut verdicts = handle.subscribe_verdicts();

    for event in &events {
        event.apply(&device);
        handle.settle().await;
    }

    let mut seen = Vec::new();
    while let Ok(record) = verdicts.try_recv() {
        seen.push(record.verdict);
    }
    assert_eq!(
        seen,
        vec![
            SampleVerdict::Locked,
            SampleVerdict::GuardDenied,
            SampleVerdict::GuardDenied,
            SampleVerdict::LockFailed,
        ]
    );
    assert_eq!(handle.registration(), RegistrationState::Unregistered);
    handle.shutdown().await;
}

/// Session source whose first current_user() read races a switch: the read
/// returns the old user and the listeners hear the new one.
struct RacingSessions {
    current: AtomicI32,
    switch_to: UserId,
    raced: AtomicBool,
    listeners: Mutex<Vec<(ListenerHandle, UserCallback)>>,
}

impl UserSessionSource for RacingSessions {
    fn current_user(&self) -> UserId {
        let old = self.current.load(Ordering::SeqCst);
        if !self.raced.swap(true, Ordering::SeqCst) {
            self.current.store(self.switch_to, Ordering::SeqCst);
            let listeners: Vec<UserCallback> =
                self.listeners.lock().unwrap().iter().map(|(_, cb)| cb.clone()).collect();
            for cb in listeners {
                cb(self.switch_to);
            }
        }
        old
    }

    fn on_user_switch(&self, callback: UserCallback) -> ListenerHandle {
        let mut listeners = self.listeners.lock().unwrap();
        let handle = ListenerHandle(listeners.len() as u64 + 1);
        listeners.push((handle, callback));
        handle
    }

    fn remove_user_switch_listener(&self, handle: ListenerHandle) {
        self.listeners.lock().unwrap().retain(|(h, _)| *h != handle);
    }
}

/// A switch landing during startup ends with the new user bound
#[tokio::test]
async fn test_switch_during_startup_binds_new_user() {
    let device = Arc::new(SimulatedDevice::new(1));
    device.set_gesture_disabled(1, true);
    device.set_gesture_disabled(3, false);
    let sessions = Arc::new(RacingSessions {
        current: AtomicI32::new(1),
        switch_to: 3,
        raced: AtomicBool::new(false),
        listeners: Mutex::new(Vec::new()),
    });
    let mut deps = Collaborators::from_device(device.clone());
    deps.users = sessions.clone();

    let handle = MovementLockService::start(&MotionLockConfig::default(), deps)
        .into_handle()
        .unwrap();
    handle.settle().await;

    assert_eq!(sessions.current_user(), 3);
    assert_eq!(handle.active_user(), Some(3));
    assert_eq!(device.active_watches(), vec![(SETTING_GESTURE_DISABLED.to_string(), 3)]);
    assert_eq!(handle.registration(), RegistrationState::Registered);

    handle.shutdown().await;
    assert!(sessions.listeners.lock().unwrap().is_empty());
}

/// Dropping the handle without shutdown still releases the device
#[tokio::test]
async fn test_dropped_handle_unsubscribes() {
    let device = Arc::new(SimulatedDevice::new(1));
    device.set_gesture_disabled(1, false);
    let handle = start(&device);
    assert_eq!(device.subscriber_count(), 1);

    drop(handle);
    for _ in 0..100 {
        if device.subscriber_count() == 0 && device.active_watches().is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    assert_eq!(device.subscriber_count(), 0);
    assert!(device.active_watches().is_empty());
    assert_eq!(device.user_listener_count(), 0);
    device.set_screen_locked(false);
    assert_eq!(device.deliver(Sample::new(60.0, 0.0, 0.0)), 0);
}

/// The shipped demo config and script run as documented
#[tokio::test]
async fn test_demo_session() {
    let demos = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos");
    let config_path = demos.join("motionlock.toml");
    let config = MotionLockConfig::load(Some(config_path.as_path())).unwrap();
    assert_eq!(config, MotionLockConfig::default());

    let text = std::fs::read_to_string(demos.join("session.txt")).unwrap();
    let events = ScriptParser::new().parse_script(&text).unwrap();
    assert_eq!(events.len(), 13);

    let device = Arc::new(SimulatedDevice::new(0));
    let handle = MovementLockService::start(&config, Collaborators::from_device(device.clone()))
        .into_handle()
        .unwrap();
    let mut verdicts = handle.subscribe_verdicts();
    for event in &events {
        event.apply(&device);
        handle.settle().await;
    }

    let mut seen = Vec::new();
    while let Ok(record) = verdicts.try_recv() {
        seen.push(record.verdict);
    }
    assert_eq!(
        seen,
        vec![
            SampleVerdict::Locked,
            SampleVerdict::GuardDenied,
            SampleVerdict::BelowThreshold,
            SampleVerdict::LockFailed,
        ]
    );
    assert_eq!(handle.active_user(), Some(0));
    assert_eq!(handle.registration(), RegistrationState::Unregistered);
    handle.shutdown().await;
}
