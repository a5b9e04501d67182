//! Integration tests for sample evaluation
//!
//! Tests threshold and device-state guard against the simulated device

use motionlock::core::{Collaborators, DeviceStateGuard, SimulatedDevice, ThresholdEvaluator};
use motionlock::types::Sample;
use motionlock::DEFAULT_THRESHOLD;
use std::sync::Arc;

fn guard_for(device: &Arc<SimulatedDevice>) -> DeviceStateGuard {
    let deps = Collaborators::from_device(device.clone());
    DeviceStateGuard::new(deps.screen, deps.power)
}

/// Reference samples around the default threshold
#[test]
fn test_reference_samples() {
    let eval = ThresholdEvaluator::new(DEFAULT_THRESHOLD);

    assert!(!eval.evaluate(&Sample::new(30.0, 0.0, 0.0)));
    assert!(eval.evaluate(&Sample::new(30.0, 30.0, 30.0)));
    assert!(eval.evaluate(&Sample::new(0.0, 0.0, 40.0001)));
    assert!(!eval.evaluate(&Sample::new(0.0, 0.0, 40.0)));
}

/// Samples on a sphere of radius r qualify iff r > threshold, in every direction
#[test]
fn test_direction_independent() {
    let eval = ThresholdEvaluator::default();
    let directions = [
        (1.0, 0.0, 0.0),
        (0.0, -1.0, 0.0),
        (0.0, 0.0, 1.0),
        (0.6, 0.8, 0.0),
        (-0.48, 0.6, 0.64),
    ];
    for &(dx, dy, dz) in &directions {
        for &r in &[0.0, 10.0, 39.9, 40.1, 80.0] {
            let s = Sample::new(dx * r, dy * r, dz * r);
            assert_eq!(
                eval.evaluate(&s),
                s.magnitude() > DEFAULT_THRESHOLD,
                "direction ({}, {}, {}) radius {}",
                dx, dy, dz, r
            );
        }
    }
}

#[test]
fn test_zero_threshold_rejects_only_rest() {
    let eval = ThresholdEvaluator::new(0.0);
    assert!(!eval.evaluate(&Sample::default()));
    assert!(eval.evaluate(&Sample::new(0.0, 0.0, 1e-9)));
}

#[test]
fn test_guard_follows_device_state() {
    let device = Arc::new(SimulatedDevice::new(0));
    let guard = guard_for(&device);
    assert!(guard.permits_action());

    device.set_screen_locked(true);
    assert!(!guard.permits_action());

    device.set_screen_locked(false);
    device.set_interactive(false);
    assert!(!guard.permits_action());

    device.set_interactive(true);
    assert!(guard.permits_action());
}

/// Query failures count as "not permitted"
#[test]
fn test_guard_fails_closed() {
    let device = Arc::new(SimulatedDevice::new(0));
    let guard = guard_for(&device);

    device.fail_screen(true);
    assert!(!guard.permits_action());

    device.heal();
    device.fail_power(true);
    assert!(!guard.permits_action());

    device.heal();
    assert!(guard.permits_action());
}
