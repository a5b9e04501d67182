//! Lock trigger: runs on the sample delivery path
//!
//! Registered flag → guard → threshold → registered flag → lock_now().
//! Never blocks, never propagates an error back into sensor delivery.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace};

use crate::core::capabilities::{LockAction, SampleCallback};
use crate::core::guard::DeviceStateGuard;
use crate::core::threshold::ThresholdEvaluator;
use crate::types::{Sample, SampleVerdict, TriggerStats, VerdictRecord};

#[derive(Debug, Default)]
struct Counters {
    samples_seen: AtomicU64,
    locks_invoked: AtomicU64,
    lock_failures: AtomicU64,
}

pub struct LockTrigger {
    /// Shared with RegistrationController, which is the only writer
    registered: Arc<AtomicBool>,
    guard: DeviceStateGuard,
    evaluator: ThresholdEvaluator,
    lock: Arc<dyn LockAction>,
    counters: Counters,
    verdict_tx: Option<broadcast::Sender<VerdictRecord>>,
}

impl LockTrigger {
    pub fn new(
        registered: Arc<AtomicBool>,
        guard: DeviceStateGuard,
        evaluator: ThresholdEvaluator,
        lock: Arc<dyn LockAction>,
    ) -> Self {
        Self {
            registered,
            guard,
            evaluator,
            lock,
            counters: Counters::default(),
            verdict_tx: None,
        }
    }

    /// Publish a record for every handled sample
    pub fn with_verdicts(mut self, tx: broadcast::Sender<VerdictRecord>) -> Self {
        self.verdict_tx = Some(tx);
        self
    }

    /// Handle one delivered sample
    pub fn on_sample(&self, sample: Sample) -> SampleVerdict {
        self.counters.samples_seen.fetch_add(1, Ordering::Relaxed);
        let verdict = self.decide(&sample);
        self.publish(&sample, verdict);
        verdict
    }

    fn decide(&self, sample: &Sample) -> SampleVerdict {
        if !self.registered.load(Ordering::Acquire) {
            debug!("ignoring movement based lock event because it's unregistered");
            return SampleVerdict::Unregistered;
        }

        trace!(values = %sample, "received movement based lock event");

        if !self.guard.permits_action() {
            debug!("ignoring movement based lock event");
            return SampleVerdict::GuardDenied;
        }

        if !self.evaluator.evaluate(sample) {
            return SampleVerdict::BelowThreshold;
        }

        // Unregistration may have completed while the checks above ran
        if !self.registered.load(Ordering::Acquire) {
            debug!("unregistered before dispatch, dropping qualifying sample");
            return SampleVerdict::Revoked;
        }

        self.counters.locks_invoked.fetch_add(1, Ordering::Relaxed);
        match self.lock.lock_now() {
            Ok(()) => {
                info!(magnitude = sample.magnitude(), "movement based lock triggered");
                SampleVerdict::Locked
            }
            Err(e) => {
                self.counters.lock_failures.fetch_add(1, Ordering::Relaxed);
                error!(error = %e, "error while trying to lock device");
                SampleVerdict::LockFailed
            }
        }
    }

    fn publish(&self, sample: &Sample, verdict: SampleVerdict) {
        if let Some(tx) = &self.verdict_tx {
            // No receivers is fine
            let _ = tx.send(VerdictRecord::new(sample.magnitude(), verdict));
        }
    }

    pub fn stats(&self) -> TriggerStats {
        TriggerStats {
            samples_seen: self.counters.samples_seen.load(Ordering::Relaxed),
            locks_invoked: self.counters.locks_invoked.load(Ordering::Relaxed),
            lock_failures: self.counters.lock_failures.load(Ordering::Relaxed),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.evaluator.threshold()
    }

    /// Delivery callback handed to the motion sensor
    pub fn callback(self: &Arc<Self>) -> SampleCallback {
        let trigger = Arc::clone(self);
        Arc::new(move |sample| {
            trigger.on_sample(sample);
        })
    }
}

impl std::fmt::Debug for LockTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockTrigger")
            .field("registered", &self.registered.load(Ordering::Relaxed))
            .field("evaluator", &self.evaluator)
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}
