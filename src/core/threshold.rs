//! Threshold evaluator: does a sample count as a lock gesture?

use crate::types::Sample;
use crate::DEFAULT_THRESHOLD;

/// Pure magnitude check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdEvaluator {
    threshold: f64,
}

impl Default for ThresholdEvaluator {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl ThresholdEvaluator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// True iff the sample magnitude strictly exceeds the threshold
    pub fn evaluate(&self, sample: &Sample) -> bool {
        sample.magnitude() > self.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_below_threshold() {
        let eval = ThresholdEvaluator::default();
        assert!(!eval.evaluate(&Sample::new(30.0, 0.0, 0.0)));
    }

    #[test]
    fn test_above_threshold() {
        let eval = ThresholdEvaluator::default();
        // sqrt(3 * 900) ≈ 51.96
        assert!(eval.evaluate(&Sample::new(30.0, 30.0, 30.0)));
    }

    #[test]
    fn test_boundary_is_exclusive() {
        let eval = ThresholdEvaluator::default();
        assert!(!eval.evaluate(&Sample::new(0.0, 0.0, 40.0)));
        assert!(eval.evaluate(&Sample::new(0.0, 0.0, 40.0001)));
    }

    #[test]
    fn test_negative_components() {
        let eval = ThresholdEvaluator::default();
        assert!(eval.evaluate(&Sample::new(-45.0, 0.0, 0.0)));
    }

    #[test]
    fn test_configurable_threshold() {
        let eval = ThresholdEvaluator::new(10.0);
        assert!(eval.evaluate(&Sample::new(6.0, 8.0, 0.1)));
        assert!(!eval.evaluate(&Sample::new(6.0, 8.0, 0.0)));
    }

    #[test]
    fn test_sweep_agrees_with_magnitude() {
        let eval = ThresholdEvaluator::default();
        for i in 0..200 {
            let v = i as f64 * 0.5;
            let s = Sample::new(v, v / 2.0, -v / 3.0);
            assert_eq!(eval.evaluate(&s), s.magnitude() > 40.0, "sample {}", s);
        }
    }

    #[test]
    fn test_deterministic() {
        let eval = ThresholdEvaluator::default();
        let s = Sample::new(23.1, 23.1, 23.1);
        let first = eval.evaluate(&s);
        for _ in 0..10 {
            assert_eq!(eval.evaluate(&s), first);
        }
    }
}
