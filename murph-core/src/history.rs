//! Rolling window of velocity samples used by resting detection.

use std::collections::VecDeque;

use crate::math::Vec3;

/// Fixed-capacity FIFO of vector samples.
///
/// Pushing onto a full history drops the oldest sample.
#[derive(Debug, Clone)]
pub struct VectorHistory {
    capacity: usize,
    samples: VecDeque<Vec3>,
}

impl VectorHistory {
    /// Creates an empty history holding at most `capacity` samples (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity.min(1024)),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Changes the capacity, dropping the oldest samples if needed.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.capacity
    }

    pub fn push(&mut self, sample: Vec3) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn mean(&self) -> Vec3 {
        if self.samples.is_empty() {
            return Vec3::ZERO;
        }
        let sum = self.samples.iter().fold(Vec3::ZERO, |acc, s| acc + *s);
        sum / self.samples.len() as f64
    }

    /// Mean squared distance of the samples to their mean, `E|v - E[v]|²`.
    pub fn variance(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let total: f64 = self
            .samples
            .iter()
            .map(|s| (*s - mean).magnitude_squared())
            .sum();
        total / self.samples.len() as f64
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_evicts_oldest() {
        let mut history = VectorHistory::new(3);
        for i in 0..5 {
            history.push(Vec3::new(i as f64, 0.0, 0.0));
        }
        assert!(history.is_full());
        assert_eq!(history.len(), 3);
        // 2, 3, 4 remain
        assert!((history.mean().x - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_variance_of_constant_is_zero() {
        let mut history = VectorHistory::new(10);
        for _ in 0..10 {
            history.push(Vec3::new(0.2, -0.1, 0.3));
        }
        assert!(history.variance() < 1e-20, "got {}", history.variance());
    }

    #[test]
    fn test_variance_of_alternating_samples() {
        let mut history = VectorHistory::new(4);
        for i in 0..4 {
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            history.push(Vec3::new(0.0, sign, 0.0));
        }
        // every sample sits at distance 1 from the zero mean
        assert!((history.variance() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_shrinking_capacity_keeps_newest() {
        let mut history = VectorHistory::new(4);
        for i in 0..4 {
            history.push(Vec3::new(i as f64, 0.0, 0.0));
        }
        history.set_capacity(2);
        assert_eq!(history.len(), 2);
        assert!((history.mean().x - 2.5).abs() < 1e-12);
    }
}
