//! Bounded latency sampling for percentile queries

use std::{collections::VecDeque, sync::Mutex};

/// Default cap on retained samples
pub const DEFAULT_MAX_SAMPLES: usize = 10_000;

/// A bounded deque of raw latency samples.
///
/// Recording is mutex-guarded, a synchronization domain separate from the
/// atomic counters feeding the same metrics entity. Once `max_samples` is
/// reached the oldest sample is dropped per new one.
#[derive(Debug)]
pub struct LatencyHistogram {
    samples: Mutex<VecDeque<u64>>,
    max_samples: usize,
}

impl LatencyHistogram {
    /// Create a histogram retaining up to `max_samples` samples
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: Mutex::new(VecDeque::new()),
            max_samples,
        }
    }

    /// Record one latency sample in nanoseconds
    pub fn record(&self, latency_ns: u64) {
        let mut samples = self.samples.lock().unwrap();
        samples.push_back(latency_ns);
        if samples.len() > self.max_samples {
            samples.pop_front();
        }
    }

    /// Latency (ns) at percentile `p` in `[0.0, 1.0]`, by sorted copy and
    /// interpolated rank. Returns 0.0 with no samples.
    pub fn percentile(&self, p: f64) -> f64 {
        let samples = self.samples.lock().unwrap();
        if samples.is_empty() {
            return 0.0;
        }

        let mut sorted: Vec<u64> = samples.iter().copied().collect();
        sorted.sort_unstable();

        let p = p.clamp(0.0, 1.0);
        let rank = p * (sorted.len() - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = lower + 1;

        if upper >= sorted.len() {
            return sorted[lower] as f64;
        }

        let fraction = rank - lower as f64;
        sorted[lower] as f64 * (1.0 - fraction) + sorted[upper] as f64 * fraction
    }

    /// Number of retained samples
    pub fn len(&self) -> usize {
        self.samples.lock().unwrap().len()
    }

    /// Check if no samples are retained
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discard all samples
    pub fn reset(&self) {
        self.samples.lock().unwrap().clear();
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SAMPLES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_empty() {
        let histogram = LatencyHistogram::default();
        assert_eq!(histogram.percentile(0.5), 0.0);
    }

    #[test]
    fn test_percentile_interpolation() {
        let histogram = LatencyHistogram::default();
        for v in [10, 20, 30, 40] {
            histogram.record(v);
        }

        assert_eq!(histogram.percentile(0.0), 10.0);
        assert_eq!(histogram.percentile(1.0), 40.0);
        // rank 1.5 between 20 and 30
        assert!((histogram.percentile(0.5) - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_sample_cap_drops_oldest() {
        let histogram = LatencyHistogram::new(4);
        for v in 1..=6u64 {
            histogram.record(v);
        }

        assert_eq!(histogram.len(), 4);
        // 1 and 2 were evicted
        assert_eq!(histogram.percentile(0.0), 3.0);
    }

    #[test]
    fn test_reset() {
        let histogram = LatencyHistogram::default();
        histogram.record(5);
        histogram.reset();
        assert!(histogram.is_empty());
    }
}
