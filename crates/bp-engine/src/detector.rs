//! Adaptive-threshold peak detection state machine
//!
//! One detector instance per channel; all state is per-instance so two
//! engines (or two channels) never share detection history.

/// Detector states. `Rising` is entered on an upward threshold crossing
/// and resolves to a confirmed peak (or a refractory discard) on the next
/// downward derivative turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetectorState {
    Below,
    Rising,
}

/// Derivative-sign peak detector with refractory enforcement.
///
/// Transition rules:
/// - `Below -> Rising` when the value exceeds the threshold and the first
///   derivative turns from <= 0 to > 0.
/// - `Rising` confirms a peak when the derivative turns from >= 0 to < 0.
///   The candidate fires only if the refractory interval since the last
///   confirmed peak has elapsed; otherwise it is silently discarded.
#[derive(Debug, Clone)]
pub struct PeakDetector {
    threshold: f32,
    refractory_ms: u64,
    state: DetectorState,
    last_value: f32,
    last_derivative: f32,
    last_peak_ms: Option<u64>,
}

impl PeakDetector {
    pub fn new(threshold: f32, refractory_ms: u64) -> Self {
        Self {
            threshold,
            refractory_ms,
            state: DetectorState::Below,
            last_value: 0.0,
            last_derivative: 0.0,
            last_peak_ms: None,
        }
    }

    /// Current detection threshold.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Replace the detection threshold (adaptive controller entry point).
    pub fn set_threshold(&mut self, threshold: f32) {
        self.threshold = threshold;
    }

    /// Timestamp of the last confirmed peak, if any.
    pub fn last_peak_ms(&self) -> Option<u64> {
        self.last_peak_ms
    }

    /// Feed one filtered sample. Returns true when a peak is confirmed at
    /// this sample's timestamp.
    pub fn update(&mut self, value: f32, timestamp_ms: u64) -> bool {
        let derivative = value - self.last_value;

        if value > self.threshold && derivative > 0.0 && self.last_derivative <= 0.0 {
            self.state = DetectorState::Rising;
        }

        let mut fired = false;
        if self.state == DetectorState::Rising
            && derivative < 0.0
            && self.last_derivative >= 0.0
        {
            let clear = match self.last_peak_ms {
                Some(prev) => timestamp_ms.saturating_sub(prev) > self.refractory_ms,
                None => true,
            };
            if clear {
                self.last_peak_ms = Some(timestamp_ms);
                fired = true;
            }
            self.state = DetectorState::Below;
        }

        self.last_value = value;
        self.last_derivative = derivative;
        fired
    }

    /// Clear all detection history, keeping the configured threshold.
    pub fn reset(&mut self, threshold: f32) {
        self.threshold = threshold;
        self.state = DetectorState::Below;
        self.last_value = 0.0;
        self.last_derivative = 0.0;
        self.last_peak_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive one pulse through the detector: the filtered value steps above
    /// the threshold, plateaus, then falls. The upward derivative turn
    /// happens above the threshold, which is what arms `Rising`; the peak
    /// confirms on the first falling sample.
    fn feed_pulse(detector: &mut PeakDetector, start_ms: u64) -> Option<u64> {
        let shape = [0.0, 0.0, 2000.0, 2000.0, 1600.0, 0.0];
        let mut fired_at = None;
        for (i, &v) in shape.iter().enumerate() {
            let ts = start_ms + i as u64 * 10;
            if detector.update(v, ts) {
                fired_at = Some(ts);
            }
        }
        fired_at
    }

    #[test]
    fn test_single_pulse_fires_once() {
        let mut detector = PeakDetector::new(1500.0, 300);
        let fired = feed_pulse(&mut detector, 0);
        // Confirmation happens on the first downward sample after the apex
        assert_eq!(fired, Some(40));
    }

    #[test]
    fn test_subthreshold_pulse_ignored() {
        let mut detector = PeakDetector::new(5000.0, 300);
        assert_eq!(feed_pulse(&mut detector, 0), None);
    }

    #[test]
    fn test_refractory_suppresses_close_peaks() {
        let mut detector = PeakDetector::new(1500.0, 300);
        let first = feed_pulse(&mut detector, 0);
        assert_eq!(first, Some(40));

        // Second candidate confirms 150 ms after the first peak: inside the
        // 300 ms refractory window, so it must be discarded.
        let second = feed_pulse(&mut detector, 150);
        assert_eq!(second, None);

        // Well outside the refractory window the detector recovers.
        let third = feed_pulse(&mut detector, 800);
        assert_eq!(third, Some(840));
    }

    #[test]
    fn test_reset_clears_history() {
        let mut detector = PeakDetector::new(1500.0, 300);
        feed_pulse(&mut detector, 0);
        detector.reset(1500.0);
        assert_eq!(detector.last_peak_ms(), None);
        assert!(feed_pulse(&mut detector, 50).is_some());
    }
}
