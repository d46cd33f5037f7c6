//! One signal channel: smoothing, peak detection, sample/peak storage

use crate::config::{ChannelConfig, ThresholdConfig};
use crate::detector::PeakDetector;
use crate::filter::MovingAverage;
use bp_core::{Peak, Ring, Sample};
use tracing::debug;

/// Raw sample ring capacity per channel.
pub const SAMPLE_CAPACITY: usize = 200;
/// Confirmed peak ring capacity per channel.
pub const PEAK_CAPACITY: usize = 20;

/// A single ingestion channel (ECG or PPG).
///
/// Samples flow raw into the ring, smoothed into the detector; confirmed
/// peaks land in the peak ring. The adaptive threshold controller
/// recomputes the detection threshold from recent raw statistics on a
/// fixed wall-clock cadence.
#[derive(Debug, Clone)]
pub struct Channel {
    label: &'static str,
    config: ChannelConfig,
    threshold_config: ThresholdConfig,
    filter: MovingAverage,
    detector: PeakDetector,
    samples: Ring<Sample, SAMPLE_CAPACITY>,
    peaks: Ring<Peak, PEAK_CAPACITY>,
    adaptive: bool,
    last_adapt_ms: u64,
}

impl Channel {
    pub fn new(
        label: &'static str,
        config: ChannelConfig,
        threshold_config: ThresholdConfig,
        adaptive: bool,
    ) -> Self {
        Self {
            label,
            detector: PeakDetector::new(config.default_threshold, config.refractory_ms),
            config,
            threshold_config,
            filter: MovingAverage::new(),
            samples: Ring::new(),
            peaks: Ring::new(),
            adaptive,
            last_adapt_ms: 0,
        }
    }

    /// Ingest one raw sample. Returns the confirmed peak, if this sample
    /// completed one.
    pub fn ingest(&mut self, raw: f32, timestamp_ms: u64) -> Option<Peak> {
        let filtered = self.filter.apply(raw);
        self.samples.push(Sample::new(raw, timestamp_ms));

        let fired = self.detector.update(filtered, timestamp_ms);
        let peak = if fired {
            let peak = Peak {
                position: self.samples.total_pushed() - 1,
                value: filtered,
                timestamp_ms,
            };
            self.peaks.push(peak);
            Some(peak)
        } else {
            None
        };

        self.maybe_adapt_threshold(timestamp_ms);
        peak
    }

    /// Recompute the detection threshold from the mean of the most recent
    /// raw samples, no more often than the configured cadence.
    fn maybe_adapt_threshold(&mut self, now_ms: u64) {
        if !self.adaptive {
            return;
        }
        if now_ms.saturating_sub(self.last_adapt_ms) < self.threshold_config.update_interval_ms {
            return;
        }

        let window = self.threshold_config.sample_window;
        let count = window.min(self.samples.len());
        if count == 0 {
            return;
        }

        let sum: f32 = self.samples.recent(window).map(|s| s.value).sum();
        let mean = sum / count as f32;
        let threshold = mean * self.threshold_config.gain;

        debug!(
            channel = self.label,
            threshold, "adapted detection threshold"
        );
        self.detector.set_threshold(threshold);
        self.last_adapt_ms = now_ms;
    }

    pub fn peaks(&self) -> &Ring<Peak, PEAK_CAPACITY> {
        &self.peaks
    }

    /// Timestamp of the most recent ingested sample, 0 before any.
    pub fn last_sample_ms(&self) -> u64 {
        self.samples.last().map(|s| s.timestamp_ms).unwrap_or(0)
    }

    pub fn current_threshold(&self) -> f32 {
        self.detector.threshold()
    }

    pub fn set_adaptive(&mut self, enabled: bool) {
        self.adaptive = enabled;
    }

    /// Zero all logical state without reallocation.
    pub fn reset(&mut self) {
        self.filter.reset();
        self.detector.reset(self.config.default_threshold);
        self.samples.clear();
        self.peaks.clear();
        self.last_adapt_ms = 0;
    }
}
