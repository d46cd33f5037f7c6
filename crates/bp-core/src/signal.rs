//! Timestamped signal primitives shared by both channels

use serde::{Deserialize, Serialize};

/// One timestamped scalar sample from a sensor channel.
///
/// Immutable once stored; timestamps are producer-side milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub value: f32,
    pub timestamp_ms: u64,
}

impl Sample {
    pub fn new(value: f32, timestamp_ms: u64) -> Self {
        Self { value, timestamp_ms }
    }
}

/// A confirmed peak emitted by a channel's peak detector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    /// Logical sample index within the channel stream at confirmation time
    pub position: u64,
    /// Filtered amplitude at the peak
    pub value: f32,
    pub timestamp_ms: u64,
}

/// A deliberate clinical reference pairing a measured PTT with cuff values.
///
/// Points are never evicted automatically; a full store rejects additions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPoint {
    /// Measured pulse transit time (ms)
    pub ptt_ms: f32,
    /// Reference systolic pressure (mmHg)
    pub systolic: f32,
    /// Reference diastolic pressure (mmHg)
    pub diastolic: f32,
    pub timestamp_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_roundtrip() {
        let sample = Sample::new(1.25, 42);
        let json = serde_json::to_string(&sample).unwrap();
        let back: Sample = serde_json::from_str(&json).unwrap();
        assert_eq!(sample, back);
    }

    #[test]
    fn test_defaults_are_zeroed() {
        let peak = Peak::default();
        assert_eq!(peak.position, 0);
        assert_eq!(peak.value, 0.0);
        assert_eq!(peak.timestamp_ms, 0);
    }
}
