//! Engine configuration with JSON import/export

use bp_core::{BpError, BpResult};
use serde::{Deserialize, Serialize};

/// Complete engine configuration.
///
/// Defaults match the MAX30102 + AD8232 sensor pairing the engine was
/// built against; the raw-unit thresholds are sensor dependent and meant
/// to be overridden per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// ECG channel parameters
    pub ecg: ChannelConfig,
    /// PPG channel parameters
    pub ppg: ChannelConfig,
    /// Enable periodic threshold adaptation
    pub adaptive_thresholds: bool,
    /// Threshold adaptation parameters
    pub threshold: ThresholdConfig,
    /// Cross-channel peak matching parameters
    pub ptt: PttConfig,
    /// Readiness and validity gates
    pub validity: ValidityConfig,
}

/// Per-channel detection parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Fixed detection threshold in raw sensor units
    pub default_threshold: f32,
    /// Minimum interval between confirmed peaks (ms)
    pub refractory_ms: u64,
}

/// Adaptive threshold controller parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Minimum interval between recomputations (ms, wall clock)
    pub update_interval_ms: u64,
    /// Threshold as a multiple of the recent raw mean
    pub gain: f32,
    /// Number of recent raw samples feeding the mean
    pub sample_window: usize,
}

/// Physiological window for ECG-to-PPG peak pairing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PttConfig {
    /// Earliest plausible pulse arrival after an R-peak (ms)
    pub min_delay_ms: u64,
    /// Latest plausible pulse arrival after an R-peak (ms)
    pub max_delay_ms: u64,
}

/// Gating thresholds for readiness and reading validity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ValidityConfig {
    /// Quality required by `is_ready_for_measurement` (strict >)
    pub min_quality_ready: f32,
    /// Quality required for a valid reading (strict >)
    pub min_quality_valid: f32,
    /// Physiological systolic bounds (mmHg, exclusive)
    pub systolic_range: (f32, f32),
    /// Physiological diastolic bounds (mmHg, exclusive)
    pub diastolic_range: (f32, f32),
    /// Physiological PTT bounds (ms, exclusive)
    pub ptt_range_ms: (f32, f32),
    /// Quality penalty applies beyond this gap since the last valid reading
    pub stale_after_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ecg: ChannelConfig {
                default_threshold: 1500.0,
                refractory_ms: 300,
            },
            ppg: ChannelConfig {
                default_threshold: 50_000.0,
                refractory_ms: 400,
            },
            adaptive_thresholds: true,
            threshold: ThresholdConfig {
                update_interval_ms: 5000,
                gain: 1.5,
                sample_window: 50,
            },
            ptt: PttConfig {
                min_delay_ms: 50,
                max_delay_ms: 400,
            },
            validity: ValidityConfig {
                min_quality_ready: 60.0,
                min_quality_valid: 70.0,
                systolic_range: (70.0, 250.0),
                diastolic_range: (40.0, 150.0),
                ptt_range_ms: (50.0, 500.0),
                stale_after_ms: 10_000,
            },
        }
    }
}

impl EngineConfig {
    /// Preset for supervised spot checks: fixed thresholds tuned by the
    /// operator and a stricter validity gate.
    pub fn clinical_monitor() -> Self {
        let mut config = Self::default();
        config.adaptive_thresholds = false;
        config.validity.min_quality_valid = 80.0;
        config.validity.min_quality_ready = 70.0;
        config
    }

    /// Preset for continuous wearable use: adaptive thresholds and wider
    /// refractory windows to ride out motion.
    pub fn ambulatory_wearable() -> Self {
        let mut config = Self::default();
        config.ecg.refractory_ms = 350;
        config.ppg.refractory_ms = 450;
        config.threshold.update_interval_ms = 3000;
        config.validity.stale_after_ms = 15_000;
        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> BpResult<()> {
        if self.ecg.refractory_ms == 0 || self.ppg.refractory_ms == 0 {
            return Err(BpError::InvalidConfig {
                reason: "refractory interval must be positive",
            });
        }
        if self.threshold.gain <= 0.0 {
            return Err(BpError::InvalidConfig {
                reason: "threshold gain must be positive",
            });
        }
        if self.threshold.sample_window == 0 {
            return Err(BpError::InvalidConfig {
                reason: "threshold sample window must be positive",
            });
        }
        if self.ptt.min_delay_ms >= self.ptt.max_delay_ms {
            return Err(BpError::InvalidConfig {
                reason: "PTT delay window must be non-empty",
            });
        }
        for range in [
            self.validity.systolic_range,
            self.validity.diastolic_range,
            self.validity.ptt_range_ms,
        ] {
            if range.0 >= range.1 {
                return Err(BpError::InvalidConfig {
                    reason: "validity range bounds must be ordered",
                });
            }
        }
        Ok(())
    }

    /// Export configuration to JSON.
    pub fn to_json(&self) -> BpResult<String> {
        serde_json::to_string_pretty(self).map_err(|_| BpError::InvalidConfig {
            reason: "failed to serialize configuration",
        })
    }

    /// Import configuration from JSON.
    pub fn from_json(json: &str) -> BpResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|_| BpError::InvalidConfig {
            reason: "failed to parse configuration JSON",
        })?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_ptt_window_rejected() {
        let mut config = EngineConfig::default();
        config.ptt.min_delay_ms = 400;
        config.ptt.max_delay_ms = 50;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_refractory_rejected() {
        let mut config = EngineConfig::default();
        config.ecg.refractory_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(EngineConfig::clinical_monitor().validate().is_ok());
        assert!(EngineConfig::ambulatory_wearable().validate().is_ok());
        assert!(!EngineConfig::clinical_monitor().adaptive_thresholds);
    }

    #[test]
    fn test_json_roundtrip() {
        let config = EngineConfig::default();
        let json = config.to_json().unwrap();
        let back = EngineConfig::from_json(&json).unwrap();
        assert_eq!(back.ecg.default_threshold, config.ecg.default_threshold);
        assert_eq!(back.validity.stale_after_ms, config.validity.stale_after_ms);
    }

    #[test]
    fn test_malformed_json_rejected() {
        assert!(EngineConfig::from_json("{not json").is_err());
    }
}
