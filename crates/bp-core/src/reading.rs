//! BloodPressureReading: the engine's output record

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One complete estimation result.
///
/// Produced fresh on every estimation call and never mutated afterwards.
/// All fields are exposed by value so a downstream telemetry component can
/// serialize them into its own wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodPressureReading {
    /// Unique identifier for this reading
    pub id: Uuid,
    /// Systolic pressure (mmHg)
    pub systolic: f32,
    /// Diastolic pressure (mmHg)
    pub diastolic: f32,
    /// Mean arterial pressure (mmHg)
    pub mean_arterial_pressure: f32,
    /// Pulse transit time (ms)
    pub pulse_transit_time: f32,
    /// Pulse wave velocity (m/s)
    pub pulse_wave_velocity: f32,
    /// Heart rate from the ECG RR intervals (bpm)
    pub heart_rate: f32,
    /// Heart rate variability as RMSSD (ms)
    pub heart_rate_variability: f32,
    /// Composite signal quality (0-100)
    pub signal_quality: f32,
    /// ECG-PPG rhythm correlation (-100 to +100)
    pub correlation: f32,
    /// Heart rhythm regularity over recent RR intervals
    pub rhythm_regular: bool,
    /// True only when every validity gate passed
    pub valid: bool,
    /// True until a calibration reference has been stored
    pub needs_calibration: bool,
    pub timestamp_ms: u64,
}

impl BloodPressureReading {
    /// Structurally complete but invalid reading: all numeric fields zero,
    /// only the timestamp carries information.
    pub fn invalid_at(timestamp_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            systolic: 0.0,
            diastolic: 0.0,
            mean_arterial_pressure: 0.0,
            pulse_transit_time: 0.0,
            pulse_wave_velocity: 0.0,
            heart_rate: 0.0,
            heart_rate_variability: 0.0,
            signal_quality: 0.0,
            correlation: 0.0,
            rhythm_regular: false,
            valid: false,
            needs_calibration: true,
            timestamp_ms,
        }
    }

    /// Pulse pressure (systolic minus diastolic).
    pub fn pulse_pressure(&self) -> f32 {
        self.systolic - self.diastolic
    }

    /// Clinical category of this reading.
    pub fn category(&self) -> BpCategory {
        BpCategory::classify(self.systolic, self.diastolic)
    }
}

/// Clinical blood pressure categories (AHA-style thresholds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BpCategory {
    Normal,
    Elevated,
    Stage1Hypertension,
    Stage2Hypertension,
    HypertensiveCrisis,
}

impl BpCategory {
    /// Classify a systolic/diastolic pair.
    pub fn classify(systolic: f32, diastolic: f32) -> Self {
        if systolic < 120.0 && diastolic < 80.0 {
            BpCategory::Normal
        } else if systolic < 130.0 && diastolic < 80.0 {
            BpCategory::Elevated
        } else if systolic < 140.0 || diastolic < 90.0 {
            BpCategory::Stage1Hypertension
        } else if systolic < 180.0 || diastolic < 120.0 {
            BpCategory::Stage2Hypertension
        } else {
            BpCategory::HypertensiveCrisis
        }
    }

    /// Stage 1 or worse.
    pub fn is_hypertensive(systolic: f32, diastolic: f32) -> bool {
        systolic >= 130.0 || diastolic >= 80.0
    }
}

impl std::fmt::Display for BpCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BpCategory::Normal => write!(f, "Normal"),
            BpCategory::Elevated => write!(f, "Elevated"),
            BpCategory::Stage1Hypertension => write!(f, "Stage 1 Hypertension"),
            BpCategory::Stage2Hypertension => write!(f, "Stage 2 Hypertension"),
            BpCategory::HypertensiveCrisis => write!(f, "Hypertensive Crisis"),
        }
    }
}
