//! Cuffless blood pressure estimation from synchronized ECG and PPG
//!
//! The engine pairs ECG R-peaks with PPG pulse arrivals to measure pulse
//! transit time, maps it through a per-user calibrated linear model, and
//! gates every reading on signal quality. See [`BloodPressureEstimator`]
//! for the entry point.

pub mod calibration;
pub mod channel;
pub mod config;
pub mod detector;
pub mod estimator;
pub mod filter;
pub mod hrv;
pub mod ptt;
pub mod quality;

pub use calibration::CalibrationModel;
pub use config::{ChannelConfig, EngineConfig, PttConfig, ThresholdConfig, ValidityConfig};
pub use estimator::BloodPressureEstimator;

pub use bp_core::{
    BloodPressureReading, BpCategory, BpError, BpResult, CalibrationPoint, UserProfile,
};
