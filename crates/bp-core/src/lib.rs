//! BP-Core: Foundation types for PTT-based blood pressure estimation
//!
//! Shared data types, the fixed-capacity ring buffer, and the error
//! taxonomy used by the estimation engine.

pub mod error;
pub mod profile;
pub mod reading;
pub mod ring;
pub mod signal;

pub use error::{BpError, BpResult};
pub use profile::UserProfile;
pub use reading::{BloodPressureReading, BpCategory};
pub use ring::Ring;
pub use signal::{CalibrationPoint, Peak, Sample};
