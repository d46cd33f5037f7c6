//! Error handling for the blood pressure engine
//!
//! All recoverable outcomes are ordinary control flow; nothing here is
//! fatal to the host process and no panic crosses the public boundary.

use core::fmt;

/// Result type alias for blood pressure engine operations
pub type BpResult<T> = Result<T, BpError>;

/// Error type for all blood pressure engine operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum BpError {
    /// Too few confirmed peaks on a channel to proceed
    InsufficientPeaks {
        /// Channel label ("ECG" or "PPG")
        channel: &'static str,
        /// Peaks currently recorded
        recorded: usize,
        /// Minimum required
        required: usize,
    },

    /// No ECG/PPG peak pair matched within the physiological window
    InvalidPtt,

    /// Calibration store already holds the maximum number of points
    CalibrationStoreFull {
        /// Store capacity
        capacity: usize,
    },

    /// Invalid engine configuration
    InvalidConfig {
        /// Description of the configuration error
        reason: &'static str,
    },
}

impl fmt::Display for BpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BpError::InsufficientPeaks { channel, recorded, required } => {
                write!(f, "Insufficient {} peaks: recorded {}, required {}",
                       channel, recorded, required)
            }
            BpError::InvalidPtt => {
                write!(f, "No ECG/PPG peak pairs matched within the PTT window")
            }
            BpError::CalibrationStoreFull { capacity } => {
                write!(f, "Calibration store full: capacity {}", capacity)
            }
            BpError::InvalidConfig { reason } => {
                write!(f, "Invalid engine configuration: {}", reason)
            }
        }
    }
}

impl std::error::Error for BpError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = BpError::InsufficientPeaks {
            channel: "ECG",
            recorded: 2,
            required: 3,
        };
        let display = format!("{}", error);
        assert!(display.contains("ECG"));
        assert!(display.contains("2"));
        assert!(display.contains("3"));
    }

    #[test]
    fn test_error_equality() {
        assert_eq!(BpError::InvalidPtt, BpError::InvalidPtt);
        assert_ne!(
            BpError::InvalidPtt,
            BpError::CalibrationStoreFull { capacity: 5 }
        );
    }
}
