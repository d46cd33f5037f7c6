//! User demographics and compensation factors

use serde::{Deserialize, Serialize};

/// Subject demographics used for blood pressure compensation.
///
/// Owned by the caller and passed into the estimator; the engine only
/// reads it to scale raw PTT-derived pressures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Age in years
    pub age: i32,
    /// Height in centimeters, used for arterial path length
    pub height_cm: f32,
    pub is_male: bool,
}

impl UserProfile {
    pub fn new(age: i32, height_cm: f32, is_male: bool) -> Self {
        Self { age, height_cm, is_male }
    }

    /// Age compensation factor: +0.5% per year after 30.
    ///
    /// Applied unconditionally, so subjects under 30 get a factor below 1.
    pub fn age_factor(&self) -> f32 {
        1.0 + (self.age - 30) as f32 * 0.005
    }

    /// Gender compensation factor: males run slightly higher.
    pub fn gender_factor(&self) -> f32 {
        if self.is_male {
            1.02
        } else {
            1.0
        }
    }

    /// Apply both demographic factors to a raw pressure value.
    ///
    /// Multiplicative and order-independent; applied identically to
    /// systolic and diastolic.
    pub fn compensate(&self, raw_mmhg: f32) -> f32 {
        raw_mmhg * self.age_factor() * self.gender_factor()
    }

    /// Estimated heart-to-periphery arterial path length in meters.
    pub fn arterial_path_m(&self) -> f32 {
        0.4 * self.height_cm / 100.0
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            age: 30,
            height_cm: 170.0,
            is_male: true,
        }
    }
}
