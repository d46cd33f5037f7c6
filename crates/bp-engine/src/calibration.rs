//! Per-user calibration of the PTT-to-pressure mapping

use bp_core::{BpError, BpResult, CalibrationPoint};
use tracing::{info, warn};

/// Stored reference measurements.
pub const CALIBRATION_CAPACITY: usize = 5;

/// Population-default mapping, used until calibration refits it.
const DEFAULT_SYSTOLIC_SLOPE: f32 = -1.2;
const DEFAULT_SYSTOLIC_INTERCEPT: f32 = 180.0;
const DEFAULT_DIASTOLIC_SLOPE: f32 = -0.8;
const DEFAULT_DIASTOLIC_INTERCEPT: f32 = 120.0;

/// Linear PTT-to-pressure model with least-squares refitting from cuff
/// reference points.
///
/// Pressure = slope * ptt_ms + intercept, one line per channel. The
/// model starts at population defaults and refits whenever a second or
/// later reference point arrives.
#[derive(Debug, Clone)]
pub struct CalibrationModel {
    points: [CalibrationPoint; CALIBRATION_CAPACITY],
    count: usize,
    systolic_slope: f32,
    systolic_intercept: f32,
    diastolic_slope: f32,
    diastolic_intercept: f32,
}

impl Default for CalibrationModel {
    fn default() -> Self {
        Self {
            points: [CalibrationPoint::default(); CALIBRATION_CAPACITY],
            count: 0,
            systolic_slope: DEFAULT_SYSTOLIC_SLOPE,
            systolic_intercept: DEFAULT_SYSTOLIC_INTERCEPT,
            diastolic_slope: DEFAULT_DIASTOLIC_SLOPE,
            diastolic_intercept: DEFAULT_DIASTOLIC_INTERCEPT,
        }
    }
}

impl CalibrationModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Store one cuff reference point and refit the mapping when at least
    /// two points exist.
    pub fn add_point(&mut self, point: CalibrationPoint) -> BpResult<()> {
        if self.count == CALIBRATION_CAPACITY {
            return Err(BpError::CalibrationStoreFull {
                capacity: CALIBRATION_CAPACITY,
            });
        }

        self.points[self.count] = point;
        self.count += 1;
        info!(
            points = self.count,
            ptt_ms = point.ptt_ms,
            "stored calibration reference"
        );

        if self.count >= 2 {
            self.refit();
        }
        Ok(())
    }

    /// Least-squares fit of both pressure lines against stored PTT values.
    /// A degenerate fit (all reference PTTs equal) keeps the previous
    /// coefficients; the point itself stays stored.
    fn refit(&mut self) {
        let n = self.count as f32;
        let points = &self.points[..self.count];

        let sum_x: f32 = points.iter().map(|p| p.ptt_ms).sum();
        let sum_xx: f32 = points.iter().map(|p| p.ptt_ms * p.ptt_ms).sum();
        let denominator = n * sum_xx - sum_x * sum_x;
        if denominator.abs() < f32::EPSILON {
            warn!("calibration points share one transit time, keeping previous fit");
            return;
        }

        let sum_sys: f32 = points.iter().map(|p| p.systolic).sum();
        let sum_x_sys: f32 = points.iter().map(|p| p.ptt_ms * p.systolic).sum();
        self.systolic_slope = (n * sum_x_sys - sum_x * sum_sys) / denominator;
        self.systolic_intercept = (sum_sys - self.systolic_slope * sum_x) / n;

        let sum_dia: f32 = points.iter().map(|p| p.diastolic).sum();
        let sum_x_dia: f32 = points.iter().map(|p| p.ptt_ms * p.diastolic).sum();
        self.diastolic_slope = (n * sum_x_dia - sum_x * sum_dia) / denominator;
        self.diastolic_intercept = (sum_dia - self.diastolic_slope * sum_x) / n;

        info!(
            systolic_slope = self.systolic_slope,
            diastolic_slope = self.diastolic_slope,
            "refitted pressure mapping"
        );
    }

    /// Map a transit time to (systolic, diastolic) before demographic
    /// compensation.
    pub fn estimate(&self, ptt_ms: f32) -> (f32, f32) {
        (
            self.systolic_slope * ptt_ms + self.systolic_intercept,
            self.diastolic_slope * ptt_ms + self.diastolic_intercept,
        )
    }

    /// Drop all stored points and restore the population defaults.
    pub fn clear(&mut self) {
        *self = Self::default();
        info!("calibration cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(ptt_ms: f32, systolic: f32, diastolic: f32) -> CalibrationPoint {
        CalibrationPoint {
            ptt_ms,
            systolic,
            diastolic,
            timestamp_ms: 0,
        }
    }

    #[test]
    fn test_population_defaults_before_calibration() {
        let model = CalibrationModel::new();
        let (sys, dia) = model.estimate(250.0);
        assert!((sys - (180.0 - 1.2 * 250.0)).abs() < 1e-3);
        assert!((dia - (120.0 - 0.8 * 250.0)).abs() < 1e-3);
        assert_eq!(model.count(), 0);
    }

    #[test]
    fn test_two_points_refit_exactly() {
        let mut model = CalibrationModel::new();
        model.add_point(point(200.0, 120.0, 80.0)).unwrap();
        model.add_point(point(250.0, 110.0, 75.0)).unwrap();

        // Two points define the line: systolic -0.2*ptt + 160,
        // diastolic -0.1*ptt + 100.
        let (sys, dia) = model.estimate(200.0);
        assert!((sys - 120.0).abs() < 1e-3);
        assert!((dia - 80.0).abs() < 1e-3);

        let (sys, dia) = model.estimate(250.0);
        assert!((sys - 110.0).abs() < 1e-3);
        assert!((dia - 75.0).abs() < 1e-3);
    }

    #[test]
    fn test_single_point_keeps_defaults() {
        let mut model = CalibrationModel::new();
        model.add_point(point(200.0, 120.0, 80.0)).unwrap();
        let (sys, _) = model.estimate(250.0);
        assert!((sys - (180.0 - 1.2 * 250.0)).abs() < 1e-3);
    }

    #[test]
    fn test_store_rejects_sixth_point() {
        let mut model = CalibrationModel::new();
        for i in 0..5 {
            model
                .add_point(point(200.0 + i as f32 * 10.0, 120.0, 80.0))
                .unwrap();
        }
        let err = model.add_point(point(300.0, 120.0, 80.0)).unwrap_err();
        assert!(matches!(err, BpError::CalibrationStoreFull { capacity: 5 }));
        assert_eq!(model.count(), 5);
    }

    #[test]
    fn test_degenerate_fit_keeps_coefficients_but_stores_point() {
        let mut model = CalibrationModel::new();
        model.add_point(point(200.0, 120.0, 80.0)).unwrap();
        model.add_point(point(200.0, 130.0, 85.0)).unwrap();

        assert_eq!(model.count(), 2);
        let (sys, _) = model.estimate(200.0);
        assert!((sys - (180.0 - 1.2 * 200.0)).abs() < 1e-3);
    }

    #[test]
    fn test_clear_restores_defaults() {
        let mut model = CalibrationModel::new();
        model.add_point(point(200.0, 120.0, 80.0)).unwrap();
        model.add_point(point(250.0, 110.0, 75.0)).unwrap();
        model.clear();

        assert_eq!(model.count(), 0);
        let (sys, _) = model.estimate(250.0);
        assert!((sys - (180.0 - 1.2 * 250.0)).abs() < 1e-3);
    }
}
