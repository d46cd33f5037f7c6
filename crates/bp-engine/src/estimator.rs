//! Blood pressure estimation engine
//!
//! One owned instance per subject. All mutable state lives behind a
//! mutex inside the instance, so two estimators never share detection
//! history and all entry points take `&self`.

use std::sync::{Mutex, MutexGuard};

use bp_core::{
    BloodPressureReading, BpError, BpResult, CalibrationPoint, Ring, UserProfile,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::calibration::{CalibrationModel, CALIBRATION_CAPACITY};
use crate::channel::Channel;
use crate::config::EngineConfig;
use crate::hrv::{self, RR_CAPACITY};
use crate::ptt::{self, MatchedPairs};
use crate::quality;

/// RR intervals outside this band are artifacts and never stored (ms).
const RR_VALID_MS: (f32, f32) = (300.0, 2000.0);
/// Peaks per channel required before estimation is attempted.
const MIN_PEAKS_FOR_ESTIMATE: usize = 3;

struct EngineState {
    config: EngineConfig,
    ecg: Channel,
    ppg: Channel,
    last_red: f32,
    rr: Ring<f32, RR_CAPACITY>,
    calibration: CalibrationModel,
    profile: UserProfile,
    last_valid_ms: u64,
}

impl EngineState {
    fn now_ms(&self) -> u64 {
        self.ecg.last_sample_ms().max(self.ppg.last_sample_ms())
    }

    fn matched_pairs(&self) -> MatchedPairs {
        ptt::match_peaks(self.ecg.peaks(), self.ppg.peaks(), &self.config.ptt)
    }

    fn signal_quality(&self, correlation: f32) -> f32 {
        quality::assess(
            self.ecg.peaks().len(),
            self.ppg.peaks().len(),
            hrv::rhythm_regular(&self.rr),
            correlation,
            self.now_ms(),
            self.last_valid_ms,
            &self.config.validity,
        )
    }
}

/// Continuous cuffless blood pressure estimator.
///
/// Feed it synchronized ECG and PPG samples, calibrate against a cuff
/// reference when available, then pull readings. Time comes entirely
/// from sample timestamps; the engine never consults a wall clock.
pub struct BloodPressureEstimator {
    id: Uuid,
    state: Mutex<EngineState>,
}

impl BloodPressureEstimator {
    /// Create an engine with a validated configuration.
    pub fn new(config: EngineConfig) -> BpResult<Self> {
        config.validate()?;
        let adaptive = config.adaptive_thresholds;
        let state = EngineState {
            ecg: Channel::new("ECG", config.ecg, config.threshold, adaptive),
            ppg: Channel::new("PPG", config.ppg, config.threshold, adaptive),
            config,
            last_red: 0.0,
            rr: Ring::new(),
            calibration: CalibrationModel::new(),
            profile: UserProfile::default(),
            last_valid_ms: 0,
        };
        let id = Uuid::new_v4();
        info!(engine = %id, "blood pressure estimator created");
        Ok(Self {
            id,
            state: Mutex::new(state),
        })
    }

    /// Unique identifier of this engine instance.
    pub fn id(&self) -> Uuid {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        // A panic mid-update cannot leave half-written numeric state that
        // is unsafe to read, so poisoning is recovered rather than spread.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Ingest one ECG sample. Confirmed R-peaks extend the RR history.
    pub fn add_ecg_sample(&self, value: f32, timestamp_ms: u64) {
        let mut state = self.lock();
        let previous_peak = state.ecg.peaks().last().map(|p| p.timestamp_ms);
        if let Some(peak) = state.ecg.ingest(value, timestamp_ms) {
            if let Some(prev) = previous_peak {
                let rr = peak.timestamp_ms.saturating_sub(prev) as f32;
                if rr >= RR_VALID_MS.0 && rr <= RR_VALID_MS.1 {
                    state.rr.push(rr);
                } else {
                    debug!(rr_ms = rr, "discarded RR interval outside valid band");
                }
            }
        }
    }

    /// Ingest one PPG sample pair. Peak detection runs on the IR channel;
    /// the red value is retained for perfusion diagnostics.
    pub fn add_ppg_sample(&self, ir: f32, red: f32, timestamp_ms: u64) {
        let mut state = self.lock();
        state.last_red = red;
        state.ppg.ingest(ir, timestamp_ms);
    }

    /// Most recent red-channel PPG value.
    pub fn last_red(&self) -> f32 {
        self.lock().last_red
    }

    /// True when both channels carry enough peaks and the signal quality
    /// clears the readiness gate.
    pub fn is_ready_for_measurement(&self) -> bool {
        let state = self.lock();
        if state.ecg.peaks().len() < MIN_PEAKS_FOR_ESTIMATE
            || state.ppg.peaks().len() < MIN_PEAKS_FOR_ESTIMATE
        {
            return false;
        }
        let correlation = quality::rhythm_correlation(&state.matched_pairs());
        state.signal_quality(correlation) > state.config.validity.min_quality_ready
    }

    /// Estimate blood pressure from the current signal state.
    ///
    /// Always returns a structurally complete reading; `valid` is false
    /// whenever any gate fails. A valid reading refreshes the staleness
    /// reference point.
    pub fn calculate_blood_pressure(&self) -> BloodPressureReading {
        let mut state = self.lock();
        let now = state.now_ms();

        if state.ecg.peaks().len() < MIN_PEAKS_FOR_ESTIMATE
            || state.ppg.peaks().len() < MIN_PEAKS_FOR_ESTIMATE
        {
            debug!("estimation skipped, not enough peaks");
            return BloodPressureReading::invalid_at(now);
        }

        let matched = state.matched_pairs();
        let ptt_ms = match matched.mean_ptt() {
            Some(ptt) => ptt,
            None => {
                debug!("estimation skipped, no matched peak pairs");
                return BloodPressureReading::invalid_at(now);
            }
        };

        let (raw_systolic, raw_diastolic) = state.calibration.estimate(ptt_ms);
        let systolic = state.profile.compensate(raw_systolic);
        let diastolic = state.profile.compensate(raw_diastolic);
        let mean_arterial_pressure = diastolic + (systolic - diastolic) / 3.0;
        let pulse_wave_velocity = state.profile.arterial_path_m() / (ptt_ms / 1000.0);

        let correlation = quality::rhythm_correlation(&matched);
        let rhythm_regular = hrv::rhythm_regular(&state.rr);
        let signal_quality = state.signal_quality(correlation);
        let valid = quality::passes_validity_gate(
            signal_quality,
            systolic,
            diastolic,
            ptt_ms,
            &state.config.validity,
        );
        if valid {
            state.last_valid_ms = now;
        }

        debug!(
            systolic,
            diastolic, ptt_ms, signal_quality, valid, "estimated blood pressure"
        );

        BloodPressureReading {
            id: Uuid::new_v4(),
            systolic,
            diastolic,
            mean_arterial_pressure,
            pulse_transit_time: ptt_ms,
            pulse_wave_velocity,
            heart_rate: hrv::mean_heart_rate(&state.rr),
            heart_rate_variability: hrv::rmssd(&state.rr),
            signal_quality,
            correlation,
            rhythm_regular,
            valid,
            needs_calibration: state.calibration.count() == 0,
            timestamp_ms: now,
        }
    }

    /// Store a cuff reference measurement against the current transit
    /// time and refit the pressure mapping.
    pub fn add_calibration_point(&self, systolic: f32, diastolic: f32) -> BpResult<()> {
        let mut state = self.lock();

        for (channel, recorded) in [
            ("ECG", state.ecg.peaks().len()),
            ("PPG", state.ppg.peaks().len()),
        ] {
            if recorded < 2 {
                return Err(BpError::InsufficientPeaks {
                    channel,
                    recorded,
                    required: 2,
                });
            }
        }

        let ptt_ms = state.matched_pairs().mean_ptt().ok_or(BpError::InvalidPtt)?;
        let point = CalibrationPoint {
            ptt_ms,
            systolic,
            diastolic,
            timestamp_ms: state.now_ms(),
        };
        state.calibration.add_point(point)
    }

    /// Number of stored calibration reference points.
    pub fn calibration_count(&self) -> usize {
        self.lock().calibration.count()
    }

    /// Drop all calibration points and return to the population model.
    pub fn clear_calibration(&self) {
        self.lock().calibration.clear();
    }

    /// Update subject demographics used for pressure compensation.
    pub fn set_personal_parameters(&self, age: i32, height_cm: f32, is_male: bool) {
        let mut state = self.lock();
        state.profile = UserProfile::new(age, height_cm, is_male);
        info!(age, height_cm, is_male, "personal parameters updated");
    }

    /// Enable or disable adaptive detection thresholds on both channels.
    pub fn set_adaptive_mode(&self, enabled: bool) {
        let mut state = self.lock();
        state.ecg.set_adaptive(enabled);
        state.ppg.set_adaptive(enabled);
    }

    /// Clear all signal state. Calibration and demographics survive.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.ecg.reset();
        state.ppg.reset();
        state.rr.clear();
        state.last_red = 0.0;
        state.last_valid_ms = 0;
        info!(engine = %self.id, "signal state reset");
    }

    /// One-line operator status summary.
    pub fn system_status(&self) -> String {
        let (ecg_peaks, ppg_peaks, cal_points, quality) = {
            let state = self.lock();
            let correlation = quality::rhythm_correlation(&state.matched_pairs());
            (
                state.ecg.peaks().len(),
                state.ppg.peaks().len(),
                state.calibration.count(),
                state.signal_quality(correlation),
            )
        };
        let readiness = if self.is_ready_for_measurement() {
            "Ready"
        } else {
            "Acquiring"
        };
        format!(
            "BP Monitor: {} | ECG Peaks: {} | PPG Peaks: {} | Quality: {:.0}% | Cal Points: {}/{}",
            readiness, ecg_peaks, ppg_peaks, quality, cal_points, CALIBRATION_CAPACITY
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> BloodPressureEstimator {
        let mut config = EngineConfig::default();
        config.adaptive_thresholds = false;
        BloodPressureEstimator::new(config).unwrap()
    }

    /// Feed `beats` synchronized heartbeats as spike trains on both
    /// channels at a 10 ms sample interval. Each ECG spike lands at the
    /// beat time, the PPG spike `delay_ms` later; smoothing shifts every
    /// confirmation by the same 100 ms, so transit times and RR intervals
    /// come through exactly. Returns the next free timestamp.
    fn feed_beats(
        engine: &BloodPressureEstimator,
        start_ms: u64,
        beats: u64,
        rr_ms: u64,
        delay_ms: u64,
    ) -> u64 {
        let end = start_ms + beats * rr_ms + 600;
        let mut ts = start_ms;
        while ts <= end {
            let offset = ts - start_ms;
            let on_beat = offset % rr_ms == 0 && offset / rr_ms < beats;
            let on_pulse = offset >= delay_ms
                && (offset - delay_ms) % rr_ms == 0
                && (offset - delay_ms) / rr_ms < beats;

            engine.add_ecg_sample(if on_beat { 40_000.0 } else { 0.0 }, ts);
            engine.add_ppg_sample(if on_pulse { 600_000.0 } else { 0.0 }, 0.0, ts);
            ts += 10;
        }
        ts
    }

    #[test]
    fn test_not_ready_without_signal() {
        let engine = engine();
        assert!(!engine.is_ready_for_measurement());
    }

    #[test]
    fn test_insufficient_peaks_yield_invalid_reading() {
        let engine = engine();
        feed_beats(&engine, 0, 2, 800, 200);
        let reading = engine.calculate_blood_pressure();
        assert!(!reading.valid);
        assert_eq!(reading.systolic, 0.0);
        assert!(reading.needs_calibration);
    }

    #[test]
    fn test_ready_after_stable_rhythm() {
        let engine = engine();
        feed_beats(&engine, 0, 8, 800, 200);
        assert!(engine.is_ready_for_measurement());
    }

    #[test]
    fn test_uncalibrated_reading_reports_population_model() {
        let engine = engine();
        feed_beats(&engine, 0, 8, 800, 200);

        let reading = engine.calculate_blood_pressure();
        assert!(reading.needs_calibration);
        assert!((reading.pulse_transit_time - 200.0).abs() < 1e-3);
        // Population model: 180 - 1.2 * 200 = -60, scaled by the default
        // male factor. Unphysiological, so the reading cannot be valid.
        assert!(reading.systolic < 0.0);
        assert!(!reading.valid);
    }

    #[test]
    fn test_calibration_requires_peaks() {
        let engine = engine();
        let err = engine.add_calibration_point(120.0, 80.0).unwrap_err();
        assert!(matches!(err, BpError::InsufficientPeaks { .. }));
    }

    #[test]
    fn test_calibrated_reading_is_valid_and_exact() {
        let engine = engine();

        // Two cuff references at distinct transit times define the fit:
        // systolic -0.2 * ptt + 160, diastolic -0.1 * ptt + 100. Phases
        // are spaced so the gaps never register as RR intervals.
        feed_beats(&engine, 0, 8, 800, 200);
        engine.add_calibration_point(120.0, 80.0).unwrap();
        feed_beats(&engine, 10_000, 12, 800, 250);
        engine.add_calibration_point(110.0, 75.0).unwrap();

        feed_beats(&engine, 30_000, 12, 800, 200);
        let reading = engine.calculate_blood_pressure();

        assert!(!reading.needs_calibration);
        assert!((reading.pulse_transit_time - 200.0).abs() < 1e-3);
        // 120 mmHg from the fit, times the default male factor 1.02.
        assert!((reading.systolic - 122.4).abs() < 0.1);
        assert!((reading.diastolic - 81.6).abs() < 0.1);
        assert!(reading.valid);
        assert!(reading.rhythm_regular);
        assert!((reading.heart_rate - 75.0).abs() < 0.5);
        assert_eq!(reading.heart_rate_variability, 0.0);
        assert_eq!(reading.correlation, 100.0);
    }

    #[test]
    fn test_valid_reading_refreshes_staleness() {
        let engine = engine();
        feed_beats(&engine, 0, 8, 800, 200);
        engine.add_calibration_point(120.0, 80.0).unwrap();
        feed_beats(&engine, 10_000, 12, 800, 250);
        engine.add_calibration_point(110.0, 75.0).unwrap();
        feed_beats(&engine, 30_000, 12, 800, 200);

        let first = engine.calculate_blood_pressure();
        assert!(first.valid);
        // Staleness penalty applied before the first valid reading, gone
        // right after it.
        assert_eq!(first.signal_quality, 75.0);
        let second = engine.calculate_blood_pressure();
        assert_eq!(second.signal_quality, 100.0);
    }

    #[test]
    fn test_reset_preserves_calibration() {
        let engine = engine();
        feed_beats(&engine, 0, 8, 800, 200);
        engine.add_calibration_point(120.0, 80.0).unwrap();
        feed_beats(&engine, 10_000, 12, 800, 250);
        engine.add_calibration_point(110.0, 75.0).unwrap();

        engine.reset();
        assert_eq!(engine.calibration_count(), 2);
        assert!(!engine.is_ready_for_measurement());
        let reading = engine.calculate_blood_pressure();
        assert!(!reading.valid);
        assert_eq!(reading.timestamp_ms, 0);
    }

    #[test]
    fn test_mismatched_channels_produce_no_transit_time() {
        let engine = engine();
        // PPG arrivals 500 ms after each R-peak, past the pairing window.
        feed_beats(&engine, 0, 8, 800, 500);
        let reading = engine.calculate_blood_pressure();
        assert!(!reading.valid);
        assert_eq!(reading.pulse_transit_time, 0.0);
    }

    #[test]
    fn test_system_status_format() {
        let engine = engine();
        let status = engine.system_status();
        assert!(status.starts_with("BP Monitor: Acquiring"));
        assert!(status.contains("Cal Points: 0/5"));

        feed_beats(&engine, 0, 8, 800, 200);
        let status = engine.system_status();
        assert!(status.starts_with("BP Monitor: Ready"));
        assert!(status.contains("ECG Peaks: 8"));
    }

    #[test]
    fn test_engines_are_independent() {
        let a = engine();
        let b = engine();
        feed_beats(&a, 0, 8, 800, 200);

        assert_ne!(a.id(), b.id());
        assert!(a.is_ready_for_measurement());
        assert!(!b.is_ready_for_measurement());
    }
}
