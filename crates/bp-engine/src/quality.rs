//! Signal quality scoring and reading validity gates

use crate::config::ValidityConfig;
use crate::ptt::{MatchedPairs, MATCH_WINDOW};

/// Peaks per channel below which the score is penalized.
const MIN_PEAKS_FOR_QUALITY: usize = 5;
/// Matched pairs required before the correlation statistic is meaningful.
const MIN_PAIRS_FOR_CORRELATION: usize = 3;
/// Absolute correlation below which the channels are considered decoupled.
const CORRELATION_FLOOR: f32 = 50.0;
/// Interval spread below which a rhythm counts as locked. Confirmation
/// timestamps carry sample quantization and detection jitter, so spreads
/// this small hold no usable variance for a correlation estimate.
const LOCKED_INTERVAL_STD_MS: f32 = 50.0;

/// Score the current signal on a 0..100 scale.
///
/// Starts from 100 and subtracts fixed penalties for sparse peaks, an
/// irregular rhythm, weak cross-channel correlation, and staleness since
/// the last valid reading.
pub fn assess(
    ecg_peaks: usize,
    ppg_peaks: usize,
    rhythm_regular: bool,
    correlation: f32,
    now_ms: u64,
    last_valid_ms: u64,
    config: &ValidityConfig,
) -> f32 {
    let mut score = 100.0f32;

    if ecg_peaks < MIN_PEAKS_FOR_QUALITY || ppg_peaks < MIN_PEAKS_FOR_QUALITY {
        score -= 30.0;
    }
    if !rhythm_regular {
        score -= 20.0;
    }
    if correlation.abs() < CORRELATION_FLOOR {
        score -= 25.0;
    }
    if now_ms.saturating_sub(last_valid_ms) > config.stale_after_ms {
        score -= 25.0;
    }

    score.max(0.0)
}

/// Correlation between ECG and PPG beat timing, scaled to -100..100.
///
/// Computed as the Pearson coefficient between the successive-interval
/// series of the two channels' matched peak timestamps. A locked rhythm
/// (both interval series flat up to sample quantization) scores 100;
/// fewer than three matched pairs scores 0.
pub fn rhythm_correlation(pairs: &MatchedPairs) -> f32 {
    if pairs.len() < MIN_PAIRS_FOR_CORRELATION {
        return 0.0;
    }

    let mut ecg_intervals = [0.0f32; MATCH_WINDOW - 1];
    let mut ppg_intervals = [0.0f32; MATCH_WINDOW - 1];
    let mut count = 0usize;
    let mut prev: Option<(u64, u64)> = None;
    for (ecg_ms, ppg_ms) in pairs.iter() {
        if let Some((pe, pp)) = prev {
            ecg_intervals[count] = ecg_ms.saturating_sub(pe) as f32;
            ppg_intervals[count] = ppg_ms.saturating_sub(pp) as f32;
            count += 1;
        }
        prev = Some((ecg_ms, ppg_ms));
    }
    let ecg_intervals = &ecg_intervals[..count];
    let ppg_intervals = &ppg_intervals[..count];

    let n = count as f32;
    let ecg_mean = ecg_intervals.iter().sum::<f32>() / n;
    let ppg_mean = ppg_intervals.iter().sum::<f32>() / n;

    let mut covariance = 0.0f32;
    let mut ecg_var = 0.0f32;
    let mut ppg_var = 0.0f32;
    for (e, p) in ecg_intervals.iter().zip(ppg_intervals.iter()) {
        let de = e - ecg_mean;
        let dp = p - ppg_mean;
        covariance += de * dp;
        ecg_var += de * de;
        ppg_var += dp * dp;
    }

    // Near-constant interval series on both channels mean a locked
    // rhythm; whatever residual variance exists is quantization noise,
    // not signal. A single degenerate series means the channels disagree.
    let ecg_std = (ecg_var / n).sqrt();
    let ppg_std = (ppg_var / n).sqrt();
    if ecg_std < LOCKED_INTERVAL_STD_MS && ppg_std < LOCKED_INTERVAL_STD_MS {
        return 100.0;
    }
    if ecg_var < f32::EPSILON || ppg_var < f32::EPSILON {
        return 0.0;
    }

    let r = covariance / (ecg_var.sqrt() * ppg_var.sqrt());
    (r * 100.0).clamp(-100.0, 100.0)
}

/// Final gate for reporting a reading as valid. All bounds are exclusive
/// and the quality comparison is strict.
pub fn passes_validity_gate(
    quality: f32,
    systolic: f32,
    diastolic: f32,
    ptt_ms: f32,
    config: &ValidityConfig,
) -> bool {
    quality > config.min_quality_valid
        && systolic > config.systolic_range.0
        && systolic < config.systolic_range.1
        && diastolic > config.diastolic_range.0
        && diastolic < config.diastolic_range.1
        && ptt_ms > config.ptt_range_ms.0
        && ptt_ms < config.ptt_range_ms.1
}
