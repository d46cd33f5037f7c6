//! Heart rate and rhythm statistics over the RR interval history

use bp_core::Ring;

/// RR interval ring capacity.
pub const RR_CAPACITY: usize = 50;
/// Intervals feeding the rhythm and rate statistics.
const RHYTHM_WINDOW: usize = 10;
/// Minimum intervals before RMSSD is reported.
const RMSSD_MIN_INTERVALS: usize = 10;
/// Intervals required before rhythm regularity is judged.
const RHYTHM_MIN_INTERVALS: usize = 5;

/// Root mean square of successive RR differences, in milliseconds.
/// Returns 0 until enough intervals have accumulated.
pub fn rmssd(rr: &Ring<f32, RR_CAPACITY>) -> f32 {
    if rr.len() < RMSSD_MIN_INTERVALS {
        return 0.0;
    }

    let mut sum_sq = 0.0f32;
    let mut prev: Option<f32> = None;
    let mut diffs = 0usize;
    for &interval in rr.iter() {
        if let Some(p) = prev {
            let d = interval - p;
            sum_sq += d * d;
            diffs += 1;
        }
        prev = Some(interval);
    }
    if diffs == 0 {
        return 0.0;
    }
    (sum_sq / diffs as f32).sqrt()
}

/// Rhythm is regular when the recent RR standard deviation stays under
/// 20% of the recent mean. Irregular (or unknown) until enough beats.
pub fn rhythm_regular(rr: &Ring<f32, RR_CAPACITY>) -> bool {
    if rr.len() < RHYTHM_MIN_INTERVALS {
        return false;
    }

    let count = RHYTHM_WINDOW.min(rr.len());
    let mean: f32 = rr.recent(RHYTHM_WINDOW).sum::<f32>() / count as f32;
    if mean <= 0.0 {
        return false;
    }

    let variance: f32 = rr
        .recent(RHYTHM_WINDOW)
        .map(|i| (i - mean) * (i - mean))
        .sum::<f32>()
        / count as f32;

    variance.sqrt() < 0.2 * mean
}

/// Mean heart rate in beats per minute over the recent RR window.
/// Returns 0 until at least two intervals exist.
pub fn mean_heart_rate(rr: &Ring<f32, RR_CAPACITY>) -> f32 {
    if rr.len() < 2 {
        return 0.0;
    }
    let count = RHYTHM_WINDOW.min(rr.len());
    let mean: f32 = rr.recent(RHYTHM_WINDOW).sum::<f32>() / count as f32;
    if mean <= 0.0 {
        return 0.0;
    }
    60_000.0 / mean
}
