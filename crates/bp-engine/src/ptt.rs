//! ECG-to-PPG peak pairing and pulse transit time

use crate::channel::PEAK_CAPACITY;
use crate::config::PttConfig;
use bp_core::{Peak, Ring};

/// Number of recent peaks per channel considered for pairing.
pub const MATCH_WINDOW: usize = 10;

/// ECG/PPG peak pairs matched within the physiological delay window.
///
/// Pairs are stored oldest-first as (ecg_timestamp_ms, ppg_timestamp_ms).
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchedPairs {
    pairs: [(u64, u64); MATCH_WINDOW],
    len: usize,
}

impl MatchedPairs {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.pairs[..self.len].iter().copied()
    }

    fn push(&mut self, ecg_ms: u64, ppg_ms: u64) {
        if self.len < MATCH_WINDOW {
            self.pairs[self.len] = (ecg_ms, ppg_ms);
            self.len += 1;
        }
    }

    /// Mean transit time over all matched pairs, in milliseconds.
    /// None when no pair matched.
    pub fn mean_ptt(&self) -> Option<f32> {
        if self.len == 0 {
            return None;
        }
        let sum: u64 = self.iter().map(|(ecg, ppg)| ppg - ecg).sum();
        Some(sum as f32 / self.len as f32)
    }
}

/// Pair recent ECG R-peaks with the first PPG pulse arrival inside the
/// configured delay window after each one.
///
/// Each ECG peak claims at most one PPG peak (the earliest match);
/// requires at least two peaks on each channel before any pairing.
pub fn match_peaks(
    ecg: &Ring<Peak, PEAK_CAPACITY>,
    ppg: &Ring<Peak, PEAK_CAPACITY>,
    config: &PttConfig,
) -> MatchedPairs {
    let mut matched = MatchedPairs::default();
    if ecg.len() < 2 || ppg.len() < 2 {
        return matched;
    }

    for ecg_peak in ecg.recent(MATCH_WINDOW) {
        for ppg_peak in ppg.recent(MATCH_WINDOW) {
            if ppg_peak.timestamp_ms <= ecg_peak.timestamp_ms {
                continue;
            }
            let delay = ppg_peak.timestamp_ms - ecg_peak.timestamp_ms;
            if delay >= config.min_delay_ms && delay <= config.max_delay_ms {
                matched.push(ecg_peak.timestamp_ms, ppg_peak.timestamp_ms);
                break;
            }
        }
    }
    matched
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak_ring(timestamps: &[u64]) -> Ring<Peak, PEAK_CAPACITY> {
        let mut ring = Ring::new();
        for (i, &ts) in timestamps.iter().enumerate() {
            ring.push(Peak {
                position: i as u64,
                value: 1.0,
                timestamp_ms: ts,
            });
        }
        ring
    }

    #[test]
    fn test_uniform_delay_matches_every_beat() {
        let ecg = peak_ring(&[0, 800, 1600, 2400]);
        let ppg = peak_ring(&[200, 1000, 1800, 2600]);
        let matched = match_peaks(&ecg, &ppg, &PttConfig { min_delay_ms: 50, max_delay_ms: 400 });

        assert_eq!(matched.len(), 4);
        assert_eq!(matched.mean_ptt(), Some(200.0));
    }

    #[test]
    fn test_delay_outside_window_is_skipped() {
        // 450 ms arrival exceeds the 400 ms cap; 30 ms is too early.
        let ecg = peak_ring(&[0, 800]);
        let ppg = peak_ring(&[450, 830]);
        let matched = match_peaks(&ecg, &ppg, &PttConfig { min_delay_ms: 50, max_delay_ms: 400 });

        assert!(matched.is_empty());
        assert_eq!(matched.mean_ptt(), None);
    }

    #[test]
    fn test_each_ecg_peak_claims_earliest_arrival() {
        // Two plausible arrivals after the first R-peak; only the earlier
        // one pairs with it.
        let ecg = peak_ring(&[0, 800]);
        let ppg = peak_ring(&[150, 350, 1000]);
        let matched = match_peaks(&ecg, &ppg, &PttConfig { min_delay_ms: 50, max_delay_ms: 400 });

        let pairs: Vec<_> = matched.iter().collect();
        assert_eq!(pairs, vec![(0, 150), (800, 1000)]);
    }

    #[test]
    fn test_requires_two_peaks_per_channel() {
        let ecg = peak_ring(&[0]);
        let ppg = peak_ring(&[200, 1000]);
        let matched = match_peaks(&ecg, &ppg, &PttConfig { min_delay_ms: 50, max_delay_ms: 400 });
        assert!(matched.is_empty());
    }

    #[test]
    fn test_only_recent_window_considered() {
        // 12 beats on each channel; pairing only looks at the last 10.
        let ecg_ts: Vec<u64> = (0..12).map(|i| i * 800).collect();
        let ppg_ts: Vec<u64> = (0..12).map(|i| i * 800 + 200).collect();
        let matched = match_peaks(
            &peak_ring(&ecg_ts),
            &peak_ring(&ppg_ts),
            &PttConfig { min_delay_ms: 50, max_delay_ms: 400 },
        );
        assert_eq!(matched.len(), 10);
    }
}
