//! Synthetic cardiac signal generation for testing and development
//!
//! Produces synchronized ECG and PPG sample streams with a configurable
//! heart rate, pulse transit time and noise mix. R-waves and pulse
//! arrivals are emitted as short tall deflections so downstream peak
//! detection sees realistic sharp onsets.

use bp_core::{BpError, BpResult};
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// One synchronized sensor frame: ECG plus both PPG wavelengths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorFrame {
    pub ecg: f32,
    pub ppg_ir: f32,
    pub ppg_red: f32,
    pub timestamp_ms: u64,
}

/// Configuration for cardiac simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardiacConfig {
    /// Mean heart rate in beats per minute
    pub heart_rate_bpm: f32,
    /// ECG-to-PPG pulse transit time in milliseconds
    pub ptt_ms: u64,
    /// Sampling rate in Hz, shared by both channels
    pub sampling_rate: f32,
    /// R-wave deflection above the ECG baseline, raw units
    pub ecg_amplitude: f32,
    /// ECG baseline level, raw units
    pub ecg_baseline: f32,
    /// Pulse deflection above the PPG baseline, raw units
    pub ppg_amplitude: f32,
    /// PPG IR baseline level, raw units
    pub ppg_baseline: f32,
    /// Beat-to-beat interval jitter standard deviation (ms)
    pub rr_jitter_ms: f32,
    /// Noise configuration
    pub noise: NoiseConfig,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

/// Noise configuration for realistic sensor output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Gaussian noise standard deviation, raw units (0.0 = no noise)
    pub gaussian_std: f32,
    /// Slow baseline wander amplitude, raw units
    pub baseline_wander: f32,
    /// Motion artifact probability per sample (0.0 to 1.0)
    pub motion_artifact_prob: f32,
    /// Motion artifact amplitude, raw units
    pub motion_artifact_amp: f32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            gaussian_std: 20.0,
            baseline_wander: 50.0,
            motion_artifact_prob: 0.001,
            motion_artifact_amp: 200.0,
        }
    }
}

impl Default for CardiacConfig {
    fn default() -> Self {
        Self {
            heart_rate_bpm: 75.0,
            ptt_ms: 200,
            sampling_rate: 100.0,
            ecg_amplitude: 30_000.0,
            ecg_baseline: 200.0,
            ppg_amplitude: 600_000.0,
            ppg_baseline: 30_000.0,
            rr_jitter_ms: 0.0,
            noise: NoiseConfig::default(),
            seed: None,
        }
    }
}

impl CardiacConfig {
    fn validate(&self) -> BpResult<()> {
        if !(20.0..=250.0).contains(&self.heart_rate_bpm) {
            return Err(BpError::InvalidConfig {
                reason: "heart rate must be between 20 and 250 bpm",
            });
        }
        if self.sampling_rate <= 0.0 {
            return Err(BpError::InvalidConfig {
                reason: "sampling rate must be positive",
            });
        }
        Ok(())
    }
}

/// R-wave duration in milliseconds.
const QRS_WIDTH_MS: u64 = 20;
/// Pulse upstroke duration in milliseconds.
const PULSE_WIDTH_MS: u64 = 20;
/// Red channel attenuation relative to IR.
const RED_RATIO: f32 = 0.6;

/// Cardiac signal simulator.
///
/// Generation is chunk-oriented and continuous: beat phase and time
/// carry over between calls, so consecutive chunks join seamlessly.
pub struct CardiacSimulator {
    config: CardiacConfig,
    rng: rand::rngs::StdRng,
    noise_dist: Normal<f32>,
    jitter_dist: Normal<f32>,
    time_ms: u64,
    current_beat_ms: u64,
    next_beat_ms: u64,
}

impl CardiacSimulator {
    /// Create a simulator with a validated configuration.
    pub fn new(config: CardiacConfig) -> BpResult<Self> {
        config.validate()?;

        let seed = config.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        });
        let rng = rand::rngs::StdRng::seed_from_u64(seed);

        let noise_dist = Normal::new(0.0, config.noise.gaussian_std.max(f32::MIN_POSITIVE))
            .map_err(|_| BpError::InvalidConfig {
                reason: "noise standard deviation must be finite",
            })?;
        let jitter_dist = Normal::new(0.0, config.rr_jitter_ms.max(f32::MIN_POSITIVE))
            .map_err(|_| BpError::InvalidConfig {
                reason: "RR jitter must be finite",
            })?;

        let rr = (60_000.0 / config.heart_rate_bpm) as u64;
        Ok(Self {
            config,
            rng,
            noise_dist,
            jitter_dist,
            time_ms: 0,
            current_beat_ms: 0,
            next_beat_ms: rr,
        })
    }

    pub fn config(&self) -> &CardiacConfig {
        &self.config
    }

    /// Update the configuration without disturbing beat phase.
    pub fn update_config(&mut self, config: CardiacConfig) -> BpResult<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Restart time and beat phase.
    pub fn reset_time(&mut self) {
        self.time_ms = 0;
        self.current_beat_ms = 0;
        self.next_beat_ms = (60_000.0 / self.config.heart_rate_bpm) as u64;
    }

    /// Generate the next chunk of synchronized frames.
    pub fn generate_chunk(&mut self, duration_ms: u64) -> Vec<SensorFrame> {
        let step_ms = (1000.0 / self.config.sampling_rate) as u64;
        let step_ms = step_ms.max(1);
        let end = self.time_ms + duration_ms;

        let mut frames = Vec::with_capacity((duration_ms / step_ms) as usize + 1);
        while self.time_ms < end {
            frames.push(self.next_frame());
            self.time_ms += step_ms;
        }
        frames
    }

    fn next_frame(&mut self) -> SensorFrame {
        let t = self.time_ms;
        if t >= self.next_beat_ms {
            self.current_beat_ms = self.next_beat_ms;
            let base_rr = 60_000.0 / self.config.heart_rate_bpm;
            let jitter = if self.config.rr_jitter_ms > 0.0 {
                self.jitter_dist.sample(&mut self.rng)
            } else {
                0.0
            };
            let rr = (base_rr + jitter).max(250.0) as u64;
            self.next_beat_ms = self.current_beat_ms + rr;
        }

        let since_beat = t - self.current_beat_ms;
        let ecg_active = since_beat < QRS_WIDTH_MS;
        let ppg_active = since_beat >= self.config.ptt_ms
            && since_beat < self.config.ptt_ms + PULSE_WIDTH_MS;

        let ecg = self.config.ecg_baseline
            + if ecg_active { self.config.ecg_amplitude } else { 0.0 }
            + self.channel_noise(t);
        let ppg_ir = self.config.ppg_baseline
            + if ppg_active { self.config.ppg_amplitude } else { 0.0 }
            + self.channel_noise(t);
        let ppg_red = self.config.ppg_baseline * RED_RATIO
            + if ppg_active { self.config.ppg_amplitude * RED_RATIO } else { 0.0 };

        SensorFrame {
            ecg,
            ppg_ir,
            ppg_red,
            timestamp_ms: t,
        }
    }

    fn channel_noise(&mut self, t: u64) -> f32 {
        let mut noise = 0.0;
        if self.config.noise.gaussian_std > 0.0 {
            noise += self.noise_dist.sample(&mut self.rng);
        }
        noise += self.config.noise.baseline_wander
            * (2.0 * std::f32::consts::PI * 0.1 * t as f32 / 1000.0).sin();
        if self.rng.gen::<f32>() < self.config.noise.motion_artifact_prob {
            noise += self.config.noise.motion_artifact_amp * self.rng.gen_range(-1.0..1.0);
        }
        noise
    }
}
