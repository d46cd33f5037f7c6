//! Per-channel smoothing applied before peak detection

/// Smoothing window length in samples.
pub const FILTER_WINDOW: usize = 10;

/// Trailing moving-average filter over a fixed window.
///
/// The window is pre-zeroed, so early outputs are pulled toward zero until
/// the window fills; deterministic and O(window) per sample. Not a true
/// bandpass; a proper IIR/FIR stage can replace it without changing the
/// contract.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    window: [f32; FILTER_WINDOW],
    index: usize,
}

impl MovingAverage {
    pub fn new() -> Self {
        Self {
            window: [0.0; FILTER_WINDOW],
            index: 0,
        }
    }

    /// Push one raw sample and return the smoothed value.
    pub fn apply(&mut self, raw: f32) -> f32 {
        self.window[self.index] = raw;
        self.index = (self.index + 1) % FILTER_WINDOW;

        let sum: f32 = self.window.iter().sum();
        sum / FILTER_WINDOW as f32
    }

    /// Zero the window without reallocation.
    pub fn reset(&mut self) {
        self.window = [0.0; FILTER_WINDOW];
        self.index = 0;
    }
}

impl Default for MovingAverage {
    fn default() -> Self {
        Self::new()
    }
}
