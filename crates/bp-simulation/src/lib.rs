//! BP-Simulation: synthetic cardiac signal generation
//!
//! Provides synchronized ECG/PPG simulation for testing and development.

pub mod cardiac;
pub mod stream;

pub use cardiac::*;
pub use stream::*;
