//! DC blocking filter for the master chain (§4.F step 4).
//!
//! First-order highpass: `y[n] = x[n] - x[n-1] + R*y[n-1]`. Carried from the
//! teacher's `DcBlocker`, retuned to the spec's ~4.6 Hz corner (the teacher
//! defaults to ~7 Hz).

use core::f64::consts::PI;

/// DC blocking filter with a fixed cutoff near 4.6 Hz.
#[derive(Debug, Clone)]
pub struct DcBlocker {
    coeff: f64,
    x_prev: f64,
    y_prev: f64,
}

impl DcBlocker {
    const DEFAULT_CUTOFF_HZ: f64 = 4.6;

    /// Create a new DC blocker for the given sample rate.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            coeff: Self::calculate_coeff(Self::DEFAULT_CUTOFF_HZ, sample_rate),
            x_prev: 0.0,
            y_prev: 0.0,
        }
    }

    /// Process one sample.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let output = input - self.x_prev + self.coeff * self.y_prev;
        self.x_prev = input;
        self.y_prev = output;
        output
    }

    /// Reset filter state to zero.
    pub fn reset(&mut self) {
        self.x_prev = 0.0;
        self.y_prev = 0.0;
    }

    /// Update the sample rate, keeping the ~4.6 Hz corner.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.coeff = Self::calculate_coeff(Self::DEFAULT_CUTOFF_HZ, sample_rate);
    }

    fn calculate_coeff(cutoff_hz: f64, sample_rate: f64) -> f64 {
        let r = 1.0 - (2.0 * PI * cutoff_hz / sample_rate);
        r.clamp(0.9, 0.9999)
    }
}
