//! Shared scalar math: dB conversion, denormal flushing, saturation curves.
//!
//! The kernel carries every signal as `f64` (§3 "one 64-bit float per slot"),
//! so all helpers here operate on `f64` even though the final master-chain
//! output is narrowed to `f32`/integer PCM for the soundcard.

use libm::{exp, tanh};

/// Smallest magnitude treated as non-denormal; anything below is flushed to zero.
const DENORMAL_THRESHOLD: f64 = 1.0e-30;

/// Convert a decibel value to a linear amplitude multiplier.
///
/// `10^(db/20)`, matching the `db` unit suffix of the value parser (§4.A).
#[inline]
#[must_use]
pub fn db_to_linear(db: f64) -> f64 {
    exp(db * core::f64::consts::LN_10 / 20.0)
}

/// Flush a value to zero if its magnitude is below the denormal threshold.
///
/// Denormal floats can stall SSE/ARM FPUs by orders of magnitude; every
/// recursive filter state in this crate is flushed after each update.
#[inline]
#[must_use]
pub fn flush_denormal(x: f64) -> f64 {
    if x.abs() < DENORMAL_THRESHOLD { 0.0 } else { x }
}

/// Soft-saturating tanh curve used by the tape's feedback path (§4.F `tape`).
///
/// Tape writes feed back through this curve so that runaway positive
/// feedback settles to a bounded amplitude instead of diverging.
#[inline]
#[must_use]
pub fn soft_saturate(x: f64) -> f64 {
    tanh(x)
}

/// Symmetric hard clip to `[-limit, limit]`. `limit <= 0.0` clips to `[0, 1]`
/// instead, matching the `clip k` opcode's `k = 0` special case (§4.F).
#[inline]
#[must_use]
pub fn clip_sym(x: f64, limit: f64) -> f64 {
    if limit <= 0.0 {
        x.clamp(0.0, 1.0)
    } else {
        x.clamp(-limit, limit)
    }
}

/// Frequency-to-coefficient helper used by the `f2c` opcode: `1 - e^(-2π|x|)`.
#[inline]
#[must_use]
pub fn freq_to_coeff(x: f64) -> f64 {
    1.0 - exp(-core::f64::consts::TAU * x.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_zero_is_unity() {
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn db_minus_six_halves_amplitude_approx() {
        assert!((db_to_linear(-6.0) - 0.5012).abs() < 0.001);
    }

    #[test]
    fn denormals_flush_to_zero() {
        assert_eq!(flush_denormal(1.0e-35), 0.0);
        assert_eq!(flush_denormal(0.5), 0.5);
    }

    #[test]
    fn clip_sym_zero_limit_is_unit_range() {
        assert_eq!(clip_sym(1.5, 0.0), 1.0);
        assert_eq!(clip_sym(-0.5, 0.0), 0.0);
    }

    #[test]
    fn clip_sym_nonzero_limit_is_symmetric() {
        assert_eq!(clip_sym(2.0, 0.8), 0.8);
        assert_eq!(clip_sym(-2.0, 0.8), -0.8);
    }

    #[test]
    fn soft_saturate_bounds_large_input() {
        assert!(soft_saturate(100.0) <= 1.0);
        assert!(soft_saturate(-100.0) >= -1.0);
    }
}
