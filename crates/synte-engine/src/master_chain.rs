//! Master chain (component G): DC block → frequency-weighted limiter →
//! stereo output low-pass → fade envelope → dither → clip.
//!
//! Format conversion to the soundcard's integer sample format happens one
//! layer up, in `synte-io`, since it's a wire-format concern rather than a
//! DSP stage.

use synte_core::math::{clip_sym, db_to_linear};
use synte_core::{DcBlocker, HighShelf, Noise, OnePole};

/// Default limiter release time, 1 s (§4.G).
pub const DEFAULT_RELEASE_MS: f64 = 1000.0;
/// Minimum allowed release time.
pub const MIN_RELEASE_MS: f64 = 200.0;
/// Default fade duration on pause/exit, 325 ms (§4.G).
pub const DEFAULT_FADE_MS: f64 = 325.0;
/// Maximum configurable fade duration, ~104 s (§4.G).
pub const MAX_FADE_MS: f64 = 104_000.0;

/// The 70 dB decay target used to derive the limiter's release coefficient.
const RELEASE_DECAY_DB: f64 = 70.0;

/// Frequency-weighted peak limiter with instantaneous attack and a
/// one-pole-smoothed VCA.
struct Limiter {
    shelf: HighShelf,
    envelope: f64,
    release_coeff: f64,
    gain_smoother: OnePole,
    sample_rate: f64,
    release_ms: f64,
    /// Last applied gain, in dB, for telemetry's `grMeter`.
    gr_db: f64,
}

impl Limiter {
    fn new(sample_rate: f64) -> Self {
        // Fast fixed smoothing on the applied gain itself (distinct from
        // the release parameter, which governs the envelope follower).
        let gain_smoother = OnePole::new(sample_rate, 200.0);
        let mut limiter = Self {
            shelf: HighShelf::new(sample_rate, 2000.0, 6.0),
            envelope: 0.0,
            release_coeff: 0.0,
            gain_smoother,
            sample_rate,
            release_ms: DEFAULT_RELEASE_MS,
            gr_db: 0.0,
        };
        limiter.set_release(DEFAULT_RELEASE_MS);
        limiter
    }

    fn set_release(&mut self, ms: f64) {
        let ms = ms.clamp(MIN_RELEASE_MS, 60_000.0);
        self.release_ms = ms;
        let samples = (ms / 1000.0) * self.sample_rate;
        // coeff^samples = 10^(-70/20) ⇒ coeff = 10^(-70 / (20 * samples))
        self.release_coeff = 10f64.powf(-RELEASE_DECAY_DB / (20.0 * samples));
    }

    fn process(&mut self, x: f64) -> f64 {
        let emphasized = self.shelf.process(x).abs();
        if emphasized > self.envelope {
            self.envelope = emphasized; // instantaneous attack
        } else {
            self.envelope *= self.release_coeff;
        }
        let target_gain = if self.envelope > 1.0 {
            1.0 / self.envelope
        } else {
            1.0
        };
        let applied = self.gain_smoother.process(target_gain);
        self.gr_db = 20.0 * applied.max(1e-12).log10();
        x * applied
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FadeState {
    Playing,
    FadingOut { elapsed: f64, total: f64 },
    Paused,
    FadingIn { elapsed: f64, total: f64 },
}

/// Fade envelope applied on pause/exit and on resume (§4.G).
struct FadeEnvelope {
    state: FadeState,
    fade_ms: f64,
    sample_rate: f64,
    requested_pause: bool,
}

impl FadeEnvelope {
    fn new(sample_rate: f64) -> Self {
        Self {
            state: FadeState::Playing,
            fade_ms: DEFAULT_FADE_MS,
            sample_rate,
            requested_pause: false,
        }
    }

    fn set_fade_ms(&mut self, ms: f64) {
        self.fade_ms = ms.clamp(0.0, MAX_FADE_MS);
    }

    fn set_paused(&mut self, paused: bool) {
        self.requested_pause = paused;
        let total = (self.fade_ms / 1000.0) * self.sample_rate;
        self.state = match (paused, self.state) {
            (true, FadeState::Paused) | (true, FadeState::FadingOut { .. }) => self.state,
            (true, _) => FadeState::FadingOut { elapsed: 0.0, total },
            (false, FadeState::Playing) | (false, FadeState::FadingIn { .. }) => self.state,
            (false, _) => FadeState::FadingIn { elapsed: 0.0, total },
        };
    }

    fn step_gain(&mut self) -> f64 {
        match &mut self.state {
            FadeState::Playing => 1.0,
            FadeState::Paused => 0.0,
            FadeState::FadingOut { elapsed, total } => {
                let g = if *total <= 0.0 {
                    0.0
                } else {
                    (1.0 - *elapsed / *total).clamp(0.0, 1.0)
                };
                *elapsed += 1.0;
                if *elapsed >= *total {
                    self.state = FadeState::Paused;
                }
                g
            }
            FadeState::FadingIn { elapsed, total } => {
                let g = if *total <= 0.0 {
                    1.0
                } else {
                    (*elapsed / *total).clamp(0.0, 1.0)
                };
                *elapsed += 1.0;
                if *elapsed >= *total {
                    self.state = FadeState::Playing;
                }
                g
            }
        }
    }

    fn is_silent(&self) -> bool {
        self.state == FadeState::Paused
    }

    fn is_paused(&self) -> bool {
        self.requested_pause
    }
}

/// The full master signal chain, owning all its per-sample state.
pub struct MasterChain {
    dc_blocker: DcBlocker,
    limiter: Limiter,
    output_lpf_l: (OnePole, OnePole),
    output_lpf_r: (OnePole, OnePole),
    fade: FadeEnvelope,
    dither_noise: Noise,
    sample_rate: f64,
}

/// Output stereo low-pass corner, ~12 kHz, independent of sample rate
/// (§4.G). Implemented as two cascaded one-poles for a steeper rolloff.
const OUTPUT_LPF_HZ: f64 = 12_000.0;

impl MasterChain {
    pub fn new(sample_rate: f64) -> Self {
        let lpf_stage = || OnePole::new(sample_rate, OUTPUT_LPF_HZ.min(sample_rate / 2.0 - 1.0));
        Self {
            dc_blocker: DcBlocker::new(sample_rate),
            limiter: Limiter::new(sample_rate),
            output_lpf_l: (lpf_stage(), lpf_stage()),
            output_lpf_r: (lpf_stage(), lpf_stage()),
            fade: FadeEnvelope::new(sample_rate),
            dither_noise: Noise::new(0xD17E_5EED),
            sample_rate,
        }
    }

    pub fn set_release_ms(&mut self, ms: f64) {
        self.limiter.set_release(ms);
    }

    pub fn set_fade_ms(&mut self, ms: f64) {
        self.fade.set_fade_ms(ms);
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.fade.set_paused(paused);
    }

    /// Whether `:pause` is the last-requested state, independent of
    /// whether the fade-out has finished ramping to silence yet.
    pub fn is_paused(&self) -> bool {
        self.fade.is_paused()
    }

    pub fn gain_reduction_db(&self) -> f64 {
        self.limiter.gr_db
    }

    /// Run one frame's mono sum through the full chain, producing a
    /// dithered, clipped stereo pair in `[-1, 1]`.
    pub fn process(&mut self, mono_sum: f64) -> (f64, f64) {
        let blocked = self.dc_blocker.process(mono_sum);
        let limited = self.limiter.process(blocked);
        let fade_gain = self.fade.step_gain();
        let faded = limited * fade_gain;

        let l = self.output_lpf_l.1.process(self.output_lpf_l.0.process(faded));
        let r = self.output_lpf_r.1.process(self.output_lpf_r.0.process(faded));

        if self.fade.is_silent() {
            return (0.0, 0.0);
        }

        // Triangular dither: sum of two independent uniform samples, ~1
        // LSB at the eventual output bit depth (left to the format
        // converter to scale; here expressed relative to a unit full-scale).
        let lsb = 1.0 / (1u64 << 15) as f64; // reference depth for dither magnitude
        let dither = |noise: &mut Noise| (noise.uniform() + noise.uniform()) * 0.5 * lsb;
        let l = clip_sym(l + dither(&mut self.dither_noise), 1.0);
        let r = clip_sym(r + dither(&mut self.dither_noise), 1.0);
        (l, r)
    }
}

/// Normalise a mono frame sum per §4.F step 3: divide by the active count
/// if more than 4 listings are contributing, else divide by 4 flat.
pub fn normalize_sum(sum: f64, active_count: usize) -> f64 {
    let divisor = if active_count > 4 { active_count as f64 } else { 4.0 };
    sum / divisor
}

/// Convert a decibel value to a linear gain, exposed for the `:mc` command
/// path and telemetry display.
pub fn db_gain(db: f64) -> f64 {
    db_to_linear(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_divides_by_four_below_threshold() {
        assert!((normalize_sum(2.0, 3) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn normalize_divides_by_count_above_threshold() {
        assert!((normalize_sum(10.0, 5) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn limiter_passes_small_signals_near_unity_gain() {
        let mut chain = MasterChain::new(48000.0);
        // Warm up the DC blocker/limiter state with a steady small signal.
        let mut last = (0.0, 0.0);
        for _ in 0..2000 {
            last = chain.process(0.1);
        }
        assert!(last.0.abs() < 0.2);
    }

    #[test]
    fn limiter_engages_on_overload() {
        let mut chain = MasterChain::new(48000.0);
        let mut last = (0.0, 0.0);
        for _ in 0..4000 {
            last = chain.process(3.0);
        }
        assert!(last.0 <= 1.0 && last.0 >= -1.0);
        assert!(chain.gain_reduction_db() < -1.0);
    }

    #[test]
    fn paused_output_fades_to_silence() {
        let mut chain = MasterChain::new(48000.0);
        chain.set_fade_ms(10.0);
        chain.set_paused(true);
        let mut last = (1.0, 1.0);
        for _ in 0..48000 {
            last = chain.process(0.5);
        }
        assert_eq!(last, (0.0, 0.0));
    }

    #[test]
    fn output_never_exceeds_unity() {
        let mut chain = MasterChain::new(48000.0);
        for _ in 0..1000 {
            let (l, r) = chain.process(10.0);
            assert!(l.abs() <= 1.0);
            assert!(r.abs() <= 1.0);
        }
    }
}
