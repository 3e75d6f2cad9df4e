//! Sample format conversion: the master chain hands off a dithered,
//! clipped `[-1.0, 1.0]` stereo pair (see `synte_engine::master_chain`'s
//! doc comment), and this is the "one layer up" it defers to — signed
//! little-endian integer PCM at a configurable bit depth, clipped to the
//! target's integer range after scaling.

/// Output bit depth for the soundcard stream or a recorded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleDepth {
    Eight,
    Sixteen,
    TwentyFour,
    ThirtyTwo,
}

impl SampleDepth {
    /// Full-scale magnitude for this depth (one-sided, matching the
    /// asymmetric two's-complement range: `i16::MIN` is `-32768` but we
    /// scale against `32767` so `+1.0` and `-1.0` are both representable
    /// without overflow).
    fn full_scale(self) -> f64 {
        match self {
            SampleDepth::Eight => i8::MAX as f64,
            SampleDepth::Sixteen => i16::MAX as f64,
            SampleDepth::TwentyFour => ((1i32 << 23) - 1) as f64,
            SampleDepth::ThirtyTwo => i32::MAX as f64,
        }
    }

    fn int_range(self) -> (i64, i64) {
        match self {
            SampleDepth::Eight => (i8::MIN as i64, i8::MAX as i64),
            SampleDepth::Sixteen => (i16::MIN as i64, i16::MAX as i64),
            SampleDepth::TwentyFour => (-(1i64 << 23), (1i64 << 23) - 1),
            SampleDepth::ThirtyTwo => (i32::MIN as i64, i32::MAX as i64),
        }
    }
}

/// Scale `x` (expected in `[-1.0, 1.0]`) to `depth`'s integer range and
/// clip, rather than wrap, anything that overshoots after scaling.
pub fn quantize(x: f64, depth: SampleDepth) -> i32 {
    let (lo, hi) = depth.int_range();
    let scaled = (x * depth.full_scale()).round() as i64;
    scaled.clamp(lo, hi) as i32
}

/// Convert one stereo `f64` frame into interleaved little-endian bytes at
/// `depth`, appending to `out`. Used by the cpal output callback, which
/// wants raw bytes for the format it opened the stream with.
pub fn push_frame_le(out: &mut Vec<u8>, left: f64, right: f64, depth: SampleDepth) {
    for sample in [left, right] {
        let q = quantize(sample, depth);
        match depth {
            SampleDepth::Eight => out.push(q as i8 as u8),
            SampleDepth::Sixteen => out.extend_from_slice(&(q as i16).to_le_bytes()),
            SampleDepth::TwentyFour => out.extend_from_slice(&q.to_le_bytes()[..3]),
            SampleDepth::ThirtyTwo => out.extend_from_slice(&q.to_le_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_scale_clips_rather_than_wraps() {
        assert_eq!(quantize(2.0, SampleDepth::Sixteen), i16::MAX as i32);
        assert_eq!(quantize(-2.0, SampleDepth::Sixteen), i16::MIN as i32);
    }

    #[test]
    fn zero_maps_to_zero_at_every_depth() {
        for depth in [
            SampleDepth::Eight,
            SampleDepth::Sixteen,
            SampleDepth::TwentyFour,
            SampleDepth::ThirtyTwo,
        ] {
            assert_eq!(quantize(0.0, depth), 0);
        }
    }

    #[test]
    fn sixteen_bit_frame_is_four_bytes() {
        let mut out = Vec::new();
        push_frame_le(&mut out, 0.5, -0.5, SampleDepth::Sixteen);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn twenty_four_bit_frame_is_six_bytes() {
        let mut out = Vec::new();
        push_frame_le(&mut out, 0.5, -0.5, SampleDepth::TwentyFour);
        assert_eq!(out.len(), 6);
    }
}
