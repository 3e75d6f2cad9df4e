//! `wavs/*.wav` loading for the `wav name` opcode. Grounded on the teacher's
//! `sonido-io::wav` (hound-backed read/write, mono mixdown by channel
//! averaging); the policy differences are Syntə's own: only the first four
//! seconds are read, and only integer PCM is accepted (no `IeeeFloat`
//! input), per the spec's Non-goal "sample-rate conversion of loaded wavs"
//! and its explicit "16/24-bit PCM ... first 4 s only" wording.

use std::path::Path;

use crate::{Error, Result};

/// Truncation window applied to every loaded wav, per spec.md §7.
const MAX_LOAD_SECONDS: f64 = 4.0;

/// Decode `path` as mono `f64` samples in `[-1.0, 1.0]`, keeping at most the
/// first [`MAX_LOAD_SECONDS`] seconds. Stereo input is averaged to mono;
/// anything other than 16- or 24-bit integer PCM is rejected rather than
/// silently reinterpreted.
pub fn load_wav_mono(path: &Path) -> Result<Vec<f64>> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    if spec.sample_format != hound::SampleFormat::Int || !matches!(spec.bits_per_sample, 16 | 24) {
        return Err(Error::UnsupportedFormat(format!(
            "{}-bit {:?} (want 16 or 24-bit PCM)",
            spec.bits_per_sample, spec.sample_format
        )));
    }

    let channels = spec.channels.max(1) as usize;
    let max_frames = (MAX_LOAD_SECONDS * spec.sample_rate as f64).round() as usize;
    let scale = (1i64 << (spec.bits_per_sample - 1)) as f64;

    let mut samples = Vec::with_capacity(max_frames);
    let mut frame = Vec::with_capacity(channels);
    for sample in reader.into_samples::<i32>() {
        if samples.len() >= max_frames {
            break;
        }
        frame.push(sample? as f64 / scale);
        if frame.len() == channels {
            let mono = frame.iter().sum::<f64>() / channels as f64;
            samples.push(mono);
            frame.clear();
        }
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_test_wav(path: &Path, bits: u16, channels: u16, frames: &[Vec<i32>]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 48_000,
            bits_per_sample: bits,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for frame in frames {
            for &s in frame {
                writer.write_sample(s).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn mono_16bit_round_trips_within_quantization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path: PathBuf = dir.path().join("mono.wav");
        write_test_wav(&path, 16, 1, &[vec![16384], vec![-16384], vec![0]]);
        let samples = load_wav_mono(&path).unwrap();
        assert_eq!(samples.len(), 3);
        assert!((samples[0] - 0.5).abs() < 1e-3);
        assert!((samples[1] + 0.5).abs() < 1e-3);
        assert_eq!(samples[2], 0.0);
    }

    #[test]
    fn stereo_is_averaged_to_mono() {
        let dir = tempfile::tempdir().unwrap();
        let path: PathBuf = dir.path().join("stereo.wav");
        write_test_wav(&path, 16, 2, &[vec![16384, 0]]);
        let samples = load_wav_mono(&path).unwrap();
        assert_eq!(samples.len(), 1);
        assert!((samples[0] - 0.25).abs() < 1e-3);
    }

    #[test]
    fn load_is_truncated_to_four_seconds() {
        let dir = tempfile::tempdir().unwrap();
        let path: PathBuf = dir.path().join("long.wav");
        let frames: Vec<Vec<i32>> = (0..48_000 * 5).map(|_| vec![0]).collect();
        write_test_wav(&path, 16, 1, &frames);
        let samples = load_wav_mono(&path).unwrap();
        assert_eq!(samples.len(), 48_000 * 4);
    }

    #[test]
    fn float_format_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path: PathBuf = dir.path().join("float.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 48_000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0.5f32).unwrap();
        writer.finalize().unwrap();

        assert!(load_wav_mono(&path).is_err());
    }
}
