//! `audio-recordings/<name>.wav` writer (spec.md §7): 32-bit stereo PCM at
//! 48 kHz, written incrementally while recording is active. `hound`'s
//! `WavWriter` already emits the fixed 44-byte canonical RIFF header the
//! spec describes and patches the chunk-size fields on
//! [`Recorder::close`] (its `finalize`), so no hand-rolled header writer is
//! needed here — this is the same crate the teacher's `sonido-io::wav`
//! uses for file I/O, just driven sample-by-sample instead of buffer-at-once.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::format::{quantize, SampleDepth};
use crate::Result;

const RECORD_SAMPLE_RATE: u32 = 48_000;
const RECORD_BITS: u16 = 32;

/// An open `audio-recordings/<name>.wav` capture in progress.
pub struct Recorder {
    writer: hound::WavWriter<BufWriter<File>>,
}

impl Recorder {
    /// Create (or truncate) the recording file at `path`.
    pub fn create(path: &Path) -> Result<Self> {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: RECORD_SAMPLE_RATE,
            bits_per_sample: RECORD_BITS,
            sample_format: hound::SampleFormat::Int,
        };
        let writer = hound::WavWriter::create(path, spec)?;
        Ok(Self { writer })
    }

    /// Append one stereo frame, clipping to `[-1.0, 1.0]` before scaling.
    pub fn write_frame(&mut self, left: f64, right: f64) -> Result<()> {
        self.writer.write_sample(quantize(left, SampleDepth::ThirtyTwo))?;
        self.writer.write_sample(quantize(right, SampleDepth::ThirtyTwo))?;
        Ok(())
    }

    /// Patch the RIFF/data chunk-size fields and flush to disk.
    pub fn close(self) -> Result<()> {
        self.writer.finalize()?;
        Ok(())
    }
}
