//! Audio I/O for Syntə (components outside the engine's Non-goals: WAV
//! decoding, soundcard backends, the `audio-recordings/*.wav` writer).
//!
//! Grounded on the teacher's `sonido-io`: an object-safe `AudioBackend`
//! trait, a `cpal`-backed implementation, and `hound`-backed WAV helpers.

mod backend;
mod cpal_backend;
pub mod format;
mod recorder;
mod wav;

pub use backend::{AudioBackend, BackendStreamConfig, ErrorCallback, OutputCallback, StreamHandle};
pub use cpal_backend::CpalBackend;
pub use recorder::Recorder;
pub use wav::load_wav_mono;

/// Errors surfaced by the I/O layer. Per spec.md's failure-mode table,
/// `LoadError` (wav/config) degrades silently at the call site and
/// `BackendError` is fatal at open time; this enum distinguishes the two so
/// callers can apply that policy without string-matching.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("wav error: {0}")]
    Wav(#[from] hound::Error),
    #[error("stream error: {0}")]
    Stream(String),
    #[error("no output device available")]
    NoDevice,
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
    #[error("device not found: {0}")]
    DeviceNotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
