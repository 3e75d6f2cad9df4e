//! The pluggable output-device contract. Syntə's spec describes soundcard
//! backends as each exposing the same `open(sr, channels) -> (writeFrame,
//! close)` shape; [`AudioBackend`] is that contract expressed as an
//! object-safe trait so a test harness can swap in a fake backend without
//! touching [`crate::cpal_backend::CpalBackend`].

use std::fmt;

/// Callback invoked on the backend's real-time thread to fill one buffer of
/// interleaved output samples. Must never allocate or block.
pub type OutputCallback = Box<dyn FnMut(&mut [f32]) + Send>;

/// Callback invoked when the backend reports a stream error outside the
/// real-time callback (device unplugged, format renegotiation failure).
pub type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Requested stream parameters. A backend may not honor all of them exactly
/// (see [`AudioBackend::actual_sample_rate`]).
#[derive(Debug, Clone)]
pub struct BackendStreamConfig {
    pub sample_rate: u32,
    pub buffer_size: u32,
    pub channels: u16,
    pub device_name: Option<String>,
}

impl Default for BackendStreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            buffer_size: 512,
            channels: 2,
            device_name: None,
        }
    }
}

/// RAII handle for a running stream: dropping it stops the stream. Wraps the
/// backend-specific stream type behind a type-erased box so callers don't
/// need to name `cpal::Stream` (or any future backend's equivalent type).
pub struct StreamHandle {
    _inner: Box<dyn Send>,
}

impl StreamHandle {
    pub fn new(inner: impl Send + 'static) -> Self {
        Self {
            _inner: Box::new(inner),
        }
    }
}

impl fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// A source of real-time audio output. One listing-per-frame mix comes out
/// of the kernel as an `f64` stereo pair; the backend is where that pair
/// gets converted (via [`crate::format`]) and pushed to the soundcard.
pub trait AudioBackend: Send {
    /// Human-readable backend name, for telemetry and `--verbose` logs.
    fn name(&self) -> &str;

    /// List output device names this backend can see.
    fn list_devices(&self) -> Vec<String>;

    /// Open an output stream. `callback` is invoked on the backend's
    /// real-time thread once per buffer with an interleaved `f32` slice to
    /// fill; `error_callback` is invoked asynchronously on stream faults.
    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        callback: OutputCallback,
        error_callback: ErrorCallback,
    ) -> crate::Result<StreamHandle>;

    /// The sample rate the stream actually opened at, which may differ from
    /// `config.sample_rate` if the device doesn't support it exactly.
    /// Default: assume the request was honored.
    fn actual_sample_rate(&self, config: &BackendStreamConfig) -> u32 {
        config.sample_rate
    }
}
