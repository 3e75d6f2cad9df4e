//! [`cpal`](https://docs.rs/cpal)-backed [`AudioBackend`] implementation.
//! Adapted from the teacher's `sonido-io::cpal_backend` and
//! `sonido-io::stream::AudioStream::run_output` (the output-only, no-input
//! streaming shape Syntə needs — the engine has no audio input).

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::Host;

use crate::backend::{AudioBackend, BackendStreamConfig, ErrorCallback, OutputCallback, StreamHandle};
use crate::{Error, Result};

/// Output backend built on the system's default `cpal` host.
pub struct CpalBackend {
    host: Host,
}

impl CpalBackend {
    pub fn new() -> Self {
        let host = cpal::default_host();
        tracing::info!(host = host.id().name(), "opened cpal host");
        Self { host }
    }

    fn find_output_device(&self, name: &str) -> Result<cpal::Device> {
        let needle = name.to_lowercase();
        self.host
            .output_devices()
            .map_err(|e| Error::Stream(e.to_string()))?
            .find(|d| {
                d.name()
                    .map(|n| n.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
            .ok_or_else(|| Error::DeviceNotFound(name.to_string()))
    }

    fn resolve_device(&self, config: &BackendStreamConfig) -> Result<cpal::Device> {
        match &config.device_name {
            Some(name) => self.find_output_device(name),
            None => self.host.default_output_device().ok_or(Error::NoDevice),
        }
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for CpalBackend {
    fn name(&self) -> &str {
        "cpal"
    }

    fn list_devices(&self) -> Vec<String> {
        self.host
            .output_devices()
            .map(|devices| devices.filter_map(|d| d.name().ok()).collect())
            .unwrap_or_default()
    }

    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        mut callback: OutputCallback,
        mut error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let device = self.resolve_device(config)?;
        let stream_config = cpal::StreamConfig {
            channels: config.channels,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(config.buffer_size),
        };

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                    // The audio thread must never unwind past this boundary:
                    // a panicking callback would otherwise abort the process
                    // with no diagnostic (§5 ambient robustness).
                    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                        callback(data);
                    }));
                    if result.is_err() {
                        data.fill(0.0);
                    }
                },
                move |err| error_callback(&err.to_string()),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        stream.play().map_err(|e| Error::Stream(e.to_string()))?;
        Ok(StreamHandle::new(stream))
    }

    fn actual_sample_rate(&self, config: &BackendStreamConfig) -> u32 {
        config.sample_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_name_is_cpal() {
        let backend = CpalBackend::new();
        assert_eq!(backend.name(), "cpal");
    }

    #[test]
    fn list_devices_does_not_panic() {
        let backend = CpalBackend::new();
        let _ = backend.list_devices();
    }
}
