//! Audio thread (§5): builds the DSP kernel and the soundcard stream.
//!
//! The kernel itself never runs on a thread this crate spawns directly —
//! `cpal`'s backend owns the real-time callback thread once the stream is
//! built. This module's job is to assemble everything the callback
//! closure captures (the kernel, the mouse/telemetry publish points, and
//! an optional session recorder) and hand back a [`StreamHandle`] whose
//! lifetime controls the stream's.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use synte_engine::{Inbox, Kernel};
use synte_io::{AudioBackend, BackendStreamConfig, Recorder, StreamHandle};
use synte_session::{FileTelemetryWriter, LevelMirror, MouseState, TelemetryPublisher, TelemetrySnapshot};

/// Peak meter: tracks the largest absolute sample seen since the last
/// telemetry publish, then resets (§4.H `peakL`/`peakR` are a per-window
/// peak, not an all-time one).
#[derive(Default)]
struct PeakMeter {
    left: f64,
    right: f64,
}

impl PeakMeter {
    fn observe(&mut self, left: f64, right: f64) {
        self.left = self.left.max(left.abs());
        self.right = self.right.max(right.abs());
    }

    fn take(&mut self) -> (f64, f64) {
        (std::mem::take(&mut self.left), std::mem::take(&mut self.right))
    }
}

/// Everything needed to open the output stream and start processing
/// frames (§5 "audio thread").
pub struct AudioThreadConfig {
    pub sample_rate: u32,
    pub buffer_size: u32,
    pub mackie: bool,
    pub device_name: Option<String>,
    pub temp_dir: PathBuf,
    pub record_path: Option<PathBuf>,
}

/// Spawn the output stream. Returns the [`StreamHandle`] (drop it to stop
/// audio) plus the shared state the editor/main loop reads from.
///
/// `verbose` is shared with the editor thread: `:verbose` toggles it there,
/// this callback only reads it when building each telemetry snapshot.
pub fn spawn(
    config: AudioThreadConfig,
    inbox: Inbox,
    backend: &dyn AudioBackend,
    mouse: Arc<MouseState>,
    telemetry: Arc<TelemetryPublisher>,
    levels: Arc<LevelMirror>,
    verbose: Arc<AtomicBool>,
) -> synte_io::Result<StreamHandle> {
    let sample_rate = config.sample_rate;
    let channels = if config.mackie { 4 } else { 2 };
    let stream_config = BackendStreamConfig {
        sample_rate,
        buffer_size: config.buffer_size,
        channels,
        device_name: config.device_name.clone(),
    };

    let mut kernel = Kernel::new(f64::from(sample_rate), inbox);
    let mut recorder = match &config.record_path {
        Some(path) => match Recorder::create(path) {
            Ok(recorder) => Some(recorder),
            Err(err) => {
                tracing::warn!(%err, ?path, "failed to open audio recording; continuing without it");
                None
            }
        },
        None => None,
    };
    let mut telemetry_writer = FileTelemetryWriter::new(&config.temp_dir);
    let mut peaks = PeakMeter::default();
    let start = Instant::now();

    let output = move |data: &mut [f32]| {
        let mouse_snapshot = mouse.snapshot();
        kernel.set_external_inputs(
            mouse_snapshot.mousex,
            mouse_snapshot.mousey,
            mouse_snapshot.butt1,
            mouse_snapshot.butt2,
            mouse_snapshot.butt3,
        );

        for frame in data.chunks_mut(usize::from(channels)) {
            let (left, right) = kernel.process_frame();
            peaks.observe(left, right);

            if let Some(recorder) = recorder.as_mut() {
                if let Err(err) = recorder.write_frame(left, right) {
                    tracing::warn!(%err, "recording write failed; dropping recorder");
                }
            }

            frame[0] = left as f32;
            if frame.len() > 1 {
                frame[1] = right as f32;
            }
            // `--mackie` duplicates the stereo pair onto channels 3/4 for
            // a 4-channel interface, rather than mixing a distinct feed.
            if frame.len() > 3 {
                frame[2] = left as f32;
                frame[3] = right as f32;
            }
        }

        if let Some(warning) = kernel.overload_warning.take() {
            tracing::warn!("{warning}");
        }

        let (peak_l, peak_r) = peaks.take();
        let telemetry_snapshot = TelemetrySnapshot {
            listings: kernel.listing_count(),
            mutes: kernel.mute_flags(),
            verbose: verbose.load(Ordering::Relaxed),
            load: kernel.load_fraction(),
            peak_l,
            peak_r,
            gr_meter: kernel.gain_reduction_db(),
            mouse_x: mouse_snapshot.mousex,
            mouse_y: mouse_snapshot.mousey,
            elapsed: start.elapsed().as_secs_f64(),
            paused: kernel.paused(),
            sync: kernel.sync_active(),
        };
        telemetry.publish(telemetry_snapshot.clone());
        if let Err(err) = telemetry_writer.maybe_write(&telemetry_snapshot, Instant::now()) {
            tracing::warn!(%err, "telemetry.json write failed");
        }
        levels.publish(kernel.listing_levels());
    };

    let error_callback = move |message: &str| {
        tracing::error!(message, "audio backend stream error");
    };

    backend.build_output_stream(&stream_config, Box::new(output), Box::new(error_callback))
}
