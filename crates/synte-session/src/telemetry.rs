//! Telemetry publisher (component H): every ~500 ms, publish a snapshot of
//! listing state to a form other processes/threads can poll without ever
//! blocking the audio thread (§4.H).
//!
//! Grounded on the teacher's `sonido-gui::atomic_param_bridge` pattern:
//! readers go through [`ArcSwap::load`] (wait-free), the publisher replaces
//! the whole snapshot with [`ArcSwap::store`] rather than mutating fields
//! in place, so a reader never observes a half-written snapshot.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

/// Snapshot published every ~500 ms (§4.H): `{listings, mutes, verbose,
/// load, peakL, peakR, grMeter, mouseX, mouseY, elapsed, paused, sync}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TelemetrySnapshot {
    pub listings: usize,
    pub mutes: Vec<bool>,
    pub verbose: bool,
    pub load: f64,
    #[serde(rename = "peakL")]
    pub peak_l: f64,
    #[serde(rename = "peakR")]
    pub peak_r: f64,
    #[serde(rename = "grMeter")]
    pub gr_meter: f64,
    #[serde(rename = "mouseX")]
    pub mouse_x: f64,
    #[serde(rename = "mouseY")]
    pub mouse_y: f64,
    pub elapsed: f64,
    pub paused: bool,
    pub sync: bool,
}

/// In-process publish point: the audio thread calls [`publish`], any number
/// of readers (an `info`/`listing` display program sharing the process)
/// call [`current`] without touching the filesystem.
///
/// [`publish`]: TelemetryPublisher::publish
/// [`current`]: TelemetryPublisher::current
pub struct TelemetryPublisher {
    snapshot: ArcSwap<TelemetrySnapshot>,
}

impl TelemetryPublisher {
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(TelemetrySnapshot::default()),
        }
    }

    pub fn publish(&self, snapshot: TelemetrySnapshot) {
        self.snapshot.store(Arc::new(snapshot));
    }

    pub fn current(&self) -> Arc<TelemetrySnapshot> {
        self.snapshot.load_full()
    }
}

impl Default for TelemetryPublisher {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives the ~500 ms `telemetry.json` write-then-rename. Stale writes are
/// acceptable (§4.H), so this only gates on wall-clock elapsed time; it
/// never blocks waiting for anything else.
pub struct FileTelemetryWriter {
    path: PathBuf,
    interval: Duration,
    last_write: Option<Instant>,
}

impl FileTelemetryWriter {
    pub fn new(temp_dir: &Path) -> Self {
        Self {
            path: temp_dir.join("telemetry.json"),
            interval: Duration::from_millis(500),
            last_write: None,
        }
    }

    /// Write `snapshot` to disk if the interval has elapsed since the last
    /// write, returning whether a write happened. Writes to a `.tmp`
    /// sibling then renames over the target, so a reader never observes a
    /// partially-written file.
    pub fn maybe_write(&mut self, snapshot: &TelemetrySnapshot, now: Instant) -> std::io::Result<bool> {
        let due = self.last_write.is_none_or(|t| now.duration_since(t) >= self.interval);
        if !due {
            return Ok(false);
        }
        let tmp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string(snapshot)?;
        std::fs::write(&tmp_path, content)?;
        std::fs::rename(&tmp_path, &self.path)?;
        self.last_write = Some(now);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publisher_readers_see_the_latest_store() {
        let publisher = TelemetryPublisher::new();
        assert_eq!(publisher.current().listings, 0);
        publisher.publish(TelemetrySnapshot {
            listings: 3,
            ..Default::default()
        });
        assert_eq!(publisher.current().listings, 3);
    }

    #[test]
    fn snapshot_serializes_with_spec_field_names() {
        let snapshot = TelemetrySnapshot::default();
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"peakL\""));
        assert!(json.contains("\"grMeter\""));
        assert!(json.contains("\"mouseX\""));
    }

    #[test]
    fn first_write_always_happens() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = FileTelemetryWriter::new(dir.path());
        let wrote = writer.maybe_write(&TelemetrySnapshot::default(), Instant::now()).unwrap();
        assert!(wrote);
        assert!(dir.path().join("telemetry.json").is_file());
    }

    #[test]
    fn write_is_skipped_before_the_interval_elapses() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = FileTelemetryWriter::new(dir.path());
        let t0 = Instant::now();
        assert!(writer.maybe_write(&TelemetrySnapshot::default(), t0).unwrap());
        assert!(!writer.maybe_write(&TelemetrySnapshot::default(), t0).unwrap());
    }
}
