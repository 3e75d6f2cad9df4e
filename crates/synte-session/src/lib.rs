//! Session-support helpers for the Syntə sound engine: telemetry
//! publishing, hot-reload file watching, shared mouse state, and on-disk
//! persistence of functions/recordings/usage stats.
//!
//! Each module is independent and communicates only through its own
//! narrow, lock-free or file-based surface, per the "each helper is an
//! independent actor" shape the engine's own `dispatch`/`kernel` split
//! follows.

pub mod level_mirror;
pub mod mouse;
pub mod persistence;
pub mod telemetry;
pub mod watcher;

pub use level_mirror::LevelMirror;
pub use mouse::{MouseSnapshot, MouseState};
pub use persistence::{read_functions_json, write_functions_json, write_recording, OpPair, UsageCounter};
pub use telemetry::{FileTelemetryWriter, TelemetryPublisher, TelemetrySnapshot};
pub use watcher::{HotReloadWatcher, ReloadEvent, POLL_INTERVAL_MS};
