//! Hot-reload thread (§4.I): polls `<tempDir>/<n>.syt` for edits made
//! outside the running session (e.g. a text editor saving the file
//! directly) and pushes a recompiled replacement onto the dispatch queue.
//!
//! [`synte_session::HotReloadWatcher`] only detects and reads; this module
//! is the "caller" its docs describe — it recompiles the tokens and
//! applies the ghost-prevention reset before dispatching.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use synte_engine::{Dispatcher, DispatchMessage, ListingState};
use synte_session::{HotReloadWatcher, LevelMirror, POLL_INTERVAL_MS};

/// Output level below which a listing is considered a "ghost" — faded
/// near-silent and, without this reset, would reload invisibly (§4.I).
const GHOST_LEVEL_THRESHOLD: f64 = 0.1;

/// Run the poll loop until `shutdown` is set. Blocking; intended to run on
/// its own thread.
pub fn run(
    temp_dir: PathBuf,
    sample_rate: f64,
    dispatcher: Dispatcher,
    levels: Arc<LevelMirror>,
    shutdown: Arc<AtomicBool>,
) {
    let mut watcher = HotReloadWatcher::new(temp_dir);
    while !shutdown.load(Ordering::Relaxed) {
        for event in watcher.poll() {
            match synte_compiler::syt::reparse(&event.tokens, sample_rate) {
                Ok(listing) => {
                    let mut state = ListingState::new(listing, sample_rate);
                    if let Some(level) = levels.get(event.index) {
                        if level >= GHOST_LEVEL_THRESHOLD {
                            state.level = level;
                        }
                    }
                    if dispatcher
                        .send(DispatchMessage::Replace(event.index, Box::new(state)))
                        .is_err()
                    {
                        return; // audio thread is gone
                    }
                }
                Err(err) => tracing::warn!(index = event.index, %err, "hot-reload: recompile failed"),
            }
        }
        std::thread::sleep(Duration::from_millis(POLL_INTERVAL_MS));
    }
}
