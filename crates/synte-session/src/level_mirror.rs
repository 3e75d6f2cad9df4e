//! Level mirror: a wait-free, audio-thread-to-watcher-thread view of each
//! admitted listing's current output level, used only by the hot-reload
//! ghost-prevention policy (§4.I).
//!
//! Same [`ArcSwap`] whole-snapshot-replace shape as [`crate::telemetry`];
//! kept separate since levels aren't part of the §4.H telemetry schema and
//! update on a different cadence (every frame, not every 500 ms).

use std::sync::Arc;

use arc_swap::ArcSwap;

pub struct LevelMirror {
    levels: ArcSwap<Vec<f64>>,
}

impl LevelMirror {
    pub fn new() -> Self {
        Self {
            levels: ArcSwap::from_pointee(Vec::new()),
        }
    }

    pub fn publish(&self, levels: Vec<f64>) {
        self.levels.store(Arc::new(levels));
    }

    /// Current level for listing `index`, or `None` if the slot doesn't
    /// exist (evicted, or never admitted).
    pub fn get(&self, index: usize) -> Option<f64> {
        self.levels.load().get(index).copied()
    }
}

impl Default for LevelMirror {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readers_see_the_latest_publish() {
        let mirror = LevelMirror::new();
        assert_eq!(mirror.get(0), None);
        mirror.publish(vec![1.0, 0.05]);
        assert_eq!(mirror.get(0), Some(1.0));
        assert_eq!(mirror.get(1), Some(0.05));
        assert_eq!(mirror.get(2), None);
    }
}
