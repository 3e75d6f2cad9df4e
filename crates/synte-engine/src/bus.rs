//! Signal bus: the process-wide mapping from reserved and exported signal
//! names to shared scalar slots (§3 "Signal bus").
//!
//! Reads within a frame see the *previous* listing's write (daisy-chain
//! propagation, §5 "Ordering"): a write mutates a name's slot in place, so
//! any later listing evaluated the same frame reads the fresh value: there
//! is no separate double-buffering, just one shared map that persists
//! across frames until the next write.

use std::collections::HashMap;

/// Reserved bus names that always exist, independent of any listing.
pub const RESERVED_NAMES: &[&str] = &[
    "dac", "tempo", "pitch", "grid", "mousex", "mousey", "butt1", "butt2", "butt3",
];

/// Maximum number of exported (capitalised) signal names live at once.
pub const MAX_EXPORTED: usize = 12;

/// The process-wide signal bus.
pub struct SignalBus {
    slots: HashMap<String, f64>,
    exported_count: usize,
}

impl SignalBus {
    pub fn new() -> Self {
        // Reserve capacity for every reserved name plus the full exported
        // table up front so steady-state writes never trigger a rehash.
        let mut slots = HashMap::with_capacity(RESERVED_NAMES.len() + MAX_EXPORTED);
        for &name in RESERVED_NAMES {
            slots.insert(name.to_string(), 0.0);
        }
        Self {
            slots,
            exported_count: 0,
        }
    }

    /// Read a name's current slot value, or `0.0` if it was never written.
    pub fn read(&self, name: &str) -> f64 {
        self.slots.get(name).copied().unwrap_or(0.0)
    }

    /// Write a value, registering a new exported slot on first use if the
    /// name is capitalised and the export table isn't full. An existing
    /// slot is mutated in place — the audio thread never allocates once a
    /// name has been seen once (§5).
    ///
    /// Returns `false` if the name is a new exported name and the export
    /// table is already at [`MAX_EXPORTED`] — the write is dropped rather
    /// than silently growing an unbounded table.
    pub fn write(&mut self, name: &str, value: f64) -> bool {
        if let Some(slot) = self.slots.get_mut(name) {
            *slot = value;
            return true;
        }
        if name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
            if self.exported_count >= MAX_EXPORTED {
                return false;
            }
            self.exported_count += 1;
        }
        self.slots.insert(name.to_string(), value);
        true
    }

    /// Add to an existing slot's value (`out+`), treating an unwritten
    /// name as starting from zero.
    pub fn add(&mut self, name: &str, value: f64) -> bool {
        let current = self.read(name);
        self.write(name, current + value)
    }
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}
