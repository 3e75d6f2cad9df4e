//! Shared `MouseState` (spec.md §1: mouse device reading is an external
//! collaborator; this module only defines the atomic-snapshot contract the
//! kernel reads `mousex`/`mousey`/`butt1..3` through). Grounded on the
//! teacher's `sonido-gui::atomic_param_bridge` atomic-float-bits pattern
//! (`AtomicU64` storing `f64::to_bits`, relaxed ordering — a stale read by
//! one sample is inaudible).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Lock-free mouse position/button state. A platform-specific reader thread
/// calls the setters; the audio thread calls the getters once per frame.
#[derive(Default)]
pub struct MouseState {
    x: AtomicU64,
    y: AtomicU64,
    button1: AtomicBool,
    button2: AtomicBool,
    button3: AtomicBool,
}

/// A point-in-time read of [`MouseState`], the shape the telemetry
/// snapshot and the kernel's `mousex`/`mousey`/`butt1..3` reads both want.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MouseSnapshot {
    pub mousex: f64,
    pub mousey: f64,
    pub butt1: bool,
    pub butt2: bool,
    pub butt3: bool,
}

impl MouseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_position(&self, x: f64, y: f64) {
        self.x.store(x.to_bits(), Ordering::Relaxed);
        self.y.store(y.to_bits(), Ordering::Relaxed);
    }

    pub fn set_button(&self, index: u8, pressed: bool) {
        let flag = match index {
            1 => &self.button1,
            2 => &self.button2,
            3 => &self.button3,
            _ => return,
        };
        flag.store(pressed, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MouseSnapshot {
        MouseSnapshot {
            mousex: f64::from_bits(self.x.load(Ordering::Relaxed)),
            mousey: f64::from_bits(self.y.load(Ordering::Relaxed)),
            butt1: self.button1.load(Ordering::Relaxed),
            butt2: self.button2.load(Ordering::Relaxed),
            butt3: self.button3.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_origin_with_no_buttons_pressed() {
        let state = MouseState::new();
        assert_eq!(state.snapshot(), MouseSnapshot::default());
    }

    #[test]
    fn position_and_buttons_round_trip() {
        let state = MouseState::new();
        state.set_position(0.25, 0.75);
        state.set_button(2, true);
        let snap = state.snapshot();
        assert_eq!(snap.mousex, 0.25);
        assert_eq!(snap.mousey, 0.75);
        assert!(!snap.butt1);
        assert!(snap.butt2);
        assert!(!snap.butt3);
    }

    #[test]
    fn out_of_range_button_index_is_ignored() {
        let state = MouseState::new();
        state.set_button(9, true);
        assert_eq!(state.snapshot(), MouseSnapshot::default());
    }
}
