//! Dispatch channel (component E): the single-producer/single-consumer
//! bounded queue between the editor thread and the audio thread.

use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, RecvError, SendError, Sender};

use crate::listing_state::ListingState;

/// One message on the editor → audio dispatch queue. Every listing arrives
/// pre-allocated: the audio thread never builds a [`ListingState`] itself.
#[derive(Debug)]
pub enum DispatchMessage {
    /// Admit a newly compiled, fully-allocated listing at the next free
    /// slot (or a specific index if the editor already reserved one).
    Admit(Box<ListingState>),
    /// Replace the listing at `index` in place (`rld`/`rpl`).
    Replace(usize, Box<ListingState>),
    Delete(usize),
    Mute(usize, bool),
    Solo(usize),
    Level(usize, f64),
    SyncBroadcast,
    SetRelease(f64),
    SetFade(f64),
    Pause(bool),
    /// Register a decoded `wavs/*.wav` table under its file stem, for the
    /// `wav name` opcode. Decoding itself lives outside the engine (§3
    /// Non-goals); this message only hands over the already-decoded samples.
    LoadWav(String, Arc<Vec<f64>>),
}

/// Default dispatch queue depth. Bounded so the editor can apply genuine
/// back-pressure rather than let unbounded admission build up ahead of
/// the audio thread's frame-by-frame drain.
pub const DEFAULT_QUEUE_DEPTH: usize = 64;

/// Editor-side handle: send-only, blocks the caller when the queue is full.
#[derive(Clone)]
pub struct Dispatcher {
    tx: Sender<DispatchMessage>,
}

impl Dispatcher {
    /// Send a message, blocking until the audio thread has drained room
    /// for it. This is the spec's documented back-pressure policy: never
    /// drop a message, never let the editor race ahead unbounded.
    pub fn send(&self, message: DispatchMessage) -> Result<(), SendError<DispatchMessage>> {
        self.tx.send(message)
    }
}

/// Audio-side handle: receive-only, never blocks past a frame boundary —
/// callers should only call `try_recv` from the kernel's between-frames
/// drain point.
pub struct Inbox {
    rx: Receiver<DispatchMessage>,
}

impl Inbox {
    /// Drain every message currently queued without blocking. Called once
    /// between frames, never mid-frame.
    pub fn drain(&self) -> Vec<DispatchMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    /// Block until a message arrives. Used only by non-realtime test
    /// harnesses; the real audio thread always uses [`Inbox::drain`].
    pub fn recv(&self) -> Result<DispatchMessage, RecvError> {
        self.rx.recv()
    }
}

/// Build a connected dispatcher/inbox pair with the given queue depth.
pub fn channel(depth: usize) -> (Dispatcher, Inbox) {
    let (tx, rx) = bounded(depth);
    (Dispatcher { tx }, Inbox { rx })
}
