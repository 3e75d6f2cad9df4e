//! The runtime engine (components E-G): dispatch channel, per-listing
//! state, signal bus, DSP kernel, and master chain.

pub mod bus;
pub mod dispatch;
pub mod kernel;
pub mod listing_state;
pub mod master_chain;

pub use bus::SignalBus;
pub use dispatch::{channel, DispatchMessage, Dispatcher, Inbox, DEFAULT_QUEUE_DEPTH};
pub use kernel::{Kernel, DEFAULT_LOAD_THRESHOLD};
pub use listing_state::ListingState;
pub use master_chain::MasterChain;
