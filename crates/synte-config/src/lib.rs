//! Session configuration for Syntə: an optional `synte.toml` carrying the
//! default release/fade times, load threshold, and persistence paths
//! (§4.F/§4.G/§4.D), loadable with `sonido-config::Preset`'s TOML +
//! `serde` + `thiserror::ConfigError` shape.

mod error;
mod session;

pub mod paths;

pub use error::ConfigError;
pub use session::SessionConfig;
