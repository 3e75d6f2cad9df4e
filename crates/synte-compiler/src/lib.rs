//! The listing compiler: the token-stream state machine (component C) and
//! its `.syt` serialization format.
//!
//! Function storage and expansion live in `synte_lang::store`; this crate
//! only adds the compile-time checks and terminal detection that turn a
//! token stream into a [`synte_lang::Listing`].

pub mod compiler;
pub mod syt;
pub mod tokenizer;

pub use compiler::{Command, CompileError, CompileEvent, Compiler};
pub use syt::SytError;
