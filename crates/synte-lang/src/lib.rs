//! The Syntə listing language: value parsing, the operator table, the
//! compiled data model, and the function store.
//!
//! This crate has no notion of *running* a listing — that's the engine's
//! job. It only knows how to turn tokens into the typed [`model::Operation`]
//! stream the compiler assembles and the engine later executes.

pub mod builtins;
pub mod model;
pub mod ops;
pub mod store;
pub mod value;

pub use model::{Function, Listing, OpCode, Operation, SignalName};
pub use ops::{Check, Operand, OpSpec, OPERATOR_TABLE};
pub use store::{expand, ExpansionError, FunctionStore};
pub use synte_core::ReservedConstants;
pub use value::{parse_value, ParsedValue};
