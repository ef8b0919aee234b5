//! Core domain
//!
//! Literal scanning, placeholder substitution and value quoting. These are
//! pure functions over their inputs - no I/O or shared state.

pub mod dialect;
pub mod literal;
pub mod placeholder;
pub mod result;
mod value;

pub use dialect::Dialect;
pub use literal::{scan_literals, LiteralRange, LiteralScan, MalformedLiteral};
pub use placeholder::{
    placeholder_offsets, substitute, substitute_scanned, substitute_with, Substitution,
};
pub use value::Value;
