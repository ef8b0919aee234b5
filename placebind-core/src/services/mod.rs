//! Service layer
//!
//! Services coordinate domain logic and port interactions.

mod statement;

pub use statement::{RowSource, StatementService};
