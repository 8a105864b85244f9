//! SQL statement assembly.
//!
//! - `dialect`: identifier quoting and the few per-database syntax
//!   differences the dumper cares about.
//! - `select`: the SELECT builder that filter compilation writes into.

pub mod dialect;
pub mod select;

pub use dialect::Dialect;
pub use select::{Projection, SelectQuery};
