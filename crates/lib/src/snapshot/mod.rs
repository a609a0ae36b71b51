//! Hash snapshots and the diff between them.

pub mod diff;
pub mod types;

pub use diff::{ChangeReport, diff};
pub use types::HashSnapshot;
