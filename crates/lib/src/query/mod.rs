//! The dependency query collaborator.
//!
//! This module handles:
//! - The target and attribute model produced by a query ([`types`])
//! - Decoding the build tool's structured output ([`parse`])
//! - Invoking the build tool ([`bazel`])

pub mod bazel;
pub mod parse;
pub mod types;

pub use bazel::{BazelQuery, QueryError, QueryTool};
pub use parse::parse_query_output;
pub use types::{Attribute, AttributeValue, Rule, Target, Tristate};
