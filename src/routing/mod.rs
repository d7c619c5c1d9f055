//! Routing module
//!
//! Route patterns with named parameters stored in a per-method trie.

mod node;
pub mod pattern;
mod table;

pub use table::{canonical_pattern, parse_method, RouteEntry, RouteMatch, RouteTable};
