//! Resolution engine for Rivet tool contracts.
//!
//! Takes a declarative [`ToolContract`](rivet_contract::ToolContract), a list
//! of concrete input paths, output/temp directories, a processor ceiling, and
//! a map of option overrides, and produces a fully-bound
//! [`ResolvedToolContract`](rivet_contract::ResolvedToolContract). Scatter
//! and gather tasks resolve through their own entry points, which carry the
//! chunk-specific literals.
//!
//! Resolution is all-or-nothing and performs no filesystem I/O beyond
//! synthesizing path strings.

pub mod error;
pub mod resolver;

pub use error::{ResolveError, Result};
pub use resolver::{resolve, resolve_gather, resolve_scatter};
