//! Components and their dependency graph.
//!
//! A component is declared by a `comp.yml` manifest somewhere under the
//! workspace root. Loading turns every manifest into a [`Component`], the
//! [`ComponentGraph`] keys them by name, and [`resolve`] walks the graph from a
//! top component into a dependency-first [`BuildList`].

mod graph;
mod manifest;
mod resolve;
mod types;

pub use graph::*;
pub use manifest::*;
pub use resolve::*;
pub use types::*;
