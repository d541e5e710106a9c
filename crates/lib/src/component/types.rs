//! Component types.
//!
//! A [`Component`] is the in-memory form of one `comp.yml` manifest after its
//! file fragments have been anchored to the manifest's directory. Components
//! are immutable once loaded; traversal state lives in the resolver.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A named build unit.
///
/// # Example
///
/// ```yaml
/// name: alu
/// files:
///   - rtl/alu.sv
///   - $UVM_HOME/src/uvm_pkg.sv
/// options:
///   - +define+FAST_ADDER
/// requires:
///   - common_pkg
/// ```
///
/// Loaded from `/ws/cores/alu/comp.yml`, `files` becomes
/// `["/ws/cores/alu/rtl/alu.sv", "$UVM_HOME/src/uvm_pkg.sv"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
  /// Unique identifier; the key in the [`ComponentGraph`](super::ComponentGraph).
  pub name: String,

  /// Source files in declaration order. Never deduplicated.
  pub files: Vec<String>,

  /// Tool flags in declaration order. Never deduplicated.
  pub options: Vec<String>,

  /// Names of the components this one depends on, in declaration order.
  pub requires: Vec<String>,

  /// Manifest this component was loaded from.
  pub manifest: PathBuf,
}

impl Component {
  /// Whether this component has no dependencies.
  pub fn is_leaf(&self) -> bool {
    self.requires.is_empty()
  }
}
