//! Dependency resolution.
//!
//! [`resolve`] performs a depth-first post-order walk from the top component:
//! every component is emitted after all of the components it requires, and
//! exactly once no matter how many paths reach it.
//!
//! Visitation state is owned by the walk, so the graph itself is never
//! mutated and resolving twice yields the same order. Each component carries
//! one of two marks while the walk runs:
//! - `InProgress`: on the current path; reaching it again means a cycle
//! - `Done`: already emitted; reaching it again is a diamond and is skipped

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, trace};

use super::graph::ComponentGraph;
use super::types::Component;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
  #[error("top component '{0}' not found")]
  MissingTopComponent(String),

  #[error("component '{name}' required by '{required_by}' is not defined")]
  UnknownComponent { name: String, required_by: String },

  #[error("dependency cycle detected: {chain}")]
  CycleDetected { chain: String },
}

/// Components in dependency-first order.
///
/// For every edge (A requires B), B appears strictly before A.
#[derive(Debug, Clone)]
pub struct BuildList<'g> {
  components: Vec<&'g Component>,
}

impl<'g> BuildList<'g> {
  pub fn iter(&self) -> impl Iterator<Item = &'g Component> + '_ {
    self.components.iter().copied()
  }

  pub fn len(&self) -> usize {
    self.components.len()
  }

  pub fn is_empty(&self) -> bool {
    self.components.is_empty()
  }

  /// The top component, which is always last.
  pub fn top(&self) -> Option<&'g Component> {
    self.components.last().copied()
  }

  pub fn names(&self) -> Vec<&'g str> {
    self.components.iter().map(|c| c.name.as_str()).collect()
  }

  /// All files of all components, in traversal order. Duplicates are kept.
  pub fn files(&self) -> Vec<&'g str> {
    self
      .components
      .iter()
      .flat_map(|c| c.files.iter().map(String::as_str))
      .collect()
  }

  /// All options of all components, in traversal order. Duplicates are kept.
  pub fn options(&self) -> Vec<&'g str> {
    self
      .components
      .iter()
      .flat_map(|c| c.options.iter().map(String::as_str))
      .collect()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
  InProgress,
  Done,
}

struct Walk<'g> {
  graph: &'g ComponentGraph,
  marks: HashMap<&'g str, Mark>,
  path: Vec<&'g str>,
  order: Vec<&'g Component>,
}

impl<'g> Walk<'g> {
  fn visit(&mut self, component: &'g Component) -> Result<(), ResolveError> {
    let name = component.name.as_str();

    match self.marks.get(name) {
      Some(Mark::Done) => return Ok(()),
      Some(Mark::InProgress) => return Err(self.cycle_error(name)),
      None => {}
    }

    trace!(node = %name, "visiting");
    self.marks.insert(name, Mark::InProgress);
    self.path.push(name);

    for dep in &component.requires {
      let child = self.graph.get(dep).ok_or_else(|| ResolveError::UnknownComponent {
        name: dep.clone(),
        required_by: name.to_string(),
      })?;
      self.visit(child)?;
    }

    self.path.pop();
    self.marks.insert(name, Mark::Done);
    self.order.push(component);

    Ok(())
  }

  fn cycle_error(&self, name: &str) -> ResolveError {
    let start = self.path.iter().position(|n| *n == name).unwrap_or(0);
    let mut chain: Vec<&str> = self.path[start..].to_vec();
    chain.push(name);

    ResolveError::CycleDetected {
      chain: chain.join(" -> "),
    }
  }
}

/// Resolve the build order rooted at `top`.
///
/// Nothing is returned on error; a partially walked order is discarded.
pub fn resolve<'g>(graph: &'g ComponentGraph, top: &str) -> Result<BuildList<'g>, ResolveError> {
  let root = graph
    .get(top)
    .ok_or_else(|| ResolveError::MissingTopComponent(top.to_string()))?;

  let mut walk = Walk {
    graph,
    marks: HashMap::new(),
    path: Vec::new(),
    order: Vec::new(),
  };
  walk.visit(root)?;

  debug!(top = %top, count = walk.order.len(), "resolved build order");

  Ok(BuildList { components: walk.order })
}
