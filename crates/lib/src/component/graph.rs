//! The component graph.
//!
//! Holds every loaded [`Component`] keyed by name. Edges are implied by each
//! component's `requires` list; they are materialized into a `petgraph` graph
//! only for whole-graph validation.

use std::collections::{BTreeMap, HashMap};

use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;

use super::manifest::ManifestError;
use super::resolve::{ResolveError, resolve};
use super::types::Component;

/// All components of one flow invocation.
///
/// Built once by the loader, then treated as read-only.
#[derive(Debug, Default, Clone)]
pub struct ComponentGraph {
  components: BTreeMap<String, Component>,
}

impl ComponentGraph {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a component.
  ///
  /// A second component with an existing name is rejected; the first one stays.
  pub fn insert(&mut self, component: Component) -> Result<(), ManifestError> {
    if let Some(existing) = self.components.get(&component.name) {
      return Err(ManifestError::DuplicateComponent {
        name: component.name,
        first: existing.manifest.clone(),
        second: component.manifest,
      });
    }

    self.components.insert(component.name.clone(), component);
    Ok(())
  }

  pub fn get(&self, name: &str) -> Option<&Component> {
    self.components.get(name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.components.contains_key(name)
  }

  pub fn len(&self) -> usize {
    self.components.len()
  }

  pub fn is_empty(&self) -> bool {
    self.components.is_empty()
  }

  /// Components sorted by name.
  pub fn iter(&self) -> impl Iterator<Item = &Component> {
    self.components.values()
  }

  /// Names this component requires, in declaration order.
  pub fn dependencies(&self, name: &str) -> Vec<&str> {
    self
      .components
      .get(name)
      .map(|c| c.requires.iter().map(String::as_str).collect())
      .unwrap_or_default()
  }

  /// Names of the components that require this one, sorted.
  pub fn dependents(&self, name: &str) -> Vec<&str> {
    self
      .components
      .values()
      .filter(|c| c.requires.iter().any(|r| r == name))
      .map(|c| c.name.as_str())
      .collect()
  }

  /// Components nothing else requires. These are the candidate top components.
  pub fn roots(&self) -> Vec<&str> {
    self
      .components
      .keys()
      .filter(|name| self.components.values().all(|c| !c.requires.contains(*name)))
      .map(String::as_str)
      .collect()
  }

  /// Check the whole graph, not only what one top component reaches.
  ///
  /// Every `requires` entry must name a loaded component and the graph must be
  /// acyclic.
  pub fn validate(&self) -> Result<(), ResolveError> {
    for component in self.components.values() {
      if let Some(missing) = component.requires.iter().find(|r| !self.contains(r)) {
        return Err(ResolveError::UnknownComponent {
          name: missing.clone(),
          required_by: component.name.clone(),
        });
      }
    }

    let graph = self.to_digraph();

    for scc in tarjan_scc(&graph) {
      let cyclic = scc.len() > 1 || graph.contains_edge(scc[0], scc[0]);
      if !cyclic {
        continue;
      }

      // A walk started inside a strongly connected component always closes a loop.
      let start = graph[scc[0]];
      resolve(self, start)?;
      return Err(ResolveError::CycleDetected {
        chain: scc.iter().map(|&idx| graph[idx]).collect::<Vec<_>>().join(", "),
      });
    }

    Ok(())
  }

  /// Edges point from a dependency to the component requiring it.
  ///
  /// Unknown names in `requires` are skipped.
  fn to_digraph(&self) -> DiGraph<&str, ()> {
    let mut graph = DiGraph::new();
    let mut nodes = HashMap::new();

    for name in self.components.keys() {
      nodes.insert(name.as_str(), graph.add_node(name.as_str()));
    }

    for component in self.components.values() {
      let dependent = nodes[component.name.as_str()];
      for dep in &component.requires {
        if let Some(&dependency) = nodes.get(dep.as_str()) {
          graph.add_edge(dependency, dependent, ());
        }
      }
    }

    graph
  }
}
