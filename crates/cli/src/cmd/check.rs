//! Implementation of the `barf check` command.
//!
//! Loads every manifest under `WS` and validates the whole component graph,
//! including components no top component reaches.

use anyhow::{Context, Result};
use serde::Serialize;

use barf_lib::flow::Flow;

use crate::output::{OutputFormat, print_json, print_stat, print_success};

#[derive(Serialize)]
struct CheckOutput<'a> {
  count: usize,
  roots: Vec<&'a str>,
  leaves: Vec<&'a str>,
  components: Vec<ComponentEntry<'a>>,
}

#[derive(Serialize)]
struct ComponentEntry<'a> {
  name: &'a str,
  requires: Vec<&'a str>,
  required_by: Vec<&'a str>,
}

/// Validate the graph, then print counts, roots and leaves.
///
/// With `verbose`, text output also lists each component's edges. JSON output
/// always includes them.
pub fn cmd_check(verbose: bool, format: OutputFormat) -> Result<()> {
  let mut flow = Flow::from_env()?;
  let graph = flow.load_graph()?;
  graph.validate().context("Component graph is invalid")?;

  let roots = graph.roots();
  let leaves: Vec<&str> = graph.iter().filter(|c| c.is_leaf()).map(|c| c.name.as_str()).collect();
  let components: Vec<ComponentEntry> = graph
    .iter()
    .map(|c| ComponentEntry {
      name: &c.name,
      requires: graph.dependencies(&c.name),
      required_by: graph.dependents(&c.name),
    })
    .collect();

  if format.is_json() {
    return print_json(&CheckOutput {
      count: graph.len(),
      roots,
      leaves,
      components,
    });
  }

  print_success("Component graph is valid");
  print_stat("Components", &graph.len().to_string());
  print_stat("Roots", &roots.join(", "));
  print_stat("Leaves", &leaves.join(", "));

  if verbose {
    println!();
    for entry in &components {
      println!("{}", entry.name);
      print_stat("requires", &entry.requires.join(", "));
      print_stat("required by", &entry.required_by.join(", "));
    }
  }

  Ok(())
}
