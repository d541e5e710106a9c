//! Implementation of the `barf list` command.

use anyhow::Result;
use serde::Serialize;

use barf_lib::flow::Flow;

use crate::output::{OutputFormat, print_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
  Names,
  Files,
  Options,
}

#[derive(Serialize)]
struct ListOutput<'a> {
  top: &'a str,
  components: Vec<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  files: Option<Vec<&'a str>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  options: Option<Vec<&'a str>>,
}

/// Resolve `top` and print one entry per line, or a JSON object.
pub fn cmd_list(top: &str, mode: ListMode, format: OutputFormat) -> Result<()> {
  let mut flow = Flow::from_env()?;
  flow.load(top)?;

  if format.is_json() {
    return print_json(&ListOutput {
      top,
      components: flow.ordered_names(),
      files: (mode == ListMode::Files).then(|| flow.ordered_files()),
      options: (mode == ListMode::Options).then(|| flow.ordered_options()),
    });
  }

  let entries = match mode {
    ListMode::Names => flow.ordered_names(),
    ListMode::Files => flow.ordered_files(),
    ListMode::Options => flow.ordered_options(),
  };
  for entry in entries {
    println!("{entry}");
  }

  Ok(())
}
