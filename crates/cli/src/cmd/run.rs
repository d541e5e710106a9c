//! Implementation of the `barf run` command.
//!
//! Loads a flow script and runs its steps against the workspace named by
//! `WS`, with job workspaces under `WSTMP`.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use barf_lib::flow::Flow;
use barf_lib::script::{FlowScript, run_script};

use crate::output::print_success;

/// Execute the run command.
///
/// Environment problems are reported before the script is read. The first
/// failing step ends the run with an error.
pub fn cmd_run(file: &Path, top: Option<&str>) -> Result<()> {
  let mut flow = Flow::from_env()?;
  let script = FlowScript::load(file)?;

  info!(script = %file.display(), steps = script.steps.len(), "running flow script");

  let summary = run_script(&mut flow, &script, top).context("Flow failed")?;

  let message = match flow.top() {
    Some(top) => format!("Flow complete for {top}: {} step(s)", summary.steps),
    None => format!("Flow complete: {} step(s)", summary.steps),
  };
  print_success(&message);

  Ok(())
}
