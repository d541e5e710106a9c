//! The flow: loading, resolution and job execution behind one surface.
//!
//! A [`Flow`] is built once per invocation. [`Flow::load`] discovers every
//! manifest under the workspace root and resolves the build order from the
//! top component; the ordered files and options are then available to the
//! jobs run through [`Flow::execute`].

use std::io::{Stderr, Stdout, Write};

use thiserror::Error;
use tracing::info;

use crate::component::{BuildList, ComponentGraph, ManifestError, ResolveError, load_components, resolve};
use crate::config::{ConfigError, FlowConfig};
use crate::execute::jobs::{self, COMPILE_JOB, LIBRARY_JOB};
use crate::execute::{CommandOutput, ExecuteError, Runner, ToolCommand};
use crate::workspace::{Job, WorkspaceError};

#[derive(Debug, Error)]
pub enum FlowError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Manifest(#[from] ManifestError),

  #[error(transparent)]
  Resolve(#[from] ResolveError),

  #[error(transparent)]
  Workspace(#[from] WorkspaceError),

  #[error(transparent)]
  Execute(#[from] ExecuteError),

  #[error("no top component loaded")]
  NotLoaded,
}

pub struct Flow<O: Write = Stdout, E: Write = Stderr> {
  config: FlowConfig,
  graph: ComponentGraph,
  top: Option<String>,
  order: Vec<String>,
  runner: Runner<O, E>,
}

impl Flow {
  /// A flow that writes its transcript to stdout and relays stderr.
  pub fn new(config: FlowConfig) -> Self {
    Self::with_runner(config, Runner::stdio())
  }

  /// Read `WS`/`WSTMP` and build a flow.
  pub fn from_env() -> Result<Self, FlowError> {
    Ok(Self::new(FlowConfig::from_env()?))
  }
}

impl<O: Write, E: Write> Flow<O, E> {
  pub fn with_runner(config: FlowConfig, runner: Runner<O, E>) -> Self {
    Self {
      config,
      graph: ComponentGraph::new(),
      top: None,
      order: Vec::new(),
      runner,
    }
  }

  pub fn config(&self) -> &FlowConfig {
    &self.config
  }

  pub fn graph(&self) -> &ComponentGraph {
    &self.graph
  }

  pub fn top(&self) -> Option<&str> {
    self.top.as_deref()
  }

  pub fn into_runner(self) -> Runner<O, E> {
    self.runner
  }

  /// Load every manifest under the workspace root, without resolving.
  pub fn load_graph(&mut self) -> Result<&ComponentGraph, FlowError> {
    self.graph = load_components(&self.config.workspace_root)?;
    self.top = None;
    self.order.clear();
    Ok(&self.graph)
  }

  /// Load every manifest and resolve the build order rooted at `top`.
  pub fn load(&mut self, top: &str) -> Result<(), FlowError> {
    info!(top = %top, "loading components");
    let graph = load_components(&self.config.workspace_root)?;
    let order: Vec<String> = resolve(&graph, top)?.names().into_iter().map(str::to_string).collect();

    self.graph = graph;
    self.top = Some(top.to_string());
    self.order = order;
    Ok(())
  }

  /// The resolved order, or `NotLoaded` before [`load`](Self::load).
  pub fn build_list(&self) -> Result<BuildList<'_>, FlowError> {
    let top = self.top.as_deref().ok_or(FlowError::NotLoaded)?;
    Ok(resolve(&self.graph, top)?)
  }

  /// Component names in build order. Empty before [`load`](Self::load).
  pub fn ordered_names(&self) -> Vec<&str> {
    self.order.iter().map(String::as_str).collect()
  }

  /// Every file of every component in build order. Empty before [`load`](Self::load).
  pub fn ordered_files(&self) -> Vec<&str> {
    self
      .order
      .iter()
      .filter_map(|name| self.graph.get(name))
      .flat_map(|c| c.files.iter().map(String::as_str))
      .collect()
  }

  /// Every option of every component in build order. Empty before [`load`](Self::load).
  pub fn ordered_options(&self) -> Vec<&str> {
    self
      .order
      .iter()
      .filter_map(|name| self.graph.get(name))
      .flat_map(|c| c.options.iter().map(String::as_str))
      .collect()
  }

  /// A job rooted in this flow's scratch root.
  pub fn job(&self, name: &str) -> Result<Job, FlowError> {
    Ok(Job::new(name, &self.config.scratch_root)?)
  }

  /// Run `command` in the workspace of `job`.
  pub fn execute(&mut self, job: &Job, command: &ToolCommand) -> Result<CommandOutput, FlowError> {
    Ok(self.runner.execute(job, command)?)
  }

  /// Empty the scratch root.
  pub fn clean(&mut self) -> Result<(), FlowError> {
    jobs::clean(&self.config.scratch_root, &self.config.workspace_root)?;
    Ok(())
  }

  /// Create a library with `tool` in the `library` job workspace.
  pub fn library(&mut self, tool: &str, library: &str) -> Result<CommandOutput, FlowError> {
    let job = self.job(LIBRARY_JOB)?;
    self.execute(&job, &jobs::library_command(tool, library))
  }

  /// Compile the resolved files with `tool` in the `compile` job workspace.
  pub fn compile(&mut self, tool: &str, extra_args: &[String], timestamped: bool) -> Result<CommandOutput, FlowError> {
    let command = jobs::compile_command(tool, extra_args, &self.build_list()?)?;

    let mut job = self.job(COMPILE_JOB)?;
    if timestamped {
      job.set_timestamp();
    }

    self.execute(&job, &command)
  }
}
