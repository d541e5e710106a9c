//! Flow scripts.
//!
//! A flow script is a YAML document naming a top component and a list of
//! steps:
//!
//! ```yaml
//! top: cpu_tb
//! steps:
//!   - clean: {}
//!   - library: { tool: vlib, name: work }
//!   - compile: { tool: vlog, args: [-sv], timestamped: true }
//!   - run: { job: sim, command: [vsim, -c, cpu_tb, "{options}"] }
//! ```
//!
//! Steps run in order. The first failing step stops the script.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::execute::ToolCommand;
use crate::execute::jobs::{self, DEFAULT_COMPILE_TOOL, DEFAULT_LIBRARY_NAME, DEFAULT_LIBRARY_TOOL};
use crate::flow::{Flow, FlowError};

/// Argument token replaced by the ordered file list.
pub const FILES_TOKEN: &str = "{files}";
/// Argument token replaced by the ordered option list.
pub const OPTIONS_TOKEN: &str = "{options}";

#[derive(Debug, Error)]
pub enum ScriptError {
  #[error("failed to read flow script {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse flow script {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("no top component: pass --top or set `top` in the script")]
  NoTop,

  #[error("step {index} ({job}): empty command")]
  EmptyCommand { index: usize, job: String },

  #[error("step {index} ({step}) failed")]
  StepFailed {
    index: usize,
    step: String,
    #[source]
    source: FlowError,
  },

  #[error(transparent)]
  Flow(#[from] FlowError),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlowScript {
  #[serde(default)]
  pub top: Option<String>,
  #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
  pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
  Clean {},
  Library {
    #[serde(default = "default_library_tool")]
    tool: String,
    #[serde(default = "default_library_name")]
    name: String,
  },
  Compile {
    #[serde(default = "default_compile_tool")]
    tool: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    timestamped: bool,
  },
  Run {
    job: String,
    command: Vec<String>,
    #[serde(default)]
    timestamped: bool,
  },
}

fn default_library_tool() -> String {
  DEFAULT_LIBRARY_TOOL.to_string()
}

fn default_library_name() -> String {
  DEFAULT_LIBRARY_NAME.to_string()
}

fn default_compile_tool() -> String {
  DEFAULT_COMPILE_TOOL.to_string()
}

impl Step {
  fn needs_top(&self) -> bool {
    match self {
      Step::Clean {} | Step::Library { .. } => false,
      Step::Compile { .. } => true,
      Step::Run { command, .. } => command.iter().any(|a| a == FILES_TOKEN || a == OPTIONS_TOKEN),
    }
  }
}

impl fmt::Display for Step {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Step::Clean {} => write!(f, "clean"),
      Step::Library { tool, name } => write!(f, "library {tool} {name}"),
      Step::Compile { tool, .. } => write!(f, "compile {tool}"),
      Step::Run { job, .. } => write!(f, "run {job}"),
    }
  }
}

impl FlowScript {
  pub fn parse(content: &str, path: &Path) -> Result<Self, ScriptError> {
    serde_yaml::from_str(content).map_err(|source| ScriptError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  pub fn load(path: &Path) -> Result<Self, ScriptError> {
    let content = std::fs::read_to_string(path).map_err(|source| ScriptError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::parse(&content, path)
  }

  /// `top_override` if given, else the script's own `top`.
  pub fn top<'a>(&'a self, top_override: Option<&'a str>) -> Option<&'a str> {
    top_override.or(self.top.as_deref()).filter(|t| !t.is_empty())
  }
}

/// Number of steps a finished script ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptSummary {
  pub steps: usize,
}

/// Run every step of `script` against `flow`.
///
/// When a top component is known it is loaded and resolved before the first
/// step, so a broken graph stops the script before anything executes.
pub fn run_script<O: Write, E: Write>(
  flow: &mut Flow<O, E>,
  script: &FlowScript,
  top_override: Option<&str>,
) -> Result<ScriptSummary, ScriptError> {
  match script.top(top_override) {
    Some(top) => flow.load(top)?,
    None if script.steps.iter().any(Step::needs_top) => return Err(ScriptError::NoTop),
    None => {}
  }

  let total = script.steps.len();
  for (index, step) in script.steps.iter().enumerate() {
    let index = index + 1;
    info!(step = index, total, "{step}");

    run_step(flow, index, step).map_err(|err| match err {
      ScriptError::Flow(source) => ScriptError::StepFailed {
        index,
        step: step.to_string(),
        source,
      },
      other => other,
    })?;
  }

  Ok(ScriptSummary { steps: total })
}

fn run_step<O: Write, E: Write>(flow: &mut Flow<O, E>, index: usize, step: &Step) -> Result<(), ScriptError> {
  match step {
    Step::Clean {} => flow.clean()?,
    Step::Library { tool, name } => {
      flow.library(tool, name)?;
    }
    Step::Compile {
      tool,
      args,
      timestamped,
    } => {
      flow.compile(tool, args, *timestamped)?;
    }
    Step::Run {
      job,
      command,
      timestamped,
    } => {
      let argv = expand_tokens(flow, command)?;
      let command = ToolCommand::from_argv(&argv).ok_or_else(|| ScriptError::EmptyCommand {
        index,
        job: job.clone(),
      })?;

      let mut job = flow.job(job)?;
      if *timestamped {
        job.set_timestamp();
      }
      flow.execute(&job, &command)?;
    }
  }
  Ok(())
}

fn expand_tokens<O: Write, E: Write>(flow: &Flow<O, E>, command: &[String]) -> Result<Vec<String>, FlowError> {
  let mut argv = Vec::with_capacity(command.len());
  for arg in command {
    let expanded = match arg.as_str() {
      FILES_TOKEN => flow.ordered_files(),
      OPTIONS_TOKEN => flow.ordered_options(),
      _ => {
        argv.push(arg.clone());
        continue;
      }
    };
    for fragment in expanded {
      argv.push(jobs::expand_env(fragment)?);
    }
  }
  Ok(argv)
}
