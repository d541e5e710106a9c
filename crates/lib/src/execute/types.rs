//! Types for command execution.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::workspace::WorkspaceError;

/// Errors that can occur while running a job.
#[derive(Debug, Error)]
pub enum ExecuteError {
  /// The process ran and exited unsuccessfully. `code` is `None` when it was killed by a signal.
  #[error("command failed ({}): {cmd}", exit_reason(.code))]
  CmdFailed { cmd: String, code: Option<i32> },

  /// The program could not be started.
  #[error("failed to start '{program}': {source}")]
  Spawn {
    program: String,
    #[source]
    source: io::Error,
  },

  /// A `$NAME` reference in a file or option has no value in the environment.
  #[error("environment variable ${name} referenced by '{fragment}' is not set")]
  UndefinedVariable { name: String, fragment: String },

  /// Refused to clean a directory that must not be wiped.
  #[error("refusing to clean {path}: {reason}")]
  UnsafeClean { path: PathBuf, reason: &'static str },

  /// Filesystem error while cleaning.
  #[error("failed to clean {path}: {source}")]
  Clean {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The job workspace could not be prepared.
  #[error(transparent)]
  Workspace(#[from] WorkspaceError),

  /// I/O error writing the transcript.
  #[error("io error: {0}")]
  Io(#[from] io::Error),
}

fn exit_reason(code: &Option<i32>) -> String {
  match code {
    Some(code) => format!("exit code {code}"),
    None => "killed by signal".to_string(),
  }
}

/// Captured output of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
  pub stdout: String,
  pub stderr: String,
}
