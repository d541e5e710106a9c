//! Flow configuration read from the process environment.
//!
//! Two variables are required before any other work begins:
//! - `WS`: the workspace root, scanned for component manifests
//! - `WSTMP`: the scratch root, base directory for job workspaces

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::consts::{SCRATCH_ROOT_VAR, WORKSPACE_ROOT_VAR};

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("${0} not set")]
  MissingVar(&'static str),

  #[error("workspace root {path} is not accessible: {source}")]
  WorkspaceRoot {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("workspace root {0} is not a directory")]
  NotADirectory(PathBuf),
}

/// Resolved locations for one flow invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowConfig {
  /// Tree scanned for `comp.yml` manifests. Always canonical.
  pub workspace_root: PathBuf,

  /// Base directory for job workspaces. May not exist yet.
  pub scratch_root: PathBuf,
}

impl FlowConfig {
  /// Build a config from explicit paths.
  ///
  /// The workspace root must exist; the scratch root is created lazily by jobs.
  pub fn new(workspace_root: impl AsRef<Path>, scratch_root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
    let workspace_root = workspace_root.as_ref();
    let canonical = dunce::canonicalize(workspace_root).map_err(|source| ConfigError::WorkspaceRoot {
      path: workspace_root.to_path_buf(),
      source,
    })?;

    if !canonical.is_dir() {
      return Err(ConfigError::NotADirectory(canonical));
    }

    Ok(Self {
      workspace_root: canonical,
      scratch_root: scratch_root.into(),
    })
  }

  /// Read `WS` and `WSTMP` from the environment.
  pub fn from_env() -> Result<Self, ConfigError> {
    let workspace_root = required_var(WORKSPACE_ROOT_VAR)?;
    let scratch_root = required_var(SCRATCH_ROOT_VAR)?;

    let config = Self::new(workspace_root, scratch_root)?;
    debug!(
      workspace_root = %config.workspace_root.display(),
      scratch_root = %config.scratch_root.display(),
      "loaded flow config"
    );
    Ok(config)
  }
}

fn required_var(name: &'static str) -> Result<PathBuf, ConfigError> {
  match std::env::var_os(name) {
    Some(value) if !value.is_empty() => Ok(PathBuf::from(value)),
    _ => Err(ConfigError::MissingVar(name)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use tempfile::TempDir;

  #[test]
  #[serial]
  fn reads_both_variables() {
    let temp = TempDir::new().unwrap();
    let scratch = temp.path().join("tmp");

    temp_env::with_vars(
      [
        (WORKSPACE_ROOT_VAR, Some(temp.path().as_os_str())),
        (SCRATCH_ROOT_VAR, Some(scratch.as_os_str())),
      ],
      || {
        let config = FlowConfig::from_env().unwrap();
        assert_eq!(config.workspace_root, dunce::canonicalize(temp.path()).unwrap());
        assert_eq!(config.scratch_root, scratch);
      },
    );
  }

  #[test]
  #[serial]
  fn missing_workspace_root_is_fatal() {
    temp_env::with_vars(
      [(WORKSPACE_ROOT_VAR, None::<&str>), (SCRATCH_ROOT_VAR, Some("/tmp/scratch"))],
      || {
        let err = FlowConfig::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("WS")));
        assert_eq!(err.to_string(), "$WS not set");
      },
    );
  }

  #[test]
  #[serial]
  fn missing_scratch_root_is_fatal() {
    let temp = TempDir::new().unwrap();

    temp_env::with_vars(
      [
        (WORKSPACE_ROOT_VAR, Some(temp.path().as_os_str())),
        (SCRATCH_ROOT_VAR, None),
      ],
      || {
        assert!(matches!(FlowConfig::from_env(), Err(ConfigError::MissingVar("WSTMP"))));
      },
    );
  }

  #[test]
  #[serial]
  fn empty_variable_counts_as_missing() {
    temp_env::with_vars([(WORKSPACE_ROOT_VAR, Some("")), (SCRATCH_ROOT_VAR, Some("/tmp"))], || {
      assert!(matches!(FlowConfig::from_env(), Err(ConfigError::MissingVar("WS"))));
    });
  }

  #[test]
  fn nonexistent_workspace_root_is_rejected() {
    let temp = TempDir::new().unwrap();
    let result = FlowConfig::new(temp.path().join("missing"), temp.path().join("tmp"));
    assert!(matches!(result, Err(ConfigError::WorkspaceRoot { .. })));
  }

  #[test]
  fn file_as_workspace_root_is_rejected() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("comp.yml");
    std::fs::write(&file, "").unwrap();

    let result = FlowConfig::new(&file, temp.path().join("tmp"));
    assert!(matches!(result, Err(ConfigError::NotADirectory(_))));
  }
}
