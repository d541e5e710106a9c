//! Job workspaces.
//!
//! Every job runs in a scratch directory derived from its name:
//!
//! ```text
//! {scratch_root}/
//! ├── library/                 # job without a timestamp
//! └── compile/
//!     ├── 20261018_091500/     # one directory per timestamped run
//!     ├── 20261018_102233/
//!     └── latest -> 20261018_102233
//! ```
//!
//! Directories are created on first access. The `latest` link is swapped by
//! renaming a freshly created link over it, so readers never observe a
//! missing `latest`. There is no locking between processes.

use std::fs;
use std::io;
use std::path::{Component as PathComponent, Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::consts::{LATEST_LINK, TIMESTAMP_FORMAT};

#[derive(Debug, Error)]
pub enum WorkspaceError {
  #[error("invalid {kind} '{value}': must be a single path component")]
  InvalidName { kind: &'static str, value: String },

  #[error("invalid {kind} '{value}': reserved for the latest link")]
  ReservedName { kind: &'static str, value: String },

  #[error("failed to create workspace {path}: {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to update link {path}: {source}")]
  Link {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// An execution context: a name, the scratch root, and an optional run timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
  name: String,
  scratch_root: PathBuf,
  timestamp: Option<String>,
}

impl Job {
  pub fn new(name: &str, scratch_root: impl Into<PathBuf>) -> Result<Self, WorkspaceError> {
    validate_segment("job name", name)?;
    Ok(Self {
      name: name.to_string(),
      scratch_root: scratch_root.into(),
      timestamp: None,
    })
  }

  /// Use an explicit run timestamp instead of the wall clock.
  pub fn with_timestamp(mut self, timestamp: &str) -> Result<Self, WorkspaceError> {
    validate_segment("timestamp", timestamp)?;
    if timestamp == LATEST_LINK || timestamp.starts_with(&staging_prefix()) {
      return Err(WorkspaceError::ReservedName {
        kind: "timestamp",
        value: timestamp.to_string(),
      });
    }
    self.timestamp = Some(timestamp.to_string());
    Ok(self)
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn scratch_root(&self) -> &Path {
    &self.scratch_root
  }

  pub fn timestamp(&self) -> Option<&str> {
    self.timestamp.as_deref()
  }

  /// Stamp the job with the current local time.
  ///
  /// Meant to be called once per job. Calling it again moves later work into a
  /// new directory; the previous one is left in place.
  pub fn set_timestamp(&mut self) -> &str {
    let stamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
    self.timestamp.insert(stamp)
  }

  /// `{scratch_root}/{name}`, the parent of any timestamped runs.
  pub fn job_dir(&self) -> PathBuf {
    self.scratch_root.join(&self.name)
  }

  /// Where the job's `latest` link lives.
  pub fn latest_link(&self) -> PathBuf {
    self.job_dir().join(LATEST_LINK)
  }

  /// The workspace path, without touching the filesystem.
  pub fn workspace_path(&self) -> PathBuf {
    match &self.timestamp {
      Some(stamp) => self.job_dir().join(stamp),
      None => self.job_dir(),
    }
  }

  /// The workspace path, created if missing.
  ///
  /// For a timestamped job the `latest` link is pointed at the workspace as well.
  pub fn workspace(&self) -> Result<PathBuf, WorkspaceError> {
    let path = self.workspace_path();

    if !path.is_dir() {
      debug!(job = %self.name, path = %path.display(), "creating workspace");
      fs::create_dir_all(&path).map_err(|source| WorkspaceError::CreateDir {
        path: path.clone(),
        source,
      })?;
    }

    if let Some(stamp) = &self.timestamp {
      update_latest(&self.latest_link(), Path::new(stamp))?;
    }

    Ok(path)
  }
}

/// Point `link` at `target`, replacing any existing link in one rename.
///
/// `target` is relative to the link's directory.
fn update_latest(link: &Path, target: &Path) -> Result<(), WorkspaceError> {
  let link_err = |source: io::Error| WorkspaceError::Link {
    path: link.to_path_buf(),
    source,
  };

  if fs::read_link(link).is_ok_and(|current| current == target) {
    return Ok(());
  }

  let staging = link.with_file_name(format!("{}{}", staging_prefix(), std::process::id()));
  match fs::remove_file(&staging) {
    Ok(()) => {}
    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
    Err(e) => return Err(link_err(e)),
  }

  symlink_dir(target, &staging).map_err(link_err)?;
  replace_link(&staging, link).map_err(link_err)?;

  debug!(link = %link.display(), target = %target.display(), "updated latest link");
  Ok(())
}

/// `.latest.`, followed by the pid of the process swapping the link.
fn staging_prefix() -> String {
  format!(".{LATEST_LINK}.")
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
  std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> io::Result<()> {
  std::os::windows::fs::symlink_dir(target, link)
}

#[cfg(unix)]
fn replace_link(staging: &Path, link: &Path) -> io::Result<()> {
  fs::rename(staging, link)
}

// Windows cannot rename over an existing directory link.
#[cfg(windows)]
fn replace_link(staging: &Path, link: &Path) -> io::Result<()> {
  match fs::remove_dir(link) {
    Ok(()) => {}
    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
    Err(e) => return Err(e),
  }
  fs::rename(staging, link)
}

fn validate_segment(kind: &'static str, value: &str) -> Result<(), WorkspaceError> {
  let mut components = Path::new(value).components();
  let single_normal = matches!(
    (components.next(), components.next()),
    (Some(PathComponent::Normal(c)), None) if c == value
  );

  if single_normal {
    Ok(())
  } else {
    Err(WorkspaceError::InvalidName {
      kind,
      value: value.to_string(),
    })
  }
}
