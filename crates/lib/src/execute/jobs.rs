//! Built-in jobs: clean, library and compile.
//!
//! `clean` works on the filesystem directly. `library` and `compile` only
//! assemble a [`ToolCommand`]; running it is up to the caller.

use std::fs;
use std::path::Path;

use tracing::info;

use super::cmd::ToolCommand;
use super::types::ExecuteError;
use crate::component::BuildList;
use crate::consts::ESCAPE_MARKER;

pub const LIBRARY_JOB: &str = "library";
pub const COMPILE_JOB: &str = "compile";

pub const DEFAULT_LIBRARY_TOOL: &str = "vlib";
pub const DEFAULT_LIBRARY_NAME: &str = "work";
pub const DEFAULT_COMPILE_TOOL: &str = "vlog";

/// Empty the scratch root, creating it if it does not exist.
///
/// The directory itself is kept (it may be a mount point or a link); only its
/// contents are removed. `protected` is a directory that must survive the
/// clean, typically the workspace root.
pub fn clean(scratch_root: &Path, protected: &Path) -> Result<(), ExecuteError> {
  if scratch_root.parent().is_none() {
    return Err(ExecuteError::UnsafeClean {
      path: scratch_root.to_path_buf(),
      reason: "it is a filesystem root",
    });
  }

  if let Ok(scratch) = dunce::canonicalize(scratch_root)
    && let Ok(protected) = dunce::canonicalize(protected)
    && protected.starts_with(&scratch)
  {
    return Err(ExecuteError::UnsafeClean {
      path: scratch_root.to_path_buf(),
      reason: "it contains the workspace root",
    });
  }

  let clean_err = |path: &Path| {
    let path = path.to_path_buf();
    move |source: std::io::Error| ExecuteError::Clean { path, source }
  };

  if scratch_root.is_dir() {
    for entry in fs::read_dir(scratch_root).map_err(clean_err(scratch_root))? {
      let entry = entry.map_err(clean_err(scratch_root))?;
      let path = entry.path();
      let file_type = entry.file_type().map_err(clean_err(&path))?;

      if file_type.is_dir() {
        fs::remove_dir_all(&path).map_err(clean_err(&path))?;
      } else {
        remove_entry(&path).map_err(clean_err(&path))?;
      }
    }
  }

  fs::create_dir_all(scratch_root).map_err(clean_err(scratch_root))?;
  info!(path = %scratch_root.display(), "cleaned scratch root");
  Ok(())
}

// Directory links on Windows must be removed with remove_dir.
#[cfg(windows)]
fn remove_entry(path: &Path) -> std::io::Result<()> {
  fs::remove_file(path).or_else(|_| fs::remove_dir(path))
}

#[cfg(not(windows))]
fn remove_entry(path: &Path) -> std::io::Result<()> {
  fs::remove_file(path)
}

/// `<tool> <library>`, e.g. `vlib work`.
pub fn library_command(tool: &str, library: &str) -> ToolCommand {
  ToolCommand::new(tool).arg(library)
}

/// `<tool> <extra args...> <options...> <files...>` over the resolved build order.
///
/// Environment references in options and files are expanded here, since no
/// shell will do it.
pub fn compile_command(tool: &str, extra_args: &[String], list: &BuildList<'_>) -> Result<ToolCommand, ExecuteError> {
  let options = list.options().into_iter().map(expand_env).collect::<Result<Vec<_>, _>>()?;
  let files = list.files().into_iter().map(expand_env).collect::<Result<Vec<_>, _>>()?;

  Ok(ToolCommand::new(tool).args(extra_args).args(options).args(files))
}

/// Expand `$NAME` and `${NAME}` from the process environment. `$$` is a literal `$`.
///
/// A name starts with a letter or `_`. A `$` not followed by a name (`$/`,
/// `$1`, `${}`) is kept as is. A name with no value is an error.
pub fn expand_env(fragment: &str) -> Result<String, ExecuteError> {
  if !fragment.contains(ESCAPE_MARKER) {
    return Ok(fragment.to_string());
  }

  let mut out = String::with_capacity(fragment.len());
  let mut rest = fragment;

  while let Some(pos) = rest.find(ESCAPE_MARKER) {
    out.push_str(&rest[..pos]);
    let after = &rest[pos + 1..];

    if let Some(tail) = after.strip_prefix(ESCAPE_MARKER) {
      out.push(ESCAPE_MARKER);
      rest = tail;
      continue;
    }

    let (name, tail) = if let Some(braced) = after.strip_prefix('{') {
      match braced.find('}') {
        Some(end) => (&braced[..end], &braced[end + 1..]),
        None => ("", after),
      }
    } else {
      let end = after
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(after.len());
      (&after[..end], &after[end..])
    };

    if !is_var_name(name) {
      out.push(ESCAPE_MARKER);
      rest = after;
      continue;
    }

    let value = std::env::var(name).map_err(|_| ExecuteError::UndefinedVariable {
      name: name.to_string(),
      fragment: fragment.to_string(),
    })?;
    out.push_str(&value);
    rest = tail;
  }

  out.push_str(rest);
  Ok(out)
}

fn is_var_name(name: &str) -> bool {
  let mut chars = name.chars();
  chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
