//! Test utilities for barf-lib.
//!
//! Cross-platform helpers for tests that run external commands, plus small
//! builders for components and manifests.

use std::path::{Path, PathBuf};

use crate::component::Component;
use crate::consts::MANIFEST_FILENAME;
use crate::execute::{Runner, ToolCommand};

/// A component with no files or options.
pub fn component(name: &str, requires: &[&str]) -> Component {
  Component {
    name: name.to_string(),
    files: Vec::new(),
    options: Vec::new(),
    requires: requires.iter().map(|r| r.to_string()).collect(),
    manifest: PathBuf::from(name).join(MANIFEST_FILENAME),
  }
}

/// Write `{root}/{dir}/comp.yml` and return its path.
pub fn write_manifest(root: &Path, dir: &str, name: &str, files: &[&str], requires: &[&str]) -> PathBuf {
  let dir = root.join(dir);
  std::fs::create_dir_all(&dir).unwrap();

  let path = dir.join(MANIFEST_FILENAME);
  let content = format!(
    "name: {name}\nfiles: {}\noptions: []\nrequires: {}\n",
    yaml_list(files),
    yaml_list(requires)
  );
  std::fs::write(&path, content).unwrap();
  path
}

fn yaml_list(items: &[&str]) -> String {
  let quoted: Vec<String> = items.iter().map(|i| format!("'{}'", i)).collect();
  format!("[{}]", quoted.join(", "))
}

/// A runner that captures its transcript and relayed stderr in memory.
pub fn capture_runner() -> Runner<Vec<u8>, Vec<u8>> {
  Runner::new(Vec::new(), Vec::new())
}

/// A command that runs a shell script.
#[cfg(unix)]
pub fn shell_cmd(script: &str) -> ToolCommand {
  ToolCommand::new("/bin/sh").arg("-c").arg(script)
}

#[cfg(windows)]
pub fn shell_cmd(script: &str) -> ToolCommand {
  ToolCommand::new("cmd.exe").arg("/C").arg(script)
}

/// A command that creates a marker file in the current directory.
#[cfg(unix)]
pub fn touch_file(filename: &str) -> ToolCommand {
  ToolCommand::new("/usr/bin/touch").arg(filename)
}

#[cfg(windows)]
pub fn touch_file(filename: &str) -> ToolCommand {
  ToolCommand::new("powershell.exe").args([
    "-NoProfile".to_string(),
    "-Command".to_string(),
    format!("New-Item -ItemType File -Path '{}' -Force | Out-Null", filename),
  ])
}

/// A command that echoes a message.
#[cfg(unix)]
pub fn echo_msg(msg: &str) -> ToolCommand {
  ToolCommand::new("/bin/echo").arg(msg)
}

#[cfg(windows)]
pub fn echo_msg(msg: &str) -> ToolCommand {
  ToolCommand::new("cmd.exe").arg("/C").arg(format!("echo {}", msg))
}
