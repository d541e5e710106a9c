//! Running external tools.
//!
//! [`Runner::execute`] runs a [`ToolCommand`] in a job's workspace, waits for
//! it to finish, and writes a transcript of what ran:
//!
//! ```text
//! ################################################################################
//! # Command:
//! # vlog -sv /ws/rtl/top.sv
//! # Working dir: /scratch/compile/20261018_091500
//! ################################################################################
//!
//! <captured stdout>
//! ```
//!
//! Captured stderr is relayed to the runner's error stream afterwards. The
//! transcript is written whether or not the command succeeds, so a failed
//! flow can be diagnosed from its console output alone.

use std::fmt;
use std::io::{self, Stderr, Stdout, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, info};

use super::types::{CommandOutput, ExecuteError};
use crate::workspace::Job;

const BANNER_WIDTH: usize = 80;

/// A program and its argument vector.
///
/// `Display` renders a shell-quoted line for the transcript. The command itself
/// is never run through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
  program: String,
  args: Vec<String>,
}

impl ToolCommand {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
    }
  }

  /// Build from an argv slice, program first. `None` when empty.
  pub fn from_argv<S: AsRef<str>>(argv: &[S]) -> Option<Self> {
    let (program, args) = argv.split_first()?;
    Some(Self::new(program.as_ref()).args(args))
  }

  pub fn arg(mut self, arg: impl Into<String>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    self.args.extend(args.into_iter().map(|a| a.as_ref().to_string()));
    self
  }

  pub fn program(&self) -> &str {
    &self.program
  }

  pub fn get_args(&self) -> &[String] {
    &self.args
  }
}

impl fmt::Display for ToolCommand {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", quote(&self.program))?;
    for arg in &self.args {
      write!(f, " {}", quote(arg))?;
    }
    Ok(())
  }
}

fn quote(token: &str) -> String {
  let plain = !token.is_empty()
    && token
      .chars()
      .all(|c| c.is_ascii_alphanumeric() || "_-+=./:,@%".contains(c));

  if plain {
    token.to_string()
  } else {
    format!("'{}'", token.replace('\'', r"'\''"))
  }
}

/// Runs commands and writes their transcript.
///
/// Output goes to the process's stdout/stderr by default; tests substitute
/// in-memory writers.
pub struct Runner<O: Write = Stdout, E: Write = Stderr> {
  out: O,
  err: E,
}

impl Runner {
  pub fn stdio() -> Self {
    Self {
      out: io::stdout(),
      err: io::stderr(),
    }
  }
}

impl Default for Runner {
  fn default() -> Self {
    Self::stdio()
  }
}

impl<O: Write, E: Write> Runner<O, E> {
  pub fn new(out: O, err: E) -> Self {
    Self { out, err }
  }

  pub fn into_parts(self) -> (O, E) {
    (self.out, self.err)
  }

  /// Run `command` in the workspace of `job`.
  ///
  /// Blocks until the process exits. There is no timeout.
  pub fn execute(&mut self, job: &Job, command: &ToolCommand) -> Result<CommandOutput, ExecuteError> {
    let working_dir = job.workspace()?;
    let cmd_text = command.to_string();

    info!(job = %job.name(), cmd = %cmd_text, "executing command");
    debug!(working_dir = %working_dir.display(), "spawning process");

    let output = Command::new(command.program())
      .args(command.get_args())
      .current_dir(&working_dir)
      .stdin(Stdio::null())
      .output()
      .map_err(|source| ExecuteError::Spawn {
        program: command.program().to_string(),
        source,
      })?;

    let captured = CommandOutput {
      stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
      stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    self.write_transcript(&cmd_text, &working_dir, &captured)?;

    debug!(status = %output.status, "command finished");

    if !output.status.success() {
      return Err(ExecuteError::CmdFailed {
        cmd: cmd_text,
        code: output.status.code(),
      });
    }

    Ok(captured)
  }

  fn write_transcript(&mut self, cmd: &str, working_dir: &Path, captured: &CommandOutput) -> io::Result<()> {
    let banner = "#".repeat(BANNER_WIDTH);

    writeln!(self.out, "{banner}")?;
    writeln!(self.out, "# Command:")?;
    writeln!(self.out, "# {cmd}")?;
    writeln!(self.out, "# Working dir: {}", working_dir.display())?;
    writeln!(self.out, "{banner}\n")?;
    if !captured.stdout.is_empty() {
      writeln!(self.out, "{}", captured.stdout)?;
    }
    writeln!(self.out)?;
    self.out.flush()?;

    if !captured.stderr.is_empty() {
      self.err.write_all(captured.stderr.as_bytes())?;
      self.err.flush()?;
    }

    Ok(())
  }
}
