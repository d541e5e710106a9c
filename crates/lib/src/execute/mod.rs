//! Command execution inside job workspaces.
//!
//! External tools are run as structured processes: a program, an explicit
//! argument vector and an explicit working directory. Nothing is handed to a
//! shell.

pub mod cmd;
pub mod jobs;
mod types;

pub use cmd::{Runner, ToolCommand};
pub use types::*;
