mod check;
mod list;
mod run;

pub use check::cmd_check;
pub use list::{ListMode, cmd_list};
pub use run::cmd_run;
