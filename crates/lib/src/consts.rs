/// File name that marks a directory as a component.
pub const MANIFEST_FILENAME: &str = "comp.yml";

/// Prefix that keeps a file fragment verbatim instead of joining it to the manifest directory.
pub const ESCAPE_MARKER: char = '$';

/// Environment variable holding the tree scanned for manifests.
pub const WORKSPACE_ROOT_VAR: &str = "WS";

/// Environment variable holding the base directory for job workspaces.
pub const SCRATCH_ROOT_VAR: &str = "WSTMP";

/// Name of the link that points at a job's most recent timestamped workspace.
pub const LATEST_LINK: &str = "latest";

/// `chrono` format for run timestamps. Lexical order matches chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
