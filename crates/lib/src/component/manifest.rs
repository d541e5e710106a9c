//! Manifest discovery and normalization.
//!
//! The loader walks the workspace root for files named `comp.yml`, parses each
//! into a [`ManifestDecl`], and anchors its file fragments to the directory the
//! manifest lives in. A fragment starting with `$` refers to something the
//! toolchain resolves from the environment and is kept verbatim.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use super::graph::ComponentGraph;
use super::types::Component;
use crate::consts::{ESCAPE_MARKER, MANIFEST_FILENAME};

#[derive(Debug, Error)]
pub enum ManifestError {
  #[error("failed to read manifest {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("malformed manifest {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("manifest {0} declares an empty component name")]
  EmptyName(PathBuf),

  #[error("manifest {path} lists an empty file entry at index {index}")]
  EmptyFile { path: PathBuf, index: usize },

  #[error("component '{name}' is declared twice: {first} and {second}")]
  DuplicateComponent { name: String, first: PathBuf, second: PathBuf },

  #[error("failed to scan {root}: {message}")]
  Walk { root: PathBuf, message: String },
}

/// The fields of a `comp.yml` file, exactly as written.
///
/// All four fields are required. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestDecl {
  pub name: String,
  pub files: Vec<String>,
  pub options: Vec<String>,
  pub requires: Vec<String>,
}

impl ManifestDecl {
  /// Parse a manifest document. `path` is only used for error reporting.
  pub fn parse(content: &str, path: &Path) -> Result<Self, ManifestError> {
    let decl: ManifestDecl = serde_yaml::from_str(content).map_err(|source| ManifestError::Parse {
      path: path.to_path_buf(),
      source,
    })?;

    if decl.name.trim().is_empty() {
      return Err(ManifestError::EmptyName(path.to_path_buf()));
    }

    if let Some(index) = decl.files.iter().position(|f| f.is_empty()) {
      return Err(ManifestError::EmptyFile {
        path: path.to_path_buf(),
        index,
      });
    }

    Ok(decl)
  }

  /// Anchor file fragments to `dir` and produce a [`Component`].
  pub fn into_component(self, dir: &Path, manifest: &Path) -> Component {
    let files = self.files.into_iter().map(|f| anchor_file(&f, dir)).collect();

    Component {
      name: self.name,
      files,
      options: self.options,
      requires: self.requires,
      manifest: manifest.to_path_buf(),
    }
  }
}

/// Join a file fragment to the manifest directory unless it is escaped.
pub fn anchor_file(fragment: &str, dir: &Path) -> String {
  if fragment.starts_with(ESCAPE_MARKER) {
    fragment.to_string()
  } else {
    dir.join(fragment).to_string_lossy().into_owned()
  }
}

/// Read and normalize a single manifest file.
pub fn load_manifest(path: &Path) -> Result<Component, ManifestError> {
  let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
    path: path.to_path_buf(),
    source,
  })?;

  let decl = ManifestDecl::parse(&content, path)?;
  let dir = path.parent().unwrap_or_else(|| Path::new("."));

  Ok(decl.into_component(dir, path))
}

/// Find every `comp.yml` under `root`, in a stable order.
pub fn discover_manifests(root: &Path) -> Result<Vec<PathBuf>, ManifestError> {
  let mut found = Vec::new();

  for entry in WalkDir::new(root).sort_by_file_name() {
    let entry = entry.map_err(|e| ManifestError::Walk {
      root: root.to_path_buf(),
      message: e.to_string(),
    })?;

    if entry.file_type().is_file() && entry.file_name() == MANIFEST_FILENAME {
      found.push(entry.into_path());
    }
  }

  Ok(found)
}

/// Discover and load every manifest under `root` into a new graph.
///
/// Fails on the first malformed manifest or duplicate component name.
pub fn load_components(root: &Path) -> Result<ComponentGraph, ManifestError> {
  let mut graph = ComponentGraph::new();

  for path in discover_manifests(root)? {
    let component = load_manifest(&path)?;
    debug!(name = %component.name, path = %path.display(), "loaded component");
    graph.insert(component)?;
  }

  info!(root = %root.display(), count = graph.len(), "loaded components");
  Ok(graph)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testutil::write_manifest;
  use tempfile::TempDir;
  use tracing_test::traced_test;

  #[test]
  fn parse_full_manifest() {
    let decl = ManifestDecl::parse(
      r#"
name: alu
files: [alu.sv, alu_pkg.sv]
options: [+define+FAST]
requires: [common]
"#,
      Path::new("comp.yml"),
    )
    .unwrap();

    assert_eq!(decl.name, "alu");
    assert_eq!(decl.files, vec!["alu.sv", "alu_pkg.sv"]);
    assert_eq!(decl.options, vec!["+define+FAST"]);
    assert_eq!(decl.requires, vec!["common"]);
  }

  #[test]
  fn parse_accepts_empty_lists() {
    let decl = ManifestDecl::parse("name: leaf\nfiles: []\noptions: []\nrequires: []\n", Path::new("comp.yml")).unwrap();
    assert!(decl.files.is_empty());
    assert!(decl.requires.is_empty());
  }

  #[test]
  fn parse_ignores_unknown_fields() {
    let decl = ManifestDecl::parse(
      "name: leaf\nfiles: []\noptions: []\nrequires: []\nowner: rtl-team\n",
      Path::new("comp.yml"),
    )
    .unwrap();
    assert_eq!(decl.name, "leaf");
  }

  #[test]
  fn parse_rejects_missing_field() {
    let err = ManifestDecl::parse("name: leaf\nfiles: []\noptions: []\n", Path::new("x/comp.yml")).unwrap_err();
    assert!(matches!(err, ManifestError::Parse { .. }));
    assert!(err.to_string().contains("x/comp.yml"));
  }

  #[test]
  fn parse_rejects_wrong_type() {
    let err = ManifestDecl::parse(
      "name: leaf\nfiles: a.sv\noptions: []\nrequires: []\n",
      Path::new("comp.yml"),
    )
    .unwrap_err();
    assert!(matches!(err, ManifestError::Parse { .. }));
  }

  #[test]
  fn parse_rejects_empty_name() {
    let err = ManifestDecl::parse("name: ''\nfiles: []\noptions: []\nrequires: []\n", Path::new("comp.yml")).unwrap_err();
    assert!(matches!(err, ManifestError::EmptyName(_)));
  }

  #[test]
  fn parse_rejects_empty_file_entry() {
    let err = ManifestDecl::parse(
      "name: leaf\nfiles: [a.sv, '']\noptions: []\nrequires: []\n",
      Path::new("comp.yml"),
    )
    .unwrap_err();
    assert!(matches!(err, ManifestError::EmptyFile { index: 1, .. }));
  }

  #[test]
  fn anchor_joins_relative_fragments() {
    let dir = Path::new("/ws/cores/alu");
    assert_eq!(anchor_file("rtl/alu.sv", dir), dir.join("rtl/alu.sv").to_string_lossy());
  }

  #[test]
  fn anchor_keeps_escaped_fragments() {
    assert_eq!(
      anchor_file("$UVM_HOME/src/uvm_pkg.sv", Path::new("/ws/cores/alu")),
      "$UVM_HOME/src/uvm_pkg.sv"
    );
  }

  #[test]
  fn load_manifest_anchors_files_in_order() {
    let temp = TempDir::new().unwrap();
    let path = write_manifest(temp.path(), "alu", "alu", &["b.sv", "$LIB/x.sv", "a.sv", "b.sv"], &[]);

    let component = load_manifest(&path).unwrap();
    let dir = temp.path().join("alu");

    assert_eq!(
      component.files,
      vec![
        dir.join("b.sv").to_string_lossy().into_owned(),
        "$LIB/x.sv".to_string(),
        dir.join("a.sv").to_string_lossy().into_owned(),
        dir.join("b.sv").to_string_lossy().into_owned(),
      ]
    );
    assert_eq!(component.manifest, path);
  }

  #[test]
  fn load_manifest_reports_missing_file() {
    let temp = TempDir::new().unwrap();
    let err = load_manifest(&temp.path().join("comp.yml")).unwrap_err();
    assert!(matches!(err, ManifestError::Read { .. }));
  }

  #[test]
  fn discover_finds_nested_manifests_only() {
    let temp = TempDir::new().unwrap();
    write_manifest(temp.path(), "a", "a", &[], &[]);
    write_manifest(temp.path(), "deep/nested/b", "b", &[], &[]);
    std::fs::write(temp.path().join("a/comp.yaml"), "not a manifest").unwrap();

    let found = discover_manifests(temp.path()).unwrap();

    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|p| p.file_name().unwrap() == MANIFEST_FILENAME));
  }

  #[test]
  fn load_components_builds_graph() {
    let temp = TempDir::new().unwrap();
    write_manifest(temp.path(), "leaf", "leaf", &["leaf.sv"], &[]);
    write_manifest(temp.path(), "top", "top", &["top.sv"], &["leaf"]);

    let graph = load_components(temp.path()).unwrap();

    assert_eq!(graph.len(), 2);
    assert_eq!(graph.get("top").unwrap().requires, vec!["leaf"]);
  }

  #[test]
  #[traced_test]
  fn load_components_logs_each_manifest() {
    let temp = TempDir::new().unwrap();
    write_manifest(temp.path(), "alu", "alu", &[], &[]);

    load_components(temp.path()).unwrap();

    assert!(logs_contain("loaded component"));
    assert!(logs_contain("name=alu"));
    assert!(logs_contain("count=1"));
  }

  #[test]
  fn load_components_rejects_duplicate_names() {
    let temp = TempDir::new().unwrap();
    write_manifest(temp.path(), "a", "shared", &[], &[]);
    write_manifest(temp.path(), "b", "shared", &[], &[]);

    let err = load_components(temp.path()).unwrap_err();

    match err {
      ManifestError::DuplicateComponent { name, first, second } => {
        assert_eq!(name, "shared");
        assert_eq!(first, temp.path().join("a").join(MANIFEST_FILENAME));
        assert_eq!(second, temp.path().join("b").join(MANIFEST_FILENAME));
      }
      other => panic!("expected DuplicateComponent, got {other:?}"),
    }
  }

  #[test]
  fn load_components_of_empty_tree() {
    let temp = TempDir::new().unwrap();
    let graph = load_components(temp.path()).unwrap();
    assert!(graph.is_empty());
  }
}
