//! On-disk definition fixtures

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory of definition files
pub struct DefinitionDir {
    dir: TempDir,
}

impl DefinitionDir {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file and return its absolute path
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).expect("Failed to write definition");
        path
    }

    /// Copy the shipped noop definition into this directory
    pub fn with_noop(self) -> Self {
        let content =
            std::fs::read_to_string(super::noop_definition()).expect("Failed to read noop.json");
        self.write("noop.json", &content);
        self
    }
}
