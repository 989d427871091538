//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod fixtures;

use flowmacro::config::EngineConfig;
use std::path::{Path, PathBuf};

/// Directory holding the definitions shipped with the crate
pub fn definitions_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("definitions")
}

/// The single-node `Noop` definition
pub fn noop_definition() -> PathBuf {
    definitions_dir().join("noop.json")
}

/// Config that only searches the shipped definitions
pub fn test_config() -> EngineConfig {
    EngineConfig {
        definition_dirs: vec![definitions_dir()],
        ..EngineConfig::default()
    }
}
