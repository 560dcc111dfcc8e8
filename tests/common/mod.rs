//! Common test utilities for orgdesk integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't pollute
//! the user's `~/.local/share/orgdesk/` or `~/.config/orgdesk/` directories.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// A test environment with isolated data storage.
///
/// Each `TestEnv` creates three temporary directories:
/// - `workspace_dir`: The working directory and home of any data files
/// - `data_dir`: Holds the session (via `OD_DATA_DIR` env var)
/// - `config_dir`: Holds the system config.kdl (via `OD_CONFIG_DIR`)
///
/// The `od()` method returns a `Command` that sets both variables
/// per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub workspace_dir: TempDir,
    pub data_dir: TempDir,
    pub config_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with isolated directories.
    pub fn new() -> Self {
        Self {
            workspace_dir: TempDir::new().unwrap(),
            data_dir: TempDir::new().unwrap(),
            config_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the od binary with isolated data directories.
    pub fn od(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_od"));
        cmd.current_dir(self.workspace_dir.path());
        cmd.env("OD_DATA_DIR", self.data_dir.path());
        cmd.env("OD_CONFIG_DIR", self.config_dir.path());
        cmd.env_remove("OD_WORKSPACE");
        cmd.env_remove("OD_LOG");
        cmd
    }

    /// Get the path to the workspace directory.
    pub fn path(&self) -> &Path {
        self.workspace_dir.path()
    }

    /// Get the path to the data directory.
    pub fn data_path(&self) -> &Path {
        self.data_dir.path()
    }

    /// Write a JSON data file into the workspace and return its path.
    pub fn write_data(&self, name: &str, json: &str) -> PathBuf {
        let path = self.workspace_dir.path().join(name);
        std::fs::write(&path, json).unwrap();
        path
    }

    /// Write the system-level config.kdl.
    pub fn write_system_config(&self, kdl: &str) {
        std::fs::write(self.config_dir.path().join("config.kdl"), kdl).unwrap();
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse stdout of a successful command as JSON.
pub fn parse_json(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).unwrap()
}
