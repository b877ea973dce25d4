//! Common test utilities and helpers

#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// `stepguard` binary with the CI environment stripped, so a runner's own
/// `GITHUB_OUTPUT` or log filter never leaks into assertions
pub fn stepguard() -> Command {
    let mut cmd = Command::cargo_bin("stepguard").unwrap();
    cmd.env_remove("GITHUB_OUTPUT")
        .env_remove("STEPGUARD_CONFIG")
        .env_remove("STEPGUARD_LOG")
        .env_remove("RUST_LOG");
    cmd
}

/// Scratch directory with helpers for seeding files
pub struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a file relative to the context root, creating parent directories
    pub fn with_file(self, relative: impl AsRef<Path>, content: &str) -> Self {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
        self
    }

    pub fn with_dir(self, relative: impl AsRef<Path>) -> Self {
        fs::create_dir_all(self.path().join(relative)).unwrap();
        self
    }

    pub fn join(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.path().join(relative)
    }

    pub fn read(&self, relative: impl AsRef<Path>) -> String {
        fs::read_to_string(self.join(relative)).unwrap()
    }

    /// `stepguard` running inside the context directory
    pub fn command(&self) -> Command {
        let mut cmd = stepguard();
        cmd.current_dir(self.path());
        cmd
    }
}
