//! CLI test runner.
//!
//! Every runner owns a temporary directory used as the data directory and as
//! the config home, so tests never touch the user's inventory.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// Runs the `hwinv` binary against an isolated data directory.
///
/// # Example
///
/// ```ignore
/// let cli = CliRunner::new();
/// cli.run_robot(&["add", "-n", "Laptop", "-s", "SN1", "-d", "2024-01-01", "-l", "Office"])
///    .assert_success();
/// ```
pub struct CliRunner {
    home: TempDir,
}

impl Default for CliRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CliRunner {
    #[must_use]
    pub fn new() -> Self {
        Self {
            home: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Data directory passed via `--data-dir`.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.home.path().join("data")
    }

    /// Directory used as `XDG_CONFIG_HOME`.
    #[must_use]
    pub fn config_home(&self) -> PathBuf {
        self.home.path().join("config")
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.home.path()
    }

    /// A prepared command with isolation flags and environment applied.
    #[must_use]
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("hwinv").expect("hwinv binary not built");
        cmd.arg("--data-dir")
            .arg(self.data_dir())
            .env("XDG_CONFIG_HOME", self.config_home())
            .env("RUST_LOG", "off")
            .env_remove("HWINV_FORMAT")
            .env_remove("HWINV_DATA_DIR")
            .env_remove("NO_COLOR");
        cmd
    }

    /// Execute with the given arguments.
    #[must_use]
    pub fn run(&self, args: &[&str]) -> CliResult {
        let output = self
            .command()
            .args(args)
            .output()
            .expect("Failed to execute command");

        CliResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            args: args.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Execute with `--robot` flag for JSON output.
    #[must_use]
    pub fn run_robot(&self, args: &[&str]) -> CliResult {
        let mut full_args = vec!["--robot"];
        full_args.extend(args);
        self.run(&full_args)
    }

    /// Add a device in robot mode, asserting success.
    pub fn add(&self, name: &str, serial: &str, date: &str, location: &str) -> Value {
        self.run_robot(&["add", "-n", name, "-s", serial, "-d", date, "-l", location])
            .assert_success()
            .json()
    }
}

/// Captured output from a CLI run.
#[derive(Debug, Clone)]
pub struct CliResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub args: Vec<String>,
}

impl CliResult {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Assert the command succeeded.
    pub fn assert_success(&self) -> &Self {
        assert!(
            self.success(),
            "Command {:?} failed with exit code {}: {}",
            self.args,
            self.exit_code,
            self.stderr
        );
        self
    }

    /// Assert the command failed.
    pub fn assert_failure(&self) -> &Self {
        assert!(
            !self.success(),
            "Command {:?} unexpectedly succeeded:\n{}",
            self.args,
            self.stdout
        );
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "stdout does not contain \"{text}\"\nActual stdout:\n{}",
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "stderr does not contain \"{text}\"\nActual stderr:\n{}",
            self.stderr
        );
        self
    }

    /// Parse stdout as JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_str(self.stdout.trim())
            .unwrap_or_else(|_| panic!("Failed to parse JSON:\n{}", self.stdout))
    }

    /// Parse stderr as JSON (robot-mode errors).
    #[must_use]
    pub fn error_json(&self) -> Value {
        serde_json::from_str(self.stderr.trim())
            .unwrap_or_else(|_| panic!("Failed to parse error JSON:\n{}", self.stderr))
    }
}
