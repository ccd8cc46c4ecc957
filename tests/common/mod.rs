// tests/common/mod.rs
// Shared test utilities for integration tests
#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tempfile::TempDir;

/// Helper function to run the loyalty binary with given arguments
pub fn run_loyalty(args: &[&str]) -> (String, String, i32) {
    run_loyalty_in(args, None)
}

/// Run the binary with `cwd` as working directory, ignoring user config files
pub fn run_loyalty_in(args: &[&str], cwd: Option<&Path>) -> (String, String, i32) {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_loyalty"));
    cmd.args(args)
        .env_remove("LOYALTY_LOG")
        .env("XDG_CONFIG_HOME", "/nonexistent")
        .env("HOME", "/nonexistent")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let output = cmd.output().expect("Failed to execute loyalty");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

/// One well-formed log line
pub fn record(user: i64, page: &str) -> String {
    format!(
        r#"{{"userId":{},"pageName":"{}","timestamp":"2024-10-01T12:00:00Z"}}"#,
        user, page
    )
}

/// Write `lines` to `name` inside `dir`, newline-terminated
pub fn write_log(dir: &TempDir, name: &str, lines: &[String]) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("Failed to create log file");
    for line in lines {
        writeln!(file, "{}", line).expect("Failed to write log line");
    }
    path
}

/// Day 1 and day 2 files for the canonical three-user scenario: users 1 and 3
/// are loyal, user 2 only browses two pages.
pub fn scenario_files(dir: &TempDir) -> (PathBuf, PathBuf) {
    let day1 = write_log(
        dir,
        "day1.log",
        &[
            record(1, "blog"),
            record(1, "dashboard"),
            record(2, "blog"),
            record(3, "about"),
            record(3, "blog"),
            record(1, "shop"),
        ],
    );
    let day2 = write_log(
        dir,
        "day2.log",
        &[
            record(1, "about"),
            record(2, "blog"),
            record(2, "shop"),
            record(3, "dashboard"),
            record(3, "faq"),
        ],
    );
    (day1, day2)
}
