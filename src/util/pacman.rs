//! Pacman command execution utilities.
//!
//! This module provides functions for executing pacman commands and mapping
//! their failures onto `StoreError`.

use std::process::{Command, Stdio};

use crate::error::StoreError;

/// What: Execute `pacman` with the provided arguments and capture stdout.
///
/// Inputs:
/// - `args`: Slice of CLI arguments passed directly to the pacman binary.
///
/// Output:
/// - Returns the command's stdout as a UTF-8 string or a `StoreError::Command`.
///
/// # Errors
/// - Returns `Err` when `pacman` command execution fails (I/O error or pacman not found)
/// - Returns `Err` when `pacman` exits with non-zero status
/// - Returns `Err` when stdout cannot be decoded as UTF-8
///
/// Details:
/// - Stdin is detached so pacman can never wait on a prompt.
/// - The first stderr line is carried into the error message when present.
pub fn run_pacman(args: &[&str]) -> Result<String, StoreError> {
    let command = format!("pacman {}", args.join(" "));
    let out = Command::new("pacman")
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| StoreError::Command {
            command: command.clone(),
            message: format!("{e} (is pacman installed and in PATH?)"),
        })?;
    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        let detail = stderr.lines().next().unwrap_or_default().trim().to_string();
        let message = if detail.is_empty() {
            format!("exited with {}", out.status)
        } else {
            format!("exited with {}: {detail}", out.status)
        };
        return Err(StoreError::Command { command, message });
    }
    String::from_utf8(out.stdout).map_err(|e| StoreError::Command {
        command,
        message: format!("stdout is not valid UTF-8: {e}"),
    })
}
