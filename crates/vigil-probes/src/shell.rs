//! Bounded shell execution for command-based probes.

use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

/// Outcome of a shell invocation. Failures (spawn error, non-zero
/// exit, timeout) all collapse to `ok: false` with empty output.
pub(crate) struct ShellOutput {
    pub ok: bool,
    pub stdout: String,
}

/// Run `sh -c <command>` with a deadline.
///
/// `kill_on_drop` reaps the child when the deadline elapses: dropping
/// the in-flight future kills the process group leader instead of
/// leaving it running unattended.
pub(crate) async fn sh(
    command: &str,
    timeout: Duration,
    env: &HashMap<String, String>,
) -> ShellOutput {
    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true);
    for (key, value) in env {
        cmd.env(key, value);
    }

    let run = async {
        match cmd.output().await {
            Ok(output) => ShellOutput {
                ok: output.status.success(),
                stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            },
            Err(_) => ShellOutput {
                ok: false,
                stdout: String::new(),
            },
        }
    };

    match tokio::time::timeout(timeout, run).await {
        Ok(output) => output,
        Err(_) => ShellOutput {
            ok: false,
            stdout: String::new(),
        },
    }
}
