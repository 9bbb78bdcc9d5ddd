//! Runs the external index build command.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::{info, instrument};

use crate::{EmbedError, Result};

/// Lines of stderr kept in a build failure message.
const STDERR_TAIL_LINES: usize = 20;

pub struct IndexBuilder {
    command: Vec<String>,
    timeout: Duration,
}

impl IndexBuilder {
    pub fn new(command: Vec<String>, timeout: Duration) -> Self {
        Self { command, timeout }
    }

    /// Run the command to completion. A spawn error, non-zero exit or
    /// timeout is an `IndexBuild` error; the child is killed on timeout.
    #[instrument(skip(self), fields(command = ?self.command))]
    pub async fn run(&self) -> Result<()> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| EmbedError::IndexBuild("build command is empty".to_string()))?;

        let started = Instant::now();
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                EmbedError::IndexBuild(format!(
                    "{program} did not finish within {}s",
                    self.timeout.as_secs_f32()
                ))
            })?
            .map_err(|e| EmbedError::IndexBuild(format!("failed to start {program}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EmbedError::IndexBuild(format!(
                "{program} exited with {}: {}",
                output.status,
                stderr_tail(&stderr)
            )));
        }

        info!(elapsed_ms = started.elapsed().as_millis() as u64, "index build finished");
        Ok(())
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
