// file: src/runner/mod.rs
// version: 1.0.0
// guid: 6b1e84d7-20f5-4d9a-8ce3-47a901b6f2d8

//! External process execution
//!
//! Runs security tools as child processes with argv arrays only. There is no
//! shell anywhere in this path: arguments are passed verbatim to the program,
//! so shell metacharacters in user input are inert. Output capture is capped
//! and every run carries a hard timeout.

pub mod parsers;

use crate::{AgentError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};

/// One planned tool launch: a program plus an argv array
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Catalogue name of the tool
    pub tool: String,
    /// Program to execute (resolved path when probing found one)
    pub program: String,
    /// Arguments, passed as an array, never through a shell
    pub args: Vec<String>,
    /// File the tool writes its own report to, when it supports one
    pub output_file: Option<PathBuf>,
    /// Whether failure of this invocation fails the whole plan
    pub required: bool,
    /// Short label for multi-tool result breakdowns
    pub label: String,
}

impl ToolInvocation {
    /// Human-readable rendition of the command line, for logs and results
    pub fn command_line(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Captured outcome of a single child process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub duration_secs: f64,
    pub truncated: bool,
    pub timed_out: bool,
}

impl RunOutput {
    /// Clean termination: exit code 0 and untruncated capture
    pub fn success(&self) -> bool {
        self.exit_code == Some(0) && !self.truncated
    }
}

/// Seam between planning and process execution. The pipeline only ever
/// talks to this trait, so tests can substitute a recording runner.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        working_dir: &Path,
        timeout: Duration,
    ) -> Result<RunOutput>;
}

/// The real runner: tokio child processes with capped capture
pub struct ProcessRunner {
    max_output_bytes: usize,
}

impl ProcessRunner {
    pub fn new(max_output_bytes: usize) -> Self {
        Self { max_output_bytes }
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        working_dir: &Path,
        timeout: Duration,
    ) -> Result<RunOutput> {
        debug!("Spawning: {} {:?}", program, args);
        let started = Instant::now();

        let mut child = Command::new(program)
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| AgentError::execution(format!("Failed to spawn {}: {}", program, e)))?;

        let stdout_pipe = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::internal("child stdout not captured"))?;
        let stderr_pipe = child
            .stderr
            .take()
            .ok_or_else(|| AgentError::internal("child stderr not captured"))?;

        let cap = self.max_output_bytes;
        let capture = async {
            let (stdout, stderr) = tokio::join!(
                read_capped(stdout_pipe, cap),
                read_capped(stderr_pipe, cap)
            );
            let status = child.wait().await?;
            Ok::<_, AgentError>((status, stdout?, stderr?))
        };

        match tokio::time::timeout(timeout, capture).await {
            Ok(result) => {
                let (status, (stdout, out_truncated), (stderr, err_truncated)) = result?;
                Ok(RunOutput {
                    exit_code: status.code(),
                    stdout,
                    stderr,
                    duration_secs: started.elapsed().as_secs_f64(),
                    truncated: out_truncated || err_truncated,
                    timed_out: false,
                })
            }
            Err(_) => {
                warn!("Killing {} after {}s timeout", program, timeout.as_secs());
                // start_kill + wait so the child is reaped, not left as a zombie
                let _ = child.start_kill();
                let _ = child.wait().await;
                Err(AgentError::timeout(format!(
                    "{} exceeded the {}s execution timeout",
                    program,
                    timeout.as_secs()
                )))
            }
        }
    }
}

/// Read a pipe to completion, keeping at most `cap` bytes. The remainder is
/// drained and discarded so the child never stalls on a full pipe.
async fn read_capped<R: AsyncRead + Unpin>(mut reader: R, cap: usize) -> Result<(String, bool)> {
    let mut collected: Vec<u8> = Vec::new();
    let mut truncated = false;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        if truncated {
            continue;
        }
        let room = cap - collected.len();
        if n > room {
            collected.extend_from_slice(&chunk[..room]);
            truncated = true;
        } else {
            collected.extend_from_slice(&chunk[..n]);
        }
    }

    let mut text = String::from_utf8_lossy(&collected).into_owned();
    if truncated {
        text.push_str("\n[output truncated]");
    }
    Ok((text, truncated))
}
