//! The job module runs one generator process to completion: it spawns the child,
//! drains its output streams and enforces the time budget.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::constants::KILL_GRACE_PERIOD_MS;
use crate::error::GenerateError;

const READ_CHUNK_SIZE: usize = 8192;

/// Everything needed to start one generator process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Variables added on top of the inherited environment.
    pub env: BTreeMap<String, String>,
    pub timeout: Duration,
}

impl JobInvocation {
    /// Arguments with the value following every `--*-api-key` flag masked, for logging.
    pub fn redacted_args(&self) -> Vec<String> {
        let mut masked = Vec::with_capacity(self.args.len());
        let mut hide_next = false;
        for arg in &self.args {
            if hide_next {
                masked.push("***".to_owned());
            } else {
                masked.push(arg.clone());
            }
            hide_next = arg.starts_with("--") && arg.ends_with("-api-key");
        }
        masked
    }
}

/// Outcome of a process that ran to exit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobResult {
    /// Exit code, or `-1` when the process was ended by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl JobResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs generator jobs. Implemented by [`ProcessJobRunner`] and by test doubles.
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Runs the invocation until the process exits or its timeout elapses.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::Launch`] if the process cannot be started or awaited, and
    /// [`GenerateError::Timeout`] if it was terminated for exceeding `invocation.timeout`.
    async fn run(&self, invocation: JobInvocation) -> Result<JobResult, GenerateError>;
}

/// Spawns a real OS process per invocation.
///
/// Children are killed when their handle is dropped, so abandoning the `run` future
/// (for instance when the HTTP caller disconnects) also ends the process.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessJobRunner;

#[async_trait]
impl JobRunner for ProcessJobRunner {
    async fn run(&self, invocation: JobInvocation) -> Result<JobResult, GenerateError> {
        let program = invocation.program.display().to_string();
        info!(
            "Executing {program} {} in {}",
            invocation.redacted_args().join(" "),
            invocation.working_dir.display()
        );

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.working_dir)
            .envs(&invocation.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| GenerateError::Launch {
                program: program.clone(),
                reason: e.to_string(),
            })?;

        let stdout_reader = tokio::spawn(collect_stream(child.stdout.take(), "stdout"));
        let stderr_reader = tokio::spawn(collect_stream(child.stderr.take(), "stderr"));

        let waited = tokio::time::timeout(invocation.timeout, child.wait()).await;
        let status = match waited {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                terminate(&mut child, &program).await;
                stdout_reader.abort();
                stderr_reader.abort();
                return Err(GenerateError::Launch {
                    program,
                    reason: format!("failed waiting for process: {e}"),
                });
            }
            Err(_elapsed) => {
                warn!(
                    "{program} exceeded {}s, terminating it",
                    invocation.timeout.as_secs()
                );
                terminate(&mut child, &program).await;
                stdout_reader.abort();
                stderr_reader.abort();
                return Err(GenerateError::Timeout {
                    budget: invocation.timeout,
                });
            }
        };

        let stdout = join_stream(stdout_reader, "stdout").await;
        let stderr = join_stream(stderr_reader, "stderr").await;
        let exit_code = status.code().unwrap_or(-1);
        info!("{program} exited with code {exit_code}");

        Ok(JobResult {
            exit_code,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }
}

/// Kills the child and reaps it so no zombie or orphan is left behind.
async fn terminate(child: &mut Child, program: &str) {
    let grace = Duration::from_millis(KILL_GRACE_PERIOD_MS);
    match tokio::time::timeout(grace, child.kill()).await {
        Ok(Ok(())) => debug!("{program} terminated"),
        Ok(Err(e)) => warn!("Failed to terminate {program}: {e}"),
        Err(_elapsed) => warn!("{program} was not reaped within {}ms", grace.as_millis()),
    }
}

/// Appends everything the stream yields, logging each chunk as it arrives.
async fn collect_stream<R>(stream: Option<R>, label: &'static str) -> Vec<u8>
where
    R: AsyncRead + Unpin,
{
    let Some(mut stream) = stream else {
        return Vec::new();
    };

    let mut collected = Vec::new();
    let mut chunk = vec![0_u8; READ_CHUNK_SIZE];
    loop {
        match stream.read(&mut chunk).await {
            Ok(0) => break,
            Ok(read) => {
                let bytes = chunk.get(..read).unwrap_or_default();
                debug!("Generator {label}: {}", String::from_utf8_lossy(bytes).trim_end());
                collected.extend_from_slice(bytes);
            }
            Err(e) => {
                warn!("Failed to read generator {label}: {e}");
                break;
            }
        }
    }

    collected
}

/// Waits for a stream reader after the process exited. Descendants may still hold the
/// pipe open, so the wait is bounded.
async fn join_stream(reader: JoinHandle<Vec<u8>>, label: &str) -> Vec<u8> {
    let grace = Duration::from_millis(KILL_GRACE_PERIOD_MS);
    let abort = reader.abort_handle();
    match tokio::time::timeout(grace, reader).await {
        Ok(Ok(bytes)) => bytes,
        Ok(Err(e)) => {
            warn!("Generator {label} reader failed: {e}");
            Vec::new()
        }
        Err(_elapsed) => {
            abort.abort();
            warn!("Generator {label} still open {}ms after exit, dropping it", grace.as_millis());
            Vec::new()
        }
    }
}
