//! Local executor - runs commands on the host system with log streaming
//!
//! Features:
//! - stdout/stderr streamed line by line into `tracing`
//! - Combined output kept in arrival order
//! - Optional stdin input (used to feed formatters)
//! - Exit code tracking

use crate::executor::{CommandOutput, CommandSpec, Executor};
use async_trait::async_trait;
use buildkit_foundation::{Error, Result};
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// Local executor that runs commands directly on the host
#[derive(Debug, Clone, Default)]
pub struct LocalExecutor;

impl LocalExecutor {
    pub fn new() -> Self {
        Self
    }
}

/// Read `reader` line by line into its own buffer and the shared combined log
fn spawn_reader<R>(
    reader: R,
    stream: Stream,
    combined: Arc<Mutex<Vec<String>>>,
) -> JoinHandle<Vec<String>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        let mut own = Vec::new();
        while let Ok(Some(line)) = lines.next_line().await {
            match stream {
                Stream::Stdout => trace!(target: "buildkit::process", "{}", line),
                Stream::Stderr => trace!(target: "buildkit::process", "[stderr] {}", line),
            }
            combined.lock().await.push(line.clone());
            own.push(line);
        }
        own
    })
}

#[async_trait]
impl Executor for LocalExecutor {
    async fn execute(&self, command: &CommandSpec) -> Result<CommandOutput> {
        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(if command.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(cwd) = &command.cwd {
            cmd.current_dir(cwd);
        }
        for (key, value) in &command.env {
            cmd.env(key, value);
        }

        debug!("Executing {}", command.display());

        let mut child = cmd.spawn().map_err(|e| {
            Error::Process(format!("Failed to spawn {}: {}", command.program, e))
        })?;

        let writer = match (child.stdin.take(), command.stdin.clone()) {
            (Some(mut stdin), Some(input)) => Some(tokio::spawn(async move {
                // dropping stdin afterwards closes the pipe
                if let Err(e) = stdin.write_all(input.as_bytes()).await {
                    warn!("Failed to write process stdin: {}", e);
                }
            })),
            _ => None,
        };

        let combined = Arc::new(Mutex::new(Vec::new()));
        let stdout = child
            .stdout
            .take()
            .map(|out| spawn_reader(out, Stream::Stdout, Arc::clone(&combined)));
        let stderr = child
            .stderr
            .take()
            .map(|err| spawn_reader(err, Stream::Stderr, Arc::clone(&combined)));

        let status = child
            .wait()
            .await
            .map_err(|e| Error::Process(format!("Process error: {}", e)))?;

        if let Some(writer) = writer {
            let _ = writer.await;
        }
        let stdout = match stdout {
            Some(handle) => handle.await.unwrap_or_default(),
            None => Vec::new(),
        };
        let stderr = match stderr {
            Some(handle) => handle.await.unwrap_or_default(),
            None => Vec::new(),
        };
        let combined = combined.lock().await.join("\n");

        let exit_code = status.code();
        debug!("{} exited with {:?}", command.program, exit_code);

        Ok(CommandOutput {
            exit_code,
            stdout: stdout.join("\n"),
            stderr: stderr.join("\n"),
            combined,
        })
    }

    fn is_available(&self, program: &str) -> bool {
        if program.contains(std::path::MAIN_SEPARATOR) || program.contains('/') {
            Path::new(program).exists()
        } else {
            which::which(program).is_ok()
        }
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_executor() {
        let executor = LocalExecutor::new();
        assert_eq!(executor.name(), "local");
        assert!(executor.is_available("sh"));
        assert!(!executor.is_available("definitely-not-a-real-program-xyz"));
    }

    #[tokio::test]
    async fn test_execute_captures_output_and_exit_code() {
        let executor = LocalExecutor::new();
        let spec = CommandSpec::new("sh").args(["-c", "echo out; echo err >&2; exit 3"]);

        let output = executor.execute(&spec).await.unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert!(!output.success());
        assert_eq!(output.stdout, "out");
        assert_eq!(output.stderr, "err");
        assert!(output.combined.contains("out"));
        assert!(output.combined.contains("err"));
    }

    #[tokio::test]
    async fn test_stdin_is_forwarded() {
        let executor = LocalExecutor::new();
        let spec = CommandSpec::new("cat").stdin("line one\nline two\n");

        let output = executor.execute(&spec).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout, "line one\nline two");
    }

    #[tokio::test]
    async fn test_spawn_failure_is_process_error() {
        let executor = LocalExecutor::new();
        let spec = CommandSpec::new("definitely-not-a-real-program-xyz");

        assert!(matches!(
            executor.execute(&spec).await,
            Err(Error::Process(_))
        ));
    }

    #[tokio::test]
    async fn test_runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let executor = LocalExecutor::new();
        let spec = CommandSpec::new("pwd").current_dir(dir.path());

        let output = executor.execute(&spec).await.unwrap();
        let reported = std::fs::canonicalize(output.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
    }
}
