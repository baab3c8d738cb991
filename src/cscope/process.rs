use crate::core::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Lines buffered between the stdout reader and the consumer
const LINE_BUFFER: usize = 256;

/// Program, arguments and working directory of one indexer run.
///
/// Built fresh for every operation and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn new(program: impl Into<String>, args: Vec<String>, cwd: &Path) -> Self {
        Self {
            program: program.into(),
            args,
            cwd: cwd.to_path_buf(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, err: std::io::Error) -> Error {
        Error::ProcessSpawn {
            program: self.program.clone(),
            message: err.to_string(),
        }
    }
}

/// Captured result of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Run to completion and capture both streams.
///
/// A non-zero exit fails with the trimmed stderr text.
pub async fn run(invocation: &Invocation) -> Result<ProcessOutput> {
    info!(program = %invocation.program, args = ?invocation.args, cwd = %invocation.cwd.display(), "running");

    let output = invocation
        .command()
        .output()
        .await
        .map_err(|e| invocation.spawn_error(e))?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    for line in stderr.lines() {
        warn!(program = %invocation.program, "stderr: {}", line);
    }

    finish(output.status.code(), stdout, stderr)
}

/// Start a run whose stdout is delivered line by line while it executes
pub fn run_streaming(invocation: &Invocation) -> Result<LineStream> {
    info!(program = %invocation.program, args = ?invocation.args, cwd = %invocation.cwd.display(), "streaming");

    let mut child = invocation
        .command()
        .spawn()
        .map_err(|e| invocation.spawn_error(e))?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let program = invocation.program.clone();
    let (tx, rx) = mpsc::channel(LINE_BUFFER);

    let completion = tokio::spawn(async move {
        let stderr_task = tokio::spawn(collect_stderr(stderr, program));

        if let Some(stdout) = stdout {
            let mut reader = BufReader::new(stdout);
            let mut buf = Vec::new();
            while let Some(line) = read_lossy_line(&mut reader, &mut buf).await? {
                // A dropped receiver still lets the process run to its end.
                let _ = tx.send(line).await;
            }
        }
        drop(tx);

        let status = child.wait().await?;
        let stderr = stderr_task.await.unwrap_or_default();
        finish(status.code(), String::new(), stderr)
    });

    Ok(LineStream { lines: rx, completion })
}

async fn collect_stderr<R>(stderr: Option<R>, program: String) -> String
where
    R: AsyncRead + Unpin,
{
    let Some(stderr) = stderr else {
        return String::new();
    };

    let mut collected = String::new();
    let mut reader = BufReader::new(stderr);
    let mut buf = Vec::new();
    loop {
        match read_lossy_line(&mut reader, &mut buf).await {
            Ok(Some(line)) => {
                warn!(program = %program, "stderr: {}", line);
                collected.push_str(&line);
                collected.push('\n');
            }
            Ok(None) => break,
            Err(e) => {
                warn!(program = %program, "failed to read stderr: {}", e);
                break;
            }
        }
    }
    collected
}

/// Next line without its terminator; bytes that are not UTF-8 are replaced
async fn read_lossy_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

fn finish(code: Option<i32>, stdout: String, stderr: String) -> Result<ProcessOutput> {
    match code {
        Some(0) => Ok(ProcessOutput {
            exit_code: 0,
            stdout: stdout.trim().to_string(),
            stderr,
        }),
        code => Err(Error::ProcessExit {
            code,
            stderr: stderr.trim().to_string(),
        }),
    }
}

/// Output lines of a running process plus its completion signal.
///
/// Each stream owns its own buffers, so several may be in flight at once.
pub struct LineStream {
    lines: mpsc::Receiver<String>,
    completion: JoinHandle<Result<ProcessOutput>>,
}

impl LineStream {
    /// Next stdout line, or `None` once stdout is closed
    pub async fn next_line(&mut self) -> Option<String> {
        self.lines.recv().await
    }

    /// Wait for the process to exit
    pub async fn finish(self) -> Result<ProcessOutput> {
        drop(self.lines);
        match self.completion.await {
            Ok(result) => result,
            Err(e) => Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("process reader failed: {}", e),
            ))),
        }
    }
}
