use std::fs::File;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use chrono::{DateTime, Local};
use recipe_commons::ExecError;
use recipe_commons::slug::file_stem;
use recipe_config::Command;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::format::format_summary;
use crate::invocation::{CommandLine, resolve_shell};
use crate::result::ExecutionResult;
use crate::workdir::WorkingDirResolver;

const CHUNK_SIZE: usize = 8_192;
const LOG_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Runs catalog entries with one of the process-based strategies. The PTY
/// strategy lives in [`crate::pty`].
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    shell: String,
    logs_dir: PathBuf,
    resolver: WorkingDirResolver,
}

/// A detached run whose log file already exists but whose process has not
/// been started.
#[derive(Debug)]
pub struct DetachedRun {
    pub command: Command,
    pub log_path: PathBuf,
    line: CommandLine,
    log_file: File,
}

impl ProcessRunner {
    /// `shell` is the configured override, if any. Detached runs log into
    /// `logs_dir`.
    pub fn new(shell: Option<&str>, logs_dir: impl Into<PathBuf>) -> Self {
        Self {
            shell: resolve_shell(shell),
            logs_dir: logs_dir.into(),
            resolver: WorkingDirResolver::default(),
        }
    }

    pub fn with_resolver(mut self, resolver: WorkingDirResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    /// Build the command line and resolve its directory. Nothing is spawned.
    pub fn prepare(&self, command: &Command) -> Result<CommandLine, ExecError> {
        let line = CommandLine::build(command, &self.shell)?;
        let dir = self.resolver.resolve(command)?;
        Ok(line.in_dir(dir))
    }

    /// Wait for exit and report stdout followed by stderr.
    pub async fn run_captured(&self, command: &Command) -> ExecutionResult {
        let started_at = Local::now();
        let line = match self.prepare(command) {
            Ok(line) => line,
            Err(error) => return ExecutionResult::failed(command.clone(), started_at, error),
        };

        debug!(program = %line.program, args = ?line.args, "running captured command");
        let output = match line.to_tokio().stdin(Stdio::null()).output().await {
            Ok(output) => output,
            Err(source) => {
                return ExecutionResult::failed(command.clone(), started_at, line.start_error(source));
            }
        };

        let combined = join_streams(
            &String::from_utf8_lossy(&output.stdout),
            &String::from_utf8_lossy(&output.stderr),
        );
        let result = ExecutionResult::from_status(command.clone(), started_at, combined, output.status);
        info!(command = %command.name, exit_code = result.exit_code, "captured command finished");
        result
    }

    /// Proxy stdout and stderr into `sink` as they arrive. The result's
    /// `output` stays empty; the sink holds everything the child wrote.
    pub async fn run_streaming<W>(&self, command: &Command, sink: &mut W) -> ExecutionResult
    where
        W: AsyncWrite + Unpin,
    {
        let started_at = Local::now();
        match self.prepare(command) {
            Ok(line) => stream_line(command, &line, started_at, sink).await,
            Err(error) => ExecutionResult::failed(command.clone(), started_at, error),
        }
    }

    /// Validate the entry and create its log file under the logs directory.
    pub fn prepare_detached(&self, command: &Command) -> Result<DetachedRun, ExecError> {
        let line = self.prepare(command)?;

        std::fs::create_dir_all(&self.logs_dir)
            .map_err(|source| ExecError::io("creating the log directory", source))?;
        let log_path = self.logs_dir.join(format!(
            "{}-{}.log",
            file_stem(&command.name),
            Local::now().format(LOG_TIMESTAMP_FORMAT)
        ));
        let log_file = File::create(&log_path)
            .map_err(|source| ExecError::io("creating the background log", source))?;

        Ok(DetachedRun {
            command: command.clone(),
            log_path,
            line,
            log_file,
        })
    }

    /// Start a prepared run on its own task. The outcome is only traced and
    /// appended to the log.
    pub fn spawn_detached(&self, run: DetachedRun) -> JoinHandle<()> {
        let DetachedRun {
            command,
            log_path,
            line,
            log_file,
        } = run;

        tokio::spawn(async move {
            let started_at = Local::now();
            let mut log = tokio::fs::File::from_std(log_file);
            let result = stream_line(&command, &line, started_at, &mut log).await;

            let mut trailer = format!("\n{}", format_summary(&result));
            if let Some(error) = &result.error {
                trailer.push_str(&format!("Error: {error}\n"));
            }
            if let Err(error) = write_chunk(&mut log, trailer.as_bytes()).await {
                warn!(path = %log_path.display(), %error, "failed to append run summary");
            }
            info!(
                command = %command.name,
                exit_code = result.exit_code,
                log = %log_path.display(),
                "background command finished"
            );
        })
    }

    /// Hand the terminal to the child and block until it exits. Callers must
    /// release the terminal first and call this off the async runtime.
    pub fn run_attached(&self, command: &Command) -> ExecutionResult {
        let started_at = Local::now();
        let line = match self.prepare(command) {
            Ok(line) => line,
            Err(error) => return ExecutionResult::failed(command.clone(), started_at, error),
        };

        debug!(program = %line.program, "running attached command");
        let status = line
            .to_std()
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status();
        match status {
            Ok(status) => ExecutionResult::from_status(command.clone(), started_at, String::new(), status),
            Err(source) => ExecutionResult::failed(command.clone(), started_at, line.start_error(source)),
        }
    }
}

/// Stdout, then stderr on a new line when both are present.
fn join_streams(stdout: &str, stderr: &str) -> String {
    let mut combined = stdout.to_string();
    if !stderr.is_empty() {
        if !combined.is_empty() {
            combined.push('\n');
        }
        combined.push_str(stderr);
    }
    combined
}

async fn stream_line<W>(
    command: &Command,
    line: &CommandLine,
    started_at: DateTime<Local>,
    sink: &mut W,
) -> ExecutionResult
where
    W: AsyncWrite + Unpin,
{
    debug!(program = %line.program, args = ?line.args, "starting streaming command");
    let spawned = line
        .to_tokio()
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn();
    let mut child = match spawned {
        Ok(child) => child,
        Err(source) => return ExecutionResult::failed(command.clone(), started_at, line.start_error(source)),
    };

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        let error = ExecError::io("attaching to the child's pipes", io::Error::from(ErrorKind::BrokenPipe));
        return ExecutionResult::failed(command.clone(), started_at, error);
    };

    let sink_error = proxy_output(stdout, stderr, sink).await;

    let mut result = match child.wait().await {
        Ok(status) => ExecutionResult::from_status(command.clone(), started_at, String::new(), status),
        Err(source) => ExecutionResult::failed(
            command.clone(),
            started_at,
            ExecError::io("waiting for the child", source),
        ),
    };
    if let Some(source) = sink_error
        && result.error.is_none()
    {
        result.error = Some(ExecError::io("writing output", source));
    }
    result
}

/// Copy both pipes into `sink` until each reaches EOF. A failing sink does
/// not stop the draining, otherwise the child could block on a full pipe.
async fn proxy_output<O, E, W>(mut stdout: O, mut stderr: E, sink: &mut W) -> Option<io::Error>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut out_buf = vec![0u8; CHUNK_SIZE];
    let mut err_buf = vec![0u8; CHUNK_SIZE];
    let mut out_open = true;
    let mut err_open = true;
    let mut sink_error: Option<io::Error> = None;

    while out_open || err_open {
        let chunk = tokio::select! {
            read = stdout.read(&mut out_buf), if out_open => match read {
                Ok(0) => { out_open = false; None }
                Ok(n) => Some(&out_buf[..n]),
                Err(error) if error.kind() == ErrorKind::Interrupted => None,
                Err(error) => { debug!(%error, "stdout read failed"); out_open = false; None }
            },
            read = stderr.read(&mut err_buf), if err_open => match read {
                Ok(0) => { err_open = false; None }
                Ok(n) => Some(&err_buf[..n]),
                Err(error) if error.kind() == ErrorKind::Interrupted => None,
                Err(error) => { debug!(%error, "stderr read failed"); err_open = false; None }
            },
        };

        if let Some(bytes) = chunk
            && sink_error.is_none()
            && let Err(error) = write_chunk(sink, bytes).await
        {
            warn!(%error, "output sink rejected a chunk; discarding the rest");
            sink_error = Some(error);
        }
    }
    sink_error
}

async fn write_chunk<W>(sink: &mut W, bytes: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    sink.write_all(bytes).await?;
    sink.flush().await
}
