use std::io::{Read, Write};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Local};
use portable_pty::{Child, ChildKiller, ExitStatus, MasterPty, PtySize, native_pty_system};
use recipe_commons::ExecError;
use recipe_config::Command;
use tracing::{debug, warn};

use crate::result::{ExecutionResult, exit_code_from_pty_status};
use crate::runner::ProcessRunner;

const READER_GRACE_POLLS: u32 = 50;
const READER_GRACE_STEP: Duration = Duration::from_millis(10);

/// Child running on a pseudo-terminal whose output is copied into a sink by
/// a reader thread.
pub struct PtySession {
    command: Command,
    started_at: DateTime<Local>,
    master: Box<dyn MasterPty + Send>,
    child: Box<dyn Child + Send + Sync>,
    reader: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for PtySession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PtySession")
            .field("command", &self.command.name)
            .field("pid", &self.child.process_id())
            .finish_non_exhaustive()
    }
}

impl ProcessRunner {
    /// Start `command` on a fresh PTY of `size`, copying everything it prints
    /// into `sink` until the terminal closes.
    pub fn start_pty<W>(&self, command: &Command, sink: W, size: PtySize) -> Result<PtySession, ExecError>
    where
        W: Write + Send + 'static,
    {
        let started_at = Local::now();
        let line = self.prepare(command)?;
        let builder = line.to_pty_builder()?;

        let pair = native_pty_system()
            .openpty(size)
            .map_err(|error| ExecError::Pty(format!("failed to allocate PTY pair: {error}")))?;
        let mut child = pair
            .slave
            .spawn_command(builder)
            .map_err(|error| ExecError::Pty(format!("failed to spawn '{}': {error}", line.program)))?;
        drop(pair.slave);

        let reader = match pair.master.try_clone_reader() {
            Ok(reader) => reader,
            Err(error) => {
                reap_orphan(child.as_mut());
                return Err(ExecError::Pty(format!("failed to clone PTY reader: {error}")));
            }
        };

        let thread_name = format!("recipe-pty-{}", child.process_id().unwrap_or_default());
        let reader = match thread::Builder::new()
            .name(thread_name)
            .spawn(move || copy_to_sink(reader, sink))
        {
            Ok(handle) => handle,
            Err(source) => {
                reap_orphan(child.as_mut());
                return Err(ExecError::io("starting the PTY reader", source));
            }
        };

        debug!(program = %line.program, pid = ?child.process_id(), "started PTY command");
        Ok(PtySession {
            command: command.clone(),
            started_at,
            master: pair.master,
            child,
            reader: Some(reader),
        })
    }
}

impl PtySession {
    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn process_id(&self) -> Option<u32> {
        self.child.process_id()
    }

    pub fn resize(&self, size: PtySize) -> Result<(), ExecError> {
        self.master
            .resize(size)
            .map_err(|error| ExecError::Pty(format!("failed to resize PTY: {error}")))
    }

    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>, ExecError> {
        self.child
            .try_wait()
            .map_err(|source| ExecError::io("polling the PTY child", source))
    }

    pub fn wait_blocking(&mut self) -> Result<ExitStatus, ExecError> {
        self.child
            .wait()
            .map_err(|source| ExecError::io("waiting for the PTY child", source))
    }

    pub fn kill(&mut self) -> Result<(), ExecError> {
        self.child
            .kill()
            .map_err(|source| ExecError::io("killing the PTY child", source))
    }

    /// Release the terminal and turn the wait outcome into a result. Gives
    /// the reader a short window to drain what the child wrote last.
    pub fn close(mut self, outcome: Result<ExitStatus, ExecError>) -> ExecutionResult {
        drop(self.master);
        if let Some(reader) = self.reader.take() {
            let mut polls = 0;
            while !reader.is_finished() && polls < READER_GRACE_POLLS {
                thread::sleep(READER_GRACE_STEP);
                polls += 1;
            }
            if reader.is_finished() {
                if reader.join().is_err() {
                    warn!(command = %self.command.name, "PTY reader thread panicked");
                }
            } else {
                debug!(command = %self.command.name, "PTY still held open; detaching reader");
            }
        }

        match outcome {
            Ok(status) => {
                let (exit_code, error) = exit_code_from_pty_status(&status);
                ExecutionResult {
                    command: self.command,
                    output: String::new(),
                    error,
                    started_at: self.started_at,
                    finished_at: Local::now(),
                    exit_code,
                }
            }
            Err(error) => ExecutionResult::failed(self.command, self.started_at, error),
        }
    }
}

/// Kill and reap a child whose session could not be set up.
fn reap_orphan(child: &mut (dyn Child + Send + Sync)) {
    if let Err(error) = child.kill() {
        debug!(%error, "failed to kill PTY child after start-up error");
    }
    if let Err(error) = child.wait() {
        debug!(%error, "failed to reap PTY child after start-up error");
    }
}

fn copy_to_sink<R, W>(mut reader: R, mut sink: W)
where
    R: Read,
    W: Write,
{
    let mut buffer = [0u8; 8192];
    let mut total = 0usize;
    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => {
                total += read;
                if let Err(error) = sink.write_all(&buffer[..read]).and_then(|()| sink.flush()) {
                    warn!(%error, "PTY sink rejected output");
                    break;
                }
            }
            Err(error) if error.kind() == std::io::ErrorKind::Interrupted => continue,
            // Linux reports EIO once the last slave handle closes.
            Err(error) => {
                debug!(%error, "PTY reader stopped");
                break;
            }
        }
    }
    debug!(bytes = total, "PTY reader finished");
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn size() -> PtySize {
        PtySize {
            rows: 24,
            cols: 80,
            pixel_width: 0,
            pixel_height: 0,
        }
    }

    #[test]
    fn pty_output_reaches_the_sink() {
        let logs = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new(Some("sh"), logs.path());
        let sink = SharedSink::default();
        let command = Command::new("1", "hello", "printf pty-hello").with_interactive(true);

        let mut session = runner.start_pty(&command, sink.clone(), size()).unwrap();
        assert!(session.process_id().is_some());
        session.resize(PtySize { rows: 40, ..size() }).unwrap();
        let status = session.wait_blocking();
        let result = session.close(status);

        assert_eq!(result.exit_code, 0);
        let captured = String::from_utf8_lossy(&sink.0.lock().unwrap()).into_owned();
        assert!(captured.contains("pty-hello"), "captured: {captured:?}");
    }

    #[test]
    fn pty_exit_status_is_reported() {
        let logs = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new(Some("sh"), logs.path());
        let command = Command::new("1", "fail", "exit 5").with_interactive(true);

        let mut session = runner.start_pty(&command, std::io::sink(), size()).unwrap();
        let status = session.wait_blocking();
        let result = session.close(status);
        assert_eq!(result.exit_code, 5);
        assert!(result.error.is_some());
    }

    #[test]
    fn orphaned_child_is_killed_and_reaped() {
        let pair = native_pty_system().openpty(size()).unwrap();
        let mut builder = portable_pty::CommandBuilder::new("sh");
        builder.args(["-c", "sleep 30"]);
        let mut child = pair.slave.spawn_command(builder).unwrap();
        drop(pair.slave);

        reap_orphan(child.as_mut());
        let status = child.try_wait().unwrap();
        assert!(status.is_some_and(|status| !status.success()));
    }

    #[test]
    fn pty_rejects_empty_commands() {
        let logs = tempfile::tempdir().unwrap();
        let runner = ProcessRunner::new(Some("sh"), logs.path());
        let error = runner
            .start_pty(&Command::new("1", "x", " "), std::io::sink(), size())
            .unwrap_err();
        assert!(matches!(error, ExecError::EmptyCommand));
    }
}
