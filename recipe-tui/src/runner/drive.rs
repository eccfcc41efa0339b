use std::fs::OpenOptions;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use ratatui::{Terminal, backend::Backend};
use recipe_commons::ExecError;
use recipe_config::Command;
use recipe_runner::{ExecutionResult, PtySession, PtySize};
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use crate::effect::Effect;
use crate::event::AppEvent;
use crate::scroll::visible_lines;
use crate::state::AppState;
use crate::update::{Transition, update};
use crate::view;

use super::AppServices;
use super::events::{EventListener, EventLoop};
use super::terminal_modes::TerminalGuard;

/// A PTY child the driver is waiting on.
struct ActivePty {
    run_id: u64,
    session: PtySession,
}

/// Everything the main loop needs besides the state it threads through.
pub(super) struct Driver<'a, B: Backend> {
    pub(super) terminal: &'a mut Terminal<B>,
    pub(super) guard: &'a mut TerminalGuard,
    pub(super) inputs: &'a mut EventListener,
    pub(super) event_loop: &'a mut EventLoop,
    pub(super) services: &'a AppServices,
}

#[cfg(unix)]
fn is_suspend_shortcut(event: &ratatui::crossterm::event::Event) -> bool {
    use ratatui::crossterm::event::{Event as CrosstermEvent, KeyCode, KeyEventKind, KeyModifiers};

    matches!(
        event,
        CrosstermEvent::Key(key)
            if matches!(key.kind, KeyEventKind::Press)
                && key.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(key.code, KeyCode::Char('z') | KeyCode::Char('Z'))
    )
}

fn pty_size(state: &AppState) -> PtySize {
    let rows = u16::try_from(visible_lines(state.height, state.chrome_rows)).unwrap_or(u16::MAX);
    PtySize {
        rows,
        cols: state.width.max(1),
        pixel_width: 0,
        pixel_height: 0,
    }
}

fn current_size_event() -> Option<AppEvent> {
    match ratatui::crossterm::terminal::size() {
        Ok((width, height)) => Some(AppEvent::Resize { width, height }),
        Err(error) => {
            debug!(%error, "failed to query terminal size");
            None
        }
    }
}

impl<B: Backend> Driver<'_, B> {
    pub(super) async fn drive(mut self, mut state: AppState) -> Result<()> {
        let (app_tx, mut app_rx) = tokio::sync::mpsc::unbounded_channel();
        let mut ptys: Vec<ActivePty> = Vec::new();
        let mut pty_poll = tokio::time::interval(state.poll_interval);
        pty_poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            self.terminal
                .draw(|frame| view::render(frame, &state))
                .map_err(|error| anyhow::anyhow!("failed to draw the interface: {error}"))?;

            let event = tokio::select! {
                input = self.inputs.recv() => {
                    let Some(input) = input else {
                        break;
                    };
                    #[cfg(unix)]
                    if is_suspend_shortcut(&input) {
                        if let Err(error) = self.suspend_to_shell(&app_tx) {
                            warn!(%error, "failed to suspend");
                        }
                        continue;
                    }
                    match AppEvent::from_terminal(input) {
                        Some(event) => event,
                        None => continue,
                    }
                }
                Some(event) = app_rx.recv() => event,
                _ = pty_poll.tick(), if !ptys.is_empty() => {
                    reap_finished(&mut ptys, &app_tx);
                    continue;
                }
            };

            let resized = matches!(event, AppEvent::Resize { .. });
            let Transition {
                state: next,
                effects,
            } = update(state, event, &self.services.context());
            state = next;

            // Only the newest child is on screen; older ones keep their size.
            if resized
                && let Some(active) = ptys.last()
                && let Err(error) = active.session.resize(pty_size(&state))
            {
                debug!(%error, "failed to resize pseudo-terminal");
            }

            for effect in effects {
                match effect {
                    Effect::Quit => {
                        if !ptys.is_empty() {
                            debug!(count = ptys.len(), "leaving pseudo-terminal children behind");
                        }
                        return Ok(());
                    }
                    Effect::ScheduleTick { run_id, after } => {
                        let tx = app_tx.clone();
                        tokio::spawn(async move {
                            tokio::time::sleep(after).await;
                            let _ = tx.send(AppEvent::PollTick { run_id });
                        });
                    }
                    Effect::StartStreaming {
                        run_id,
                        command,
                        sink,
                    } => self.start_streaming(run_id, command, sink.as_path(), &app_tx),
                    Effect::StartPty {
                        run_id,
                        command,
                        sink,
                    } => {
                        if let Some(active) =
                            self.start_pty(run_id, command, &sink, pty_size(&state), &app_tx)
                        {
                            ptys.push(active);
                        }
                    }
                    Effect::SpawnDetached(run) => {
                        self.services.runner.spawn_detached(run);
                    }
                    Effect::RunAttached { command } => {
                        let result = self.run_attached(command).await?;
                        let _ = app_tx.send(AppEvent::AttachedFinished { result });
                        if let Some(resize) = current_size_event() {
                            let _ = app_tx.send(resize);
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn start_streaming(
        &self,
        run_id: u64,
        command: Command,
        sink: &Path,
        app_tx: &UnboundedSender<AppEvent>,
    ) {
        let runner = self.services.runner.clone();
        let tx = app_tx.clone();
        let sink = sink.to_path_buf();
        tokio::spawn(async move {
            let result = match tokio::fs::OpenOptions::new().append(true).open(&sink).await {
                Ok(mut file) => runner.run_streaming(&command, &mut file).await,
                Err(source) => ExecutionResult::failed(
                    command,
                    Local::now(),
                    ExecError::io("opening the output sink", source),
                ),
            };
            let _ = tx.send(AppEvent::RunFinished { run_id, result });
        });
    }

    fn start_pty(
        &self,
        run_id: u64,
        command: Command,
        sink: &Path,
        size: PtySize,
        app_tx: &UnboundedSender<AppEvent>,
    ) -> Option<ActivePty> {
        let started_at = Local::now();
        let opened = OpenOptions::new()
            .append(true)
            .open(sink)
            .map_err(|source| ExecError::io("opening the output sink", source));
        let started =
            opened.and_then(|file| self.services.runner.start_pty(&command, file, size));

        match started {
            Ok(session) => {
                debug!(run_id, pid = ?session.process_id(), "pseudo-terminal child started");
                Some(ActivePty { run_id, session })
            }
            Err(error) => {
                let result = ExecutionResult::failed(command, started_at, error);
                let _ = app_tx.send(AppEvent::RunFinished { run_id, result });
                None
            }
        }
    }

    /// Give the terminal to `command` until it exits.
    async fn run_attached(&mut self, command: Command) -> Result<ExecutionResult> {
        self.event_loop.stop().await;
        self.inputs.clear_queue();
        self.guard.release();

        let runner = self.services.runner.clone();
        let attached = command.clone();
        let joined = tokio::task::spawn_blocking(move || runner.run_attached(&attached)).await;

        self.guard
            .reclaim()
            .context("failed to take the terminal back after an attached command")?;
        self.terminal
            .clear()
            .map_err(|error| anyhow::anyhow!("failed to clear terminal: {error}"))?;
        self.inputs.clear_queue();
        self.event_loop.restart();

        Ok(joined.unwrap_or_else(|error| {
            ExecutionResult::failed(
                command,
                Local::now(),
                ExecError::io("waiting for the attached command", io::Error::other(error)),
            )
        }))
    }

    #[cfg(unix)]
    fn suspend_to_shell(&mut self, app_tx: &UnboundedSender<AppEvent>) -> Result<()> {
        use signal_hook::{consts::signal::SIGTSTP, low_level::raise};

        let channels = self.event_loop.channels().clone();
        channels.pause();
        self.inputs.clear_queue();
        self.guard.release();

        let suspend_result = raise(SIGTSTP).context("failed to suspend process with SIGTSTP");

        let reclaim_result = self
            .guard
            .reclaim()
            .context("failed to take the terminal back after resume");
        channels.resume();
        self.inputs.clear_queue();
        suspend_result?;
        reclaim_result?;

        self.terminal
            .clear()
            .map_err(|error| anyhow::anyhow!("failed to clear terminal after resume: {error}"))?;
        if let Some(resize) = current_size_event() {
            let _ = app_tx.send(resize);
        }
        Ok(())
    }
}

/// Finalise PTY children that have exited. Closing waits briefly for the
/// reader thread, so it runs off the async workers.
fn reap_finished(ptys: &mut Vec<ActivePty>, app_tx: &UnboundedSender<AppEvent>) {
    let mut index = 0;
    while index < ptys.len() {
        let outcome = match ptys[index].session.try_wait() {
            Ok(None) => {
                index += 1;
                continue;
            }
            Ok(Some(status)) => Ok(status),
            Err(error) => Err(error),
        };

        let ActivePty { run_id, session } = ptys.remove(index);
        let tx = app_tx.clone();
        tokio::task::spawn_blocking(move || {
            let result = session.close(outcome);
            let _ = tx.send(AppEvent::RunFinished { run_id, result });
        });
    }
}
