//! The state machine: one transition per event.
//!
//! Transitions may touch the filesystem in small, bounded ways (creating a
//! sink, reading the next chunk of it, saving the catalog, creating a detached
//! log file). Anything that waits on a child process is returned as an
//! [`Effect`] for the driver.

mod execute;
mod form_keys;
mod keys;

#[cfg(test)]
mod tests;

use chrono::Local;
use recipe_config::CatalogStore;
use recipe_config::catalog;
use recipe_runner::{ExecutionResult, Platform, ProcessRunner, format_report};
use tracing::{debug, info, warn};

use crate::effect::Effect;
use crate::event::AppEvent;
use crate::state::{AppState, Mode};

/// Collaborators a transition may call into.
pub struct UpdateContext<'a> {
    pub store: &'a dyn CatalogStore,
    pub runner: &'a ProcessRunner,
    pub platform: &'a Platform,
}

/// Next state plus the effects the driver must carry out, in order.
#[derive(Debug)]
pub struct Transition {
    pub state: AppState,
    pub effects: Vec<Effect>,
}

impl Transition {
    pub fn quits(&self) -> bool {
        self.effects.iter().any(|effect| matches!(effect, Effect::Quit))
    }
}

pub fn update(mut state: AppState, event: AppEvent, ctx: &UpdateContext<'_>) -> Transition {
    let mut effects = Vec::new();
    match event {
        AppEvent::Key(key) => keys::handle_key(&mut state, key, ctx, &mut effects),
        AppEvent::Resize { width, height } => {
            state.width = width;
            state.height = height;
            let viewport = state.viewport();
            state.scroll.clamp(viewport);
        }
        AppEvent::PollTick { run_id } => on_poll_tick(&mut state, run_id, &mut effects),
        AppEvent::RunFinished { run_id, result } => on_run_finished(&mut state, run_id, result, ctx),
        AppEvent::AttachedFinished { result } => on_attached_finished(&mut state, result, ctx),
    }
    Transition { state, effects }
}

fn on_poll_tick(state: &mut AppState, run_id: u64, effects: &mut Vec<Effect>) {
    let Some(session) = state.session.as_mut() else {
        return;
    };
    if session.run_id != run_id || !session.is_running() {
        debug!(run_id, "dropping stale poll tick");
        return;
    }

    if let Err(error) = session.poll() {
        warn!(run_id, %error, "failed to read output sink");
    }
    let viewport = state.viewport();
    state.scroll.clamp(viewport);
    effects.push(Effect::ScheduleTick {
        run_id,
        after: state.poll_interval,
    });
}

fn on_run_finished(
    state: &mut AppState,
    run_id: u64,
    result: ExecutionResult,
    ctx: &UpdateContext<'_>,
) {
    let active = state
        .session
        .as_ref()
        .is_some_and(|session| session.run_id == run_id);

    if !active {
        debug!(run_id, exit_code = result.exit_code, "run finished after its view was left");
        record_run(state, &result, ctx);
        return;
    }

    let Some(mut session) = state.session.take() else {
        return;
    };
    let result = session.finish(result);
    drop(session);

    info!(
        run_id,
        name = %result.command.name,
        exit_code = result.exit_code,
        "run finished"
    );
    state.output = format_report(&result);
    let viewport = state.viewport();
    state.scroll.clamp(viewport);
    record_run(state, &result, ctx);
}

fn on_attached_finished(state: &mut AppState, result: ExecutionResult, ctx: &UpdateContext<'_>) {
    info!(
        name = %result.command.name,
        exit_code = result.exit_code,
        "attached run finished"
    );
    state.mode = Mode::Normal;
    match &result.error {
        None => state.info(format!("'{}' finished", result.command.name)),
        Some(error) => state.error(format!(
            "'{}' exited with code {}: {error}",
            result.command.name, result.exit_code
        )),
    }
    record_run(state, &result, ctx);
}

/// Stamp `last_run` after a clean exit and persist the catalog.
fn record_run(state: &mut AppState, result: &ExecutionResult, ctx: &UpdateContext<'_>) {
    if result.exit_code != 0 {
        return;
    }
    if !catalog::touch_last_run(&mut state.commands, &result.command.id, Local::now()) {
        debug!(id = %result.command.id, "finished entry is no longer in the catalog");
        return;
    }
    state.refresh_visible();
    persist(state, ctx);
}

/// Save the catalog. A failure is shown but the in-memory change is kept.
pub(crate) fn persist(state: &mut AppState, ctx: &UpdateContext<'_>) -> bool {
    match ctx.store.save(&state.commands) {
        Ok(()) => true,
        Err(error) => {
            warn!(%error, "failed to save catalog");
            state.error(format!("Failed to save commands: {error}"));
            false
        }
    }
}
