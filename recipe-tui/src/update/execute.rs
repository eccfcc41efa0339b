use chrono::Local;
use recipe_commons::ExecError;
use recipe_config::Command;
use recipe_runner::{ExecutionResult, ExecutionStrategy, format_report};
use tracing::{debug, info, warn};

use crate::effect::Effect;
use crate::session::{ExecutionSession, TransientSink};
use crate::state::{AppState, Mode};

use super::UpdateContext;

/// Run the selected entry with the strategy its flags and the background
/// toggle call for.
pub(super) fn execute_selected(
    state: &mut AppState,
    ctx: &UpdateContext<'_>,
    effects: &mut Vec<Effect>,
) {
    let Some(command) = state.selected_command().cloned() else {
        return;
    };
    let strategy = ExecutionStrategy::select(&command, state.run_in_background, ctx.platform);
    debug!(name = %command.name, strategy = strategy.as_str(), "executing catalog entry");

    match strategy {
        ExecutionStrategy::Detached => start_detached(state, command, ctx, effects),
        ExecutionStrategy::AttachedPlain => {
            if let Err(error) = ctx.runner.prepare(&command) {
                show_failure(state, command, error);
                return;
            }
            state.info(format!("Running '{}'...", command.name));
            effects.push(Effect::RunAttached { command });
        }
        ExecutionStrategy::Synchronous
        | ExecutionStrategy::Streaming
        | ExecutionStrategy::AttachedPty => start_session(state, command, strategy, ctx, effects),
    }
}

fn start_detached(
    state: &mut AppState,
    command: Command,
    ctx: &UpdateContext<'_>,
    effects: &mut Vec<Effect>,
) {
    match ctx.runner.prepare_detached(&command) {
        Ok(run) => {
            info!(name = %command.name, log = %run.log_path.display(), "starting background task");
            state.info(format!(
                "Background task started. Log: {}",
                run.log_path.display()
            ));
            effects.push(Effect::SpawnDetached(run));
        }
        Err(error) if error.is_pre_spawn() => show_failure(state, command, error),
        Err(error) => {
            warn!(name = %command.name, %error, "failed to prepare background task");
            state.error(format!("Failed to start background task: {error}"));
        }
    }
}

fn start_session(
    state: &mut AppState,
    command: Command,
    strategy: ExecutionStrategy,
    ctx: &UpdateContext<'_>,
    effects: &mut Vec<Effect>,
) {
    if let Err(error) = ctx.runner.prepare(&command) {
        show_failure(state, command, error);
        return;
    }

    let sink = match TransientSink::create() {
        Ok(sink) => sink,
        Err(error) => {
            warn!(%error, "failed to create output sink");
            state.error(format!("Failed to create temporary output file: {error}"));
            return;
        }
    };

    let run_id = state.allocate_run_id();
    let sink_path = sink.path().to_path_buf();
    state.session = Some(ExecutionSession::new(
        run_id,
        command.clone(),
        strategy,
        sink,
    ));
    state.executing = Some(command.clone());
    state.output.clear();
    state.scroll.reset();
    state.mode = Mode::Executing;

    effects.push(match strategy {
        ExecutionStrategy::AttachedPty => Effect::StartPty {
            run_id,
            command,
            sink: sink_path,
        },
        _ => Effect::StartStreaming {
            run_id,
            command,
            sink: sink_path,
        },
    });
    effects.push(Effect::ScheduleTick {
        run_id,
        after: state.poll_interval,
    });
}

/// Show a run that failed before any process, sink or log existed.
fn show_failure(state: &mut AppState, command: Command, error: ExecError) {
    debug!(name = %command.name, %error, "run rejected before start");
    let result = ExecutionResult::failed(command.clone(), Local::now(), error);
    state.session = None;
    state.executing = Some(command);
    state.output = format_report(&result);
    state.scroll.reset();
    state.mode = Mode::Executing;
}
