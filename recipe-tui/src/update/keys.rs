use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use recipe_config::catalog;
use tracing::debug;

use crate::effect::Effect;
use crate::form::FormState;
use crate::state::{AppState, Mode};

use super::{UpdateContext, execute, form_keys, persist};

pub(super) fn handle_key(
    state: &mut AppState,
    key: KeyEvent,
    ctx: &UpdateContext<'_>,
    effects: &mut Vec<Effect>,
) {
    if is_ctrl_c(&key) {
        effects.push(Effect::Quit);
        return;
    }

    match state.mode {
        Mode::Normal => normal_key(state, key, ctx, effects),
        Mode::FilterInput => filter_key(state, key),
        Mode::FormEdit => form_keys::form_key(state, key, ctx, effects),
        Mode::Executing => executing_key(state, key),
        Mode::Help => help_key(state, key, effects),
    }
}

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
}

pub(super) fn is_ctrl_u(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('u') | KeyCode::Char('U'))
}

/// Printable character typed without Control or Alt.
pub(super) fn typed_char(key: &KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(ch)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Some(ch)
        }
        _ => None,
    }
}

fn normal_key(
    state: &mut AppState,
    key: KeyEvent,
    ctx: &UpdateContext<'_>,
    effects: &mut Vec<Effect>,
) {
    state.notice = None;
    match key.code {
        KeyCode::Char('q') => effects.push(Effect::Quit),
        KeyCode::Up | KeyCode::Char('k') => {
            state.selected = state.selected.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if state.selected + 1 < state.visible.len() {
                state.selected += 1;
            }
        }
        KeyCode::Enter => execute::execute_selected(state, ctx, effects),
        KeyCode::Char('n') => {
            state.form = Some(FormState::new_entry());
            state.mode = Mode::FormEdit;
        }
        KeyCode::Char('e') => {
            if let Some(command) = state.selected_command().cloned() {
                state.form = Some(FormState::edit(command));
                state.mode = Mode::FormEdit;
            }
        }
        KeyCode::Char('d') => delete_selected(state, ctx),
        KeyCode::Char('c') => {
            if let Some(next) = catalog::next_category(&state.categories, &state.active_category) {
                state.active_category = next;
                state.selected = 0;
                state.refresh_visible();
            }
        }
        KeyCode::Char('b') => {
            state.run_in_background = !state.run_in_background;
            let label = if state.run_in_background { "on" } else { "off" };
            state.info(format!("Background mode {label}"));
        }
        KeyCode::Char('f') => {
            state.filter_input = state.filter.clone();
            state.mode = Mode::FilterInput;
        }
        KeyCode::Char('h') => {
            state.help_return = Mode::Normal;
            state.mode = Mode::Help;
        }
        _ => {}
    }
}

fn delete_selected(state: &mut AppState, ctx: &UpdateContext<'_>) {
    let Some(id) = state.selected_command().map(|command| command.id.clone()) else {
        return;
    };
    let Some(removed) = catalog::remove(&mut state.commands, &id) else {
        return;
    };
    debug!(id = %removed.id, name = %removed.name, "deleted catalog entry");

    state.refresh_categories();
    state.refresh_visible();
    if persist(state, ctx) {
        state.info(format!("Deleted '{}'", removed.name));
    }
}

fn filter_key(state: &mut AppState, key: KeyEvent) {
    if is_ctrl_u(&key) {
        state.filter_input.clear();
        apply_filter(state);
        return;
    }

    match key.code {
        KeyCode::Esc => state.mode = Mode::Normal,
        KeyCode::Enter => {
            apply_filter(state);
            state.filter_input.clear();
            state.mode = Mode::Normal;
        }
        KeyCode::Backspace => {
            state.filter_input.pop();
            apply_filter(state);
        }
        _ => {
            if let Some(ch) = typed_char(&key) {
                state.filter_input.push(ch);
                apply_filter(state);
            }
        }
    }
}

fn apply_filter(state: &mut AppState) {
    state.filter = state.filter_input.clone();
    state.selected = 0;
    state.refresh_visible();
}

fn executing_key(state: &mut AppState, key: KeyEvent) {
    let viewport = state.viewport();
    match key.code {
        KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => state.leave_execution(),
        KeyCode::Up | KeyCode::Char('k') => state.scroll.line_up(viewport),
        KeyCode::Down | KeyCode::Char('j') => state.scroll.line_down(viewport),
        KeyCode::PageUp => state.scroll.page_up(viewport),
        KeyCode::PageDown => state.scroll.page_down(viewport),
        KeyCode::Home => state.scroll.top(),
        KeyCode::End => state.scroll.bottom(viewport),
        KeyCode::Char('h') => {
            state.help_return = Mode::Executing;
            state.mode = Mode::Help;
        }
        _ => {}
    }
}

fn help_key(state: &mut AppState, key: KeyEvent, effects: &mut Vec<Effect>) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('h') => state.mode = state.help_return,
        KeyCode::Char('q') => effects.push(Effect::Quit),
        _ => {}
    }
}
