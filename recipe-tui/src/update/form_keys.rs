use chrono::Local;
use ratatui::crossterm::event::{KeyCode, KeyEvent};
use recipe_config::{DEFAULT_CATEGORY, catalog};
use tracing::info;

use crate::effect::Effect;
use crate::form::{FormField, FormState};
use crate::state::{AppState, Mode};

use super::keys::{is_ctrl_u, typed_char};
use super::{UpdateContext, persist};

pub(crate) const REQUIRED_FIELDS_MESSAGE: &str = "Name and Command are required fields";

pub(super) fn form_key(
    state: &mut AppState,
    key: KeyEvent,
    ctx: &UpdateContext<'_>,
    effects: &mut Vec<Effect>,
) {
    let Some(form) = state.form.as_mut() else {
        state.mode = Mode::Normal;
        return;
    };

    if form.is_editing() {
        field_key(form, key);
        return;
    }

    match key.code {
        KeyCode::Esc => {
            state.form = None;
            state.mode = Mode::Normal;
        }
        KeyCode::Enter => form.start_editing(),
        KeyCode::Char('y') => save_form(state, ctx),
        KeyCode::Char('q') => effects.push(Effect::Quit),
        KeyCode::Up | KeyCode::Char('k') => form.move_up(),
        KeyCode::Down | KeyCode::Char('j') => form.move_down(),
        KeyCode::Tab => form.next_wrapping(),
        KeyCode::BackTab => form.previous_wrapping(),
        _ => {}
    }
}

fn field_key(form: &mut FormState, key: KeyEvent) {
    if is_ctrl_u(&key) {
        form.clear_input();
        return;
    }

    match key.code {
        KeyCode::Esc => form.cancel_editing(),
        KeyCode::Enter => {
            if form.commit() && form.active + 1 < FormField::ALL.len() {
                form.move_down();
            }
        }
        KeyCode::Tab => {
            if form.commit() {
                form.next_wrapping();
            }
        }
        KeyCode::BackTab => {
            if form.commit() {
                form.previous_wrapping();
            }
        }
        KeyCode::Backspace => form.backspace(),
        _ => {
            if let Some(ch) = typed_char(&key) {
                form.push_char(ch);
            }
        }
    }
}

fn save_form(state: &mut AppState, ctx: &UpdateContext<'_>) {
    let Some(form) = state.form.as_mut() else {
        return;
    };

    let mut record = form.draft.clone();
    if record.name.trim().is_empty() || record.command.trim().is_empty() {
        form.error = Some(REQUIRED_FIELDS_MESSAGE.to_string());
        return;
    }

    if record.is_new() {
        record.id = catalog::generate_id(&state.commands, Local::now());
        if record.category.trim().is_empty() {
            record.category = DEFAULT_CATEGORY.to_string();
        }
        if record.tags.is_empty() {
            record.tags = vec![record.category.to_lowercase()];
        }
    }
    // A retry after a failed save must replace this record, not append again.
    form.draft = record.clone();
    form.error = None;

    let name = record.name.clone();
    let replaced = catalog::upsert(&mut state.commands, record);
    info!(%name, replaced, "saved catalog entry");
    state.refresh_categories();
    state.refresh_visible();

    if persist(state, ctx) {
        state.form = None;
        state.mode = Mode::Normal;
        state.info(format!("Saved '{name}'"));
    } else if let Some(form) = state.form.as_mut() {
        form.error = state.notice.as_ref().map(|notice| notice.text.clone());
    }
}
