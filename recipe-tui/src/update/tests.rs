use chrono::Local;
use pretty_assertions::assert_eq;
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use recipe_config::{Command, MemoryCatalogStore};
use recipe_runner::{ExecutionResult, Platform, ProcessRunner};
use tempfile::TempDir;

use super::form_keys::REQUIRED_FIELDS_MESSAGE;
use super::{Transition, UpdateContext, update};
use crate::effect::Effect;
use crate::event::AppEvent;
use crate::state::{AppState, Mode, NoticeKind, StateOptions};

struct Harness {
    store: MemoryCatalogStore,
    runner: ProcessRunner,
    platform: Platform,
    logs: TempDir,
}

impl Harness {
    fn new(commands: Vec<Command>) -> (Self, AppState) {
        Self::on("linux", commands)
    }

    fn on(os: &str, commands: Vec<Command>) -> (Self, AppState) {
        let logs = tempfile::tempdir().unwrap();
        let harness = Self {
            store: MemoryCatalogStore::new(commands.clone()),
            runner: ProcessRunner::new(Some("sh"), logs.path().join("logs")),
            platform: Platform::new(os),
            logs,
        };
        (harness, AppState::new(commands, StateOptions::default()))
    }

    fn send(&self, state: AppState, event: AppEvent) -> Transition {
        let ctx = UpdateContext {
            store: &self.store,
            runner: &self.runner,
            platform: &self.platform,
        };
        update(state, event, &ctx)
    }

    fn press(&self, state: AppState, code: KeyCode) -> Transition {
        self.send(state, key(code))
    }

    fn type_text(&self, mut state: AppState, text: &str) -> AppState {
        for ch in text.chars() {
            state = self.press(state, KeyCode::Char(ch)).state;
        }
        state
    }
}

fn key(code: KeyCode) -> AppEvent {
    AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn ctrl(ch: char) -> AppEvent {
    AppEvent::Key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL))
}

fn catalog() -> Vec<Command> {
    vec![
        Command::new("1", "Disk", "df -h")
            .with_category("System")
            .with_tags(["disk"]),
        Command::new("2", "Links", "ip link").with_category("Network"),
        Command::new("3", "Top", "htop")
            .with_category("System")
            .with_interactive(true),
        Command::new("4", "Broken", "   ").with_category("System"),
    ]
}

fn finished(command: Command, exit_code: i32) -> ExecutionResult {
    let now = Local::now();
    ExecutionResult {
        command,
        output: String::new(),
        error: None,
        started_at: now,
        finished_at: now,
        exit_code,
    }
}

fn select(harness: &Harness, mut state: AppState, id: &str) -> AppState {
    state.selected = 0;
    while state.selected_command().map(|c| c.id.as_str()) != Some(id) {
        let before = state.selected;
        state = harness.press(state, KeyCode::Char('j')).state;
        assert_ne!(before, state.selected, "entry {id} is not visible");
    }
    state
}

#[test]
fn navigation_stays_within_the_list() {
    let (harness, state) = Harness::new(catalog());
    let state = harness.press(state, KeyCode::Char('k')).state;
    assert_eq!(state.selected, 0);

    let mut state = state;
    for _ in 0..10 {
        state = harness.press(state, KeyCode::Down).state;
    }
    assert_eq!(state.selected, 3);
}

#[test]
fn quit_keys() {
    let (harness, state) = Harness::new(catalog());
    assert!(harness.press(state, KeyCode::Char('q')).quits());

    let (harness, mut state) = Harness::new(catalog());
    state.mode = Mode::FormEdit;
    state.form = Some(crate::form::FormState::new_entry());
    assert!(harness.send(state, ctrl('c')).quits());
}

#[test]
fn typing_q_in_the_filter_does_not_quit() {
    let (harness, state) = Harness::new(catalog());
    let state = harness.press(state, KeyCode::Char('f')).state;
    let transition = harness.press(state, KeyCode::Char('q'));
    assert!(!transition.quits());
    assert_eq!(transition.state.filter, "q");
}

#[test]
fn filter_updates_live_and_enter_applies() {
    let (harness, state) = Harness::new(catalog());
    let state = harness.press(state, KeyCode::Char('f')).state;
    assert_eq!(state.mode, Mode::FilterInput);

    let state = harness.type_text(state, "LINK");
    assert_eq!(state.visible.len(), 1);
    assert_eq!(state.visible[0].id, "2");

    let state = harness.press(state, KeyCode::Backspace).state;
    assert_eq!(state.filter, "LIN");

    let state = harness.press(state, KeyCode::Enter).state;
    assert_eq!(state.mode, Mode::Normal);
    assert_eq!(state.filter, "LIN");
    assert!(state.filter_input.is_empty());

    let state = harness.press(state, KeyCode::Char('f')).state;
    assert_eq!(state.filter_input, "LIN");
    let state = harness.send(state, ctrl('u')).state;
    assert_eq!(state.visible.len(), 4);
    let state = harness.press(state, KeyCode::Esc).state;
    assert_eq!(state.mode, Mode::Normal);
}

#[test]
fn category_cycling_wraps_through_all() {
    let (harness, state) = Harness::new(catalog());
    let state = harness.press(state, KeyCode::Char('c')).state;
    assert_eq!(state.active_category, "Network");
    assert_eq!(state.visible.len(), 1);
    let state = harness.press(state, KeyCode::Char('c')).state;
    assert_eq!(state.active_category, "System");
    assert_eq!(state.visible.len(), 3);
    let state = harness.press(state, KeyCode::Char('c')).state;
    assert_eq!(state.active_category, "All");
}

#[test]
fn background_toggle_sets_a_notice() {
    let (harness, state) = Harness::new(catalog());
    let state = harness.press(state, KeyCode::Char('b')).state;
    assert!(state.run_in_background);
    assert_eq!(state.notice.unwrap().text, "Background mode on");
}

#[test]
fn delete_persists_the_catalog() {
    let (harness, state) = Harness::new(catalog());
    let state = select(&harness, state, "2");
    let state = harness.press(state, KeyCode::Char('d')).state;

    assert_eq!(state.commands.len(), 3);
    assert!(!state.categories.contains(&"Network".to_string()));
    assert_eq!(harness.store.save_count(), 1);
    assert!(harness.store.snapshot().iter().all(|c| c.id != "2"));
}

#[test]
fn saving_without_a_name_is_rejected() {
    let (harness, state) = Harness::new(catalog());
    let state = harness.press(state, KeyCode::Char('n')).state;
    assert_eq!(state.mode, Mode::FormEdit);

    let state = harness.press(state, KeyCode::Char('y')).state;
    assert_eq!(state.mode, Mode::FormEdit);
    assert_eq!(
        state.form.as_ref().and_then(|f| f.error.as_deref()),
        Some(REQUIRED_FIELDS_MESSAGE)
    );
    assert_eq!(state.commands.len(), 4);
    assert_eq!(harness.store.save_count(), 0);
}

fn fill_new_entry(harness: &Harness, state: AppState) -> AppState {
    let state = harness.press(state, KeyCode::Char('n')).state;
    // Name
    let state = harness.press(state, KeyCode::Enter).state;
    let state = harness.type_text(state, "Uptime");
    let state = harness.press(state, KeyCode::Enter).state;
    // Command, the cursor advanced after the commit
    let state = harness.press(state, KeyCode::Enter).state;
    let state = harness.type_text(state, "uptime");
    let state = harness.press(state, KeyCode::Enter).state;
    // Category cleared so the default applies
    let state = harness.press(state, KeyCode::Enter).state;
    let state = harness.send(state, ctrl('u')).state;
    harness.press(state, KeyCode::Enter).state
}

#[test]
fn saving_a_new_entry_appends_it_once() {
    let (harness, state) = Harness::new(catalog());
    let state = fill_new_entry(&harness, state);
    let state = harness.press(state, KeyCode::Char('y')).state;

    assert_eq!(state.mode, Mode::Normal);
    assert!(state.form.is_none());
    assert_eq!(state.commands.len(), 5);

    let added = state.commands.last().unwrap();
    assert_eq!(added.name, "Uptime");
    assert_eq!(added.command, "uptime");
    assert_eq!(added.category, "System");
    assert_eq!(added.tags, vec!["system"]);
    assert!(!added.id.is_empty());
    assert!(catalog().iter().all(|c| c.id != added.id));

    assert_eq!(harness.store.save_count(), 1);
    assert_eq!(harness.store.snapshot().len(), 5);
}

#[test]
fn failed_save_keeps_the_form_and_retry_does_not_duplicate() {
    let (harness, state) = Harness::new(catalog());
    harness.store.set_fail_saves(true);
    let state = fill_new_entry(&harness, state);
    let state = harness.press(state, KeyCode::Char('y')).state;

    assert_eq!(state.mode, Mode::FormEdit);
    assert_eq!(state.commands.len(), 5);
    let form = state.form.as_ref().unwrap();
    assert!(form.error.as_deref().unwrap().contains("Failed to save"));
    assert!(!form.is_new());

    harness.store.set_fail_saves(false);
    let state = harness.press(state, KeyCode::Char('y')).state;
    assert_eq!(state.mode, Mode::Normal);
    assert_eq!(state.commands.len(), 5);
    assert_eq!(harness.store.snapshot().len(), 5);
}

#[test]
fn editing_replaces_the_record() {
    let (harness, state) = Harness::new(catalog());
    let state = harness.press(state, KeyCode::Char('e')).state;
    let state = harness.press(state, KeyCode::Enter).state;
    let state = harness.send(state, ctrl('u')).state;
    let state = harness.type_text(state, "Disk usage");
    let state = harness.press(state, KeyCode::Tab).state;
    let state = harness.press(state, KeyCode::Char('y')).state;

    assert_eq!(state.commands.len(), 4);
    assert_eq!(state.commands[0].id, "1");
    assert_eq!(state.commands[0].name, "Disk usage");
}

#[test]
fn field_editing_escape_discards_the_buffer() {
    let (harness, state) = Harness::new(catalog());
    let state = harness.press(state, KeyCode::Char('e')).state;
    let state = harness.press(state, KeyCode::Enter).state;
    let state = harness.type_text(state, "zzz");
    let state = harness.press(state, KeyCode::Esc).state;
    let form = state.form.as_ref().unwrap();
    assert!(!form.is_editing());
    assert_eq!(form.draft.name, "Disk");

    let state = harness.press(state, KeyCode::Esc).state;
    assert_eq!(state.mode, Mode::Normal);
    assert!(state.form.is_none());
}

#[test]
fn executing_a_plain_entry_starts_a_streaming_session() {
    let (harness, state) = Harness::new(catalog());
    let transition = harness.press(state, KeyCode::Enter);
    let state = transition.state;

    assert_eq!(state.mode, Mode::Executing);
    let session = state.session.as_ref().unwrap();
    let run_id = session.run_id;
    assert!(session.sink_path().exists());

    match transition.effects.as_slice() {
        [
            Effect::StartStreaming {
                run_id: started,
                sink,
                ..
            },
            Effect::ScheduleTick { run_id: ticked, .. },
        ] => {
            assert_eq!(*started, run_id);
            assert_eq!(*ticked, run_id);
            assert_eq!(sink.as_path(), session.sink_path());
        }
        other => panic!("unexpected effects: {other:?}"),
    }
}

#[test]
fn interactive_entries_attach_on_unix_and_use_a_pty_elsewhere() {
    let (harness, state) = Harness::new(catalog());
    let state = select(&harness, state, "3");
    let transition = harness.press(state, KeyCode::Enter);
    assert!(matches!(
        transition.effects.as_slice(),
        [Effect::RunAttached { .. }]
    ));
    assert_eq!(transition.state.mode, Mode::Normal);

    let (harness, state) = Harness::on("windows", catalog());
    let state = select(&harness, state, "3");
    let transition = harness.press(state, KeyCode::Enter);
    assert!(matches!(
        transition.effects.as_slice(),
        [Effect::StartPty { .. }, Effect::ScheduleTick { .. }]
    ));
    assert_eq!(transition.state.mode, Mode::Executing);
}

#[test]
fn empty_command_fails_without_a_session_or_log() {
    for background in [false, true] {
        let (harness, mut state) = Harness::new(catalog());
        state.run_in_background = background;
        let state = select(&harness, state, "4");
        let transition = harness.press(state, KeyCode::Enter);

        assert!(transition.effects.is_empty());
        let state = transition.state;
        assert_eq!(state.mode, Mode::Executing);
        assert!(state.session.is_none());
        assert!(state.output.contains("Exit Code: -1"));
        assert!(state.output.contains("empty command"));
        assert!(!harness.logs.path().join("logs").exists());
    }
}

#[test]
fn background_runs_report_the_log_path() {
    let (harness, mut state) = Harness::new(catalog());
    state.run_in_background = true;
    let transition = harness.press(state, KeyCode::Enter);

    let [Effect::SpawnDetached(run)] = transition.effects.as_slice() else {
        panic!("unexpected effects: {:?}", transition.effects);
    };
    assert!(run.log_path.exists());
    let notice = transition.state.notice.as_ref().unwrap();
    assert_eq!(notice.kind, NoticeKind::Info);
    assert!(notice.text.starts_with("Background task started. Log: "));
    assert!(notice.text.contains(&run.log_path.display().to_string()));
    assert_eq!(transition.state.mode, Mode::Normal);
}

#[test]
fn poll_ticks_read_the_sink_and_reschedule() {
    let (harness, state) = Harness::new(catalog());
    let state = harness.press(state, KeyCode::Enter).state;
    let session = state.session.as_ref().unwrap();
    let run_id = session.run_id;
    std::fs::write(session.sink_path(), "hello\nworld\n").unwrap();

    let transition = harness.send(state, AppEvent::PollTick { run_id });
    assert_eq!(transition.state.display_output(), "hello\nworld\n");
    assert!(matches!(
        transition.effects.as_slice(),
        [Effect::ScheduleTick { run_id: next, .. }] if *next == run_id
    ));

    let stale = harness.send(transition.state, AppEvent::PollTick { run_id: run_id + 100 });
    assert!(stale.effects.is_empty());
}

#[test]
fn finishing_the_active_run_shows_the_report_and_stamps_last_run() {
    let (harness, state) = Harness::new(catalog());
    let state = harness.press(state, KeyCode::Enter).state;
    let session = state.session.as_ref().unwrap();
    let run_id = session.run_id;
    let sink = session.sink_path().to_path_buf();
    std::fs::write(&sink, "all done\n").unwrap();
    let command = session.command.clone();

    let state = harness
        .send(
            state,
            AppEvent::RunFinished {
                run_id,
                result: finished(command, 0),
            },
        )
        .state;

    assert!(state.session.is_none());
    assert!(!sink.exists());
    assert!(state.output.contains("Exit Code: 0"));
    assert!(state.output.contains("--- Output ---\nall done\n"));
    assert!(state.commands[0].last_run.is_some());
    assert_eq!(harness.store.save_count(), 1);

    let state = harness.press(state, KeyCode::Esc).state;
    assert_eq!(state.mode, Mode::Normal);
    assert!(state.output.is_empty());
}

#[test]
fn failed_runs_leave_last_run_alone() {
    let (harness, state) = Harness::new(catalog());
    let state = harness.press(state, KeyCode::Enter).state;
    let run_id = state.session.as_ref().unwrap().run_id;
    let command = state.commands[0].clone();

    let state = harness
        .send(
            state,
            AppEvent::RunFinished {
                run_id,
                result: finished(command, 3),
            },
        )
        .state;
    assert!(state.output.contains("Exit Code: 3"));
    assert!(state.commands[0].last_run.is_none());
    assert_eq!(harness.store.save_count(), 0);
}

#[test]
fn leaving_the_view_drops_the_session_but_still_records_the_run() {
    let (harness, state) = Harness::new(catalog());
    let state = harness.press(state, KeyCode::Enter).state;
    let session = state.session.as_ref().unwrap();
    let run_id = session.run_id;
    let sink = session.sink_path().to_path_buf();
    let command = session.command.clone();

    let state = harness.press(state, KeyCode::Char('q')).state;
    assert_eq!(state.mode, Mode::Normal);
    assert!(state.session.is_none());
    assert!(!sink.exists());

    let transition = harness.send(state, AppEvent::PollTick { run_id });
    assert!(transition.effects.is_empty());

    let state = harness
        .send(
            transition.state,
            AppEvent::RunFinished {
                run_id,
                result: finished(command, 0),
            },
        )
        .state;
    assert_eq!(state.mode, Mode::Normal);
    assert!(state.output.is_empty());
    assert!(state.commands[0].last_run.is_some());
    assert_eq!(harness.store.save_count(), 1);
}

#[test]
fn attached_runs_return_to_the_list_with_a_notice() {
    let (harness, state) = Harness::new(catalog());
    let command = state.commands[2].clone();
    let state = harness
        .send(
            state,
            AppEvent::AttachedFinished {
                result: finished(command, 0),
            },
        )
        .state;
    assert_eq!(state.mode, Mode::Normal);
    assert_eq!(state.notice.unwrap().text, "'Top' finished");
    assert!(state.commands[2].last_run.is_some());
}

#[test]
fn help_returns_to_the_previous_mode() {
    let (harness, state) = Harness::new(catalog());
    let state = select(&harness, state, "4");
    let state = harness.press(state, KeyCode::Enter).state;
    assert_eq!(state.mode, Mode::Executing);

    let state = harness.press(state, KeyCode::Char('h')).state;
    assert_eq!(state.mode, Mode::Help);
    let state = harness.press(state, KeyCode::Esc).state;
    assert_eq!(state.mode, Mode::Executing);
}

#[test]
fn scrolling_is_clamped_to_the_output() {
    let (harness, mut state) = Harness::new(catalog());
    state.height = 20;
    state.mode = Mode::Executing;
    state.output = (0..30).map(|n| n.to_string()).collect::<Vec<_>>().join("\n");

    let state = harness.press(state, KeyCode::End).state;
    assert_eq!(state.scroll.position(), 20);
    let state = harness.press(state, KeyCode::Down).state;
    assert_eq!(state.scroll.position(), 20);
    let state = harness.press(state, KeyCode::PageUp).state;
    assert_eq!(state.scroll.position(), 12);

    let state = harness
        .send(
            state,
            AppEvent::Resize {
                width: 80,
                height: 60,
            },
        )
        .state;
    assert_eq!(state.scroll.position(), 0);
}
