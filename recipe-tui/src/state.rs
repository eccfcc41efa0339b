use std::time::Duration;

use recipe_config::catalog::{self, ALL_CATEGORY};
use recipe_config::{Command, RecipeConfig};

use crate::form::FormState;
use crate::scroll::{ScrollState, Viewport};
use crate::session::ExecutionSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    FilterInput,
    FormEdit,
    Executing,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// One-line status message under the main view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

/// Knobs taken from `recipe.toml` and the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateOptions {
    pub run_in_background: bool,
    pub chrome_rows: u16,
    pub poll_interval: Duration,
}

impl StateOptions {
    pub fn from_config(config: &RecipeConfig) -> Self {
        Self {
            run_in_background: config.execution.run_in_background,
            chrome_rows: config.ui.chrome_rows,
            poll_interval: Duration::from_millis(config.execution.poll_interval_ms.max(1)),
        }
    }
}

impl Default for StateOptions {
    fn default() -> Self {
        Self::from_config(&RecipeConfig::default())
    }
}

/// Everything the interface shows. Owned by a single task and replaced by
/// [`crate::update::update`] on every event.
#[derive(Debug)]
pub struct AppState {
    pub commands: Vec<Command>,
    pub visible: Vec<Command>,
    pub categories: Vec<String>,
    pub active_category: String,
    pub filter: String,
    /// Text typed since filter input started.
    pub filter_input: String,
    pub selected: usize,
    pub mode: Mode,
    /// Mode restored when the help screen closes.
    pub help_return: Mode,
    pub form: Option<FormState>,
    pub session: Option<ExecutionSession>,
    /// Entry shown in the execution view, running or finished.
    pub executing: Option<Command>,
    /// Final report once the run in the execution view is over.
    pub output: String,
    pub scroll: ScrollState,
    pub run_in_background: bool,
    pub notice: Option<Notice>,
    pub width: u16,
    pub height: u16,
    pub chrome_rows: u16,
    pub poll_interval: Duration,
    next_run_id: u64,
}

impl AppState {
    pub fn new(commands: Vec<Command>, options: StateOptions) -> Self {
        let mut state = Self {
            categories: catalog::categories(&commands),
            commands,
            visible: Vec::new(),
            active_category: ALL_CATEGORY.to_string(),
            filter: String::new(),
            filter_input: String::new(),
            selected: 0,
            mode: Mode::Normal,
            help_return: Mode::Normal,
            form: None,
            session: None,
            executing: None,
            output: String::new(),
            scroll: ScrollState::default(),
            run_in_background: options.run_in_background,
            notice: None,
            width: 80,
            height: 24,
            chrome_rows: options.chrome_rows,
            poll_interval: options.poll_interval,
            next_run_id: 1,
        };
        state.refresh_visible();
        state
    }

    pub fn with_size(mut self, width: u16, height: u16) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn selected_command(&self) -> Option<&Command> {
        self.visible.get(self.selected)
    }

    /// Re-run the category and text filters and keep the selection in range.
    pub fn refresh_visible(&mut self) {
        self.visible = catalog::filter(&self.commands, &self.active_category, &self.filter);
        self.selected = self.selected.min(self.visible.len().saturating_sub(1));
    }

    /// Recompute the category list after the catalog changed. A category
    /// that no longer exists falls back to `All`.
    pub fn refresh_categories(&mut self) {
        self.categories = catalog::categories(&self.commands);
        if !self.categories.contains(&self.active_category) {
            self.active_category = ALL_CATEGORY.to_string();
        }
    }

    /// Text of the execution view: live output while a session runs, the
    /// report afterwards.
    pub fn display_output(&self) -> &str {
        match &self.session {
            Some(session) => &session.output,
            None => &self.output,
        }
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.display_output(), self.height, self.chrome_rows)
    }

    pub fn allocate_run_id(&mut self) -> u64 {
        let id = self.next_run_id;
        self.next_run_id += 1;
        id
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            kind: NoticeKind::Info,
            text: text.into(),
        });
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            kind: NoticeKind::Error,
            text: text.into(),
        });
    }

    /// Drop whatever the execution view was showing.
    pub fn leave_execution(&mut self) {
        self.mode = Mode::Normal;
        self.session = None;
        self.executing = None;
        self.output.clear();
        self.scroll.reset();
    }
}
