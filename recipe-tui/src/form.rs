//! Add/edit form for catalog entries.

use recipe_config::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Command,
    Category,
    Description,
    Tags,
    UseShell,
    Interactive,
    WorkingDirMode,
    WorkingDirPath,
}

impl FormField {
    pub const ALL: [FormField; 9] = [
        FormField::Name,
        FormField::Command,
        FormField::Category,
        FormField::Description,
        FormField::Tags,
        FormField::UseShell,
        FormField::Interactive,
        FormField::WorkingDirMode,
        FormField::WorkingDirPath,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Command => "Command",
            Self::Category => "Category",
            Self::Description => "Description",
            Self::Tags => "Tags",
            Self::UseShell => "Use shell",
            Self::Interactive => "Interactive",
            Self::WorkingDirMode => "Working dir mode",
            Self::WorkingDirPath => "Working dir path",
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            Self::Name => "Display name for the command",
            Self::Command => "The shell command to execute",
            Self::Category => "Category for organization (e.g. System, Network)",
            Self::Description => "What the command does",
            Self::Tags => "Comma-separated tags for filtering",
            Self::UseShell => "yes/no, run through $SHELL -lc for pipes and quotes",
            Self::Interactive => "yes/no, hand the terminal to the command (htop, ssh)",
            Self::WorkingDirMode => "current | home | absolute",
            Self::WorkingDirPath => "Used with absolute; supports ~, $VAR and ${cwd}",
        }
    }

    pub fn value(self, command: &Command) -> String {
        match self {
            Self::Name => command.name.clone(),
            Self::Command => command.command.clone(),
            Self::Category => command.category.clone(),
            Self::Description => command.description.clone(),
            Self::Tags => command.tags_display(),
            Self::UseShell => bool_text(command.use_shell).to_string(),
            Self::Interactive => bool_text(command.interactive).to_string(),
            Self::WorkingDirMode => command.working_dir_mode.clone(),
            Self::WorkingDirPath => command.working_dir_path.clone(),
        }
    }

    /// Store `raw` into `command`. Only boolean fields can reject input.
    pub fn apply(self, command: &mut Command, raw: &str) -> Result<(), String> {
        match self {
            Self::Name => command.name = raw.trim().to_string(),
            Self::Command => command.command = raw.trim().to_string(),
            Self::Category => command.category = raw.trim().to_string(),
            Self::Description => command.description = raw.trim().to_string(),
            Self::Tags => command.set_tags_from_str(raw),
            Self::UseShell => command.use_shell = parse_bool(self, raw)?,
            Self::Interactive => command.interactive = parse_bool(self, raw)?,
            Self::WorkingDirMode => command.working_dir_mode = raw.trim().to_lowercase(),
            Self::WorkingDirPath => command.working_dir_path = raw.trim().to_string(),
        }
        Ok(())
    }
}

fn bool_text(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

/// `true/false/yes/no/y/n/1/0/on/off`, case-insensitive. Blank means `false`.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" => Some(true),
        "false" | "no" | "n" | "0" | "off" | "" => Some(false),
        _ => None,
    }
}

fn parse_bool(field: FormField, raw: &str) -> Result<bool, String> {
    parse_flag(raw).ok_or_else(|| format!("{} expects yes or no, got '{}'", field.label(), raw.trim()))
}

/// The form being shown, the record it edits and the field being typed into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub draft: Command,
    pub active: usize,
    /// Input buffer while a field is being edited.
    pub editing: Option<String>,
    pub error: Option<String>,
}

impl FormState {
    pub fn new_entry() -> Self {
        Self::edit(Command::draft())
    }

    pub fn edit(command: Command) -> Self {
        Self {
            draft: command,
            active: 0,
            editing: None,
            error: None,
        }
    }

    pub fn is_new(&self) -> bool {
        self.draft.is_new()
    }

    pub fn title(&self) -> &'static str {
        if self.is_new() { "Add New Command" } else { "Edit Command" }
    }

    pub fn active_field(&self) -> FormField {
        FormField::ALL[self.active.min(FormField::ALL.len() - 1)]
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn move_up(&mut self) {
        self.active = self.active.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        self.active = (self.active + 1).min(FormField::ALL.len() - 1);
    }

    pub fn next_wrapping(&mut self) {
        self.active = (self.active + 1) % FormField::ALL.len();
    }

    pub fn previous_wrapping(&mut self) {
        self.active = self
            .active
            .checked_sub(1)
            .unwrap_or(FormField::ALL.len() - 1);
    }

    pub fn start_editing(&mut self) {
        self.editing = Some(self.active_field().value(&self.draft));
    }

    pub fn cancel_editing(&mut self) {
        self.editing = None;
    }

    pub fn push_char(&mut self, ch: char) {
        if let Some(buffer) = self.editing.as_mut() {
            buffer.push(ch);
        }
    }

    pub fn backspace(&mut self) {
        if let Some(buffer) = self.editing.as_mut() {
            buffer.pop();
        }
    }

    pub fn clear_input(&mut self) {
        if let Some(buffer) = self.editing.as_mut() {
            buffer.clear();
        }
    }

    /// Write the buffer into the draft. On rejection the buffer stays open
    /// and the error is recorded.
    pub fn commit(&mut self) -> bool {
        let Some(buffer) = self.editing.take() else {
            return true;
        };
        match self.active_field().apply(&mut self.draft, &buffer) {
            Ok(()) => {
                self.error = None;
                true
            }
            Err(message) => {
                self.error = Some(message);
                self.editing = Some(buffer);
                false
            }
        }
    }
}
