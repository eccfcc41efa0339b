use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Category given to new entries that leave the field blank.
pub const DEFAULT_CATEGORY: &str = "System";

/// A catalog entry: one stored shell command plus the metadata used to
/// browse and run it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Command {
    /// Stable identifier, unique across the catalog. Empty for drafts that
    /// were never saved.
    pub id: String,
    pub name: String,
    /// The literal command text.
    pub command: String,
    pub category: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Set only by a run that exited cleanly.
    pub last_run: Option<DateTime<Local>>,
    /// Run through `$SHELL -lc` instead of splitting into argv tokens.
    pub use_shell: bool,
    /// Attach to the terminal instead of capturing output.
    pub interactive: bool,
    /// `""`, `current`, `home` or `absolute`. Kept as text so an unknown value
    /// is reported when the entry runs rather than when the catalog loads.
    pub working_dir_mode: String,
    /// Used only when `working_dir_mode` is `absolute`; may contain `~`,
    /// environment references and `${cwd}`.
    pub working_dir_path: String,
}

impl Command {
    pub fn new(id: impl Into<String>, name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            command: command.into(),
            ..Self::default()
        }
    }

    /// Blank record used by the "new command" form.
    pub fn draft() -> Self {
        Self {
            category: DEFAULT_CATEGORY.to_string(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_shell(mut self, use_shell: bool) -> Self {
        self.use_shell = use_shell;
        self
    }

    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn with_working_dir(mut self, mode: impl Into<String>, path: impl Into<String>) -> Self {
        self.working_dir_mode = mode.into();
        self.working_dir_path = path.into();
        self
    }

    pub fn with_last_run(mut self, at: DateTime<Local>) -> Self {
        self.last_run = Some(at);
        self
    }

    pub fn is_new(&self) -> bool {
        self.id.is_empty()
    }

    /// Whether the command text goes to a login shell as a whole.
    pub fn runs_in_shell(&self) -> bool {
        self.use_shell || self.interactive
    }

    pub fn tags_display(&self) -> String {
        self.tags.join(", ")
    }

    /// Replace the tag set from comma separated text, dropping blanks.
    pub fn set_tags_from_str(&mut self, value: &str) {
        self.tags = value
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(String::from)
            .collect();
    }

    /// Case-insensitive substring match over name, command text,
    /// description and tags. `needle` must already be lower case.
    pub fn matches_text(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        [&self.name, &self.command, &self.description]
            .into_iter()
            .chain(self.tags.iter())
            .any(|field| field.to_lowercase().contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip_through_display_text() {
        let mut command = Command::new("1", "Disk", "df -h");
        command.set_tags_from_str(" system, ,disk ,");
        assert_eq!(command.tags, vec!["system", "disk"]);
        assert_eq!(command.tags_display(), "system, disk");
    }

    #[test]
    fn matches_text_covers_tags_and_description() {
        let command = Command::new("1", "Disk Space", "df -h")
            .with_description("Shows disk usage")
            .with_tags(["storage"]);
        assert!(command.matches_text("usage"));
        assert!(command.matches_text("stor"));
        assert!(command.matches_text("df"));
        assert!(!command.matches_text("network"));
        assert!(command.matches_text(""));
    }

    #[test]
    fn older_records_without_execution_flags_still_parse() {
        let json = r#"{"id":"7","name":"CPU","command":"lscpu","category":"System"}"#;
        let command: Command = serde_json::from_str(json).unwrap();
        assert_eq!(command.id, "7");
        assert!(!command.use_shell);
        assert!(command.working_dir_mode.is_empty());
        assert!(command.last_run.is_none());
    }

    #[test]
    fn interactive_implies_shell_execution() {
        assert!(Command::new("1", "top", "top").with_interactive(true).runs_in_shell());
        assert!(!Command::new("1", "ls", "ls").runs_in_shell());
    }
}
