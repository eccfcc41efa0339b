//! Per-command working directory policy.

use std::path::PathBuf;

use recipe_commons::{PathContext, PathError};
use recipe_config::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkingDirMode {
    /// Inherit the launcher's directory (`""` or `current`).
    Current,
    Home,
    Absolute,
}

impl WorkingDirMode {
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let mode = raw.trim().to_lowercase();
        match mode.as_str() {
            "" | "current" => Ok(Self::Current),
            "home" => Ok(Self::Home),
            "absolute" => Ok(Self::Absolute),
            _ => Err(PathError::UnknownMode(mode)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Home => "home",
            Self::Absolute => "absolute",
        }
    }
}

/// Turns a command's working-directory fields into the directory its process
/// starts in. `Ok(None)` means "inherit".
#[derive(Debug, Clone, Default)]
pub struct WorkingDirResolver {
    context: PathContext,
}

impl WorkingDirResolver {
    pub fn new(context: PathContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &PathContext {
        &self.context
    }

    pub fn resolve(&self, command: &Command) -> Result<Option<PathBuf>, PathError> {
        match WorkingDirMode::parse(&command.working_dir_mode)? {
            WorkingDirMode::Current => Ok(None),
            WorkingDirMode::Home => self.context.home_dir().map(Some),
            WorkingDirMode::Absolute => self.resolve_absolute(&command.working_dir_path).map(Some),
        }
    }

    fn resolve_absolute(&self, raw: &str) -> Result<PathBuf, PathError> {
        if raw.trim().is_empty() {
            return Err(PathError::MissingPath);
        }

        let expanded = self.context.expand(raw)?;
        if !expanded.is_absolute() {
            return Err(PathError::NotAbsolute(expanded));
        }
        if !expanded.is_dir() {
            return Err(PathError::NotADirectory(expanded));
        }
        Ok(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_dir(mode: &str, path: &str) -> Command {
        Command::new("1", "probe", "pwd").with_working_dir(mode, path)
    }

    #[test]
    fn blank_and_current_inherit() {
        let resolver = WorkingDirResolver::default();
        assert_eq!(resolver.resolve(&with_dir("", "")).unwrap(), None);
        assert_eq!(resolver.resolve(&with_dir(" Current ", "/ignored")).unwrap(), None);
    }

    #[test]
    fn home_uses_pinned_home() {
        let resolver = WorkingDirResolver::new(PathContext::new().with_home("/home/tester"));
        assert_eq!(
            resolver.resolve(&with_dir("HOME", "")).unwrap(),
            Some(PathBuf::from("/home/tester"))
        );
    }

    #[test]
    fn absolute_requires_a_path() {
        let error = WorkingDirResolver::default()
            .resolve(&with_dir("absolute", "  "))
            .unwrap_err();
        assert!(matches!(error, PathError::MissingPath));
    }

    #[test]
    fn absolute_rejects_relative_results() {
        let error = WorkingDirResolver::default()
            .resolve(&with_dir("absolute", "relative/dir"))
            .unwrap_err();
        assert!(matches!(error, PathError::NotAbsolute(_)));
    }

    #[test]
    fn absolute_rejects_files() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let error = WorkingDirResolver::default()
            .resolve(&with_dir("absolute", &file.path().to_string_lossy()))
            .unwrap_err();
        assert!(matches!(error, PathError::NotADirectory(_)));
    }

    #[test]
    fn absolute_expands_cwd_placeholder() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir(root.path().join("sub")).unwrap();
        let resolver = WorkingDirResolver::new(PathContext::new().with_cwd(root.path()));

        let resolved = resolver.resolve(&with_dir("absolute", "${cwd}/sub")).unwrap();
        assert_eq!(resolved, Some(root.path().join("sub")));
    }

    #[test]
    fn unknown_mode_is_reported_lowercased() {
        let error = WorkingDirResolver::default()
            .resolve(&with_dir("Project", ""))
            .unwrap_err();
        assert_eq!(error.to_string(), "unknown working directory mode: project");
    }
}
