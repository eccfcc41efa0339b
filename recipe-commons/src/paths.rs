use std::env;
use std::path::{Component, Path, PathBuf};

use tracing::trace;

use crate::errors::PathError;

/// Token replaced by the caller's current directory during expansion.
pub const CWD_PLACEHOLDER: &str = "cwd";

/// Normalize a path by resolving `.` and `..` components lexically.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            Component::Prefix(prefix) => normalized.push(prefix.as_os_str()),
            Component::RootDir => normalized.push(component.as_os_str()),
            Component::Normal(part) => normalized.push(part),
        }
    }
    normalized
}

/// Where `~` and `${cwd}` point while expanding a path template.
///
/// Unpinned values are looked up from the process when a placeholder
/// actually needs them, so a template without `${cwd}` never touches the
/// current directory.
#[derive(Debug, Clone, Default)]
pub struct PathContext {
    cwd: Option<PathBuf>,
    home: Option<PathBuf>,
}

impl PathContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = Some(home.into());
        self
    }

    pub fn home_dir(&self) -> Result<PathBuf, PathError> {
        self.home
            .clone()
            .or_else(dirs::home_dir)
            .ok_or(PathError::HomeUnavailable)
    }

    pub fn current_dir(&self) -> Result<PathBuf, PathError> {
        match &self.cwd {
            Some(cwd) => Ok(cwd.clone()),
            None => env::current_dir().map_err(PathError::CurrentDir),
        }
    }

    /// Expand `$VAR`, `${VAR}`, `${cwd}`, `~` and `~/...` using the process
    /// environment.
    pub fn expand(&self, raw: &str) -> Result<PathBuf, PathError> {
        self.expand_with(raw, |name| env::var(name).ok())
    }

    /// Same as [`PathContext::expand`] with an explicit variable lookup.
    /// Unset variables expand to the empty string.
    pub fn expand_with<F>(&self, raw: &str, lookup: F) -> Result<PathBuf, PathError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let substituted = self.substitute_variables(raw, &lookup)?;
        let expanded = self.expand_tilde(&substituted)?;
        trace!(raw, expanded = %expanded.display(), "expanded path template");
        Ok(expanded)
    }

    fn substitute_variables<F>(&self, raw: &str, lookup: &F) -> Result<String, PathError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;

        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];

            if let Some(braced) = after.strip_prefix('{') {
                match braced.find('}') {
                    Some(end) => {
                        let name = &braced[..end];
                        out.push_str(&self.variable_value(name, lookup)?);
                        rest = &braced[end + 1..];
                    }
                    None => {
                        out.push('$');
                        rest = after;
                    }
                }
                continue;
            }

            let name_len = after
                .char_indices()
                .find(|(_, ch)| !(ch.is_ascii_alphanumeric() || *ch == '_'))
                .map_or(after.len(), |(idx, _)| idx);
            if name_len == 0 {
                out.push('$');
            } else {
                out.push_str(&lookup(&after[..name_len]).unwrap_or_default());
            }
            rest = &after[name_len..];
        }

        out.push_str(rest);
        Ok(out)
    }

    fn variable_value<F>(&self, name: &str, lookup: &F) -> Result<String, PathError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if name == CWD_PLACEHOLDER {
            return Ok(self.current_dir()?.to_string_lossy().into_owned());
        }
        Ok(lookup(name).unwrap_or_default())
    }

    fn expand_tilde(&self, path: &str) -> Result<PathBuf, PathError> {
        if path == "~" {
            return self.home_dir();
        }
        if let Some(rest) = path.strip_prefix("~/") {
            return Ok(normalize_path(&self.home_dir()?.join(rest)));
        }
        Ok(PathBuf::from(path))
    }
}
