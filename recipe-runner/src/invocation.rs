use std::path::{Path, PathBuf};

use portable_pty::CommandBuilder;
use recipe_commons::ExecError;
use recipe_config::Command;

const FALLBACK_SHELL: &str = "bash";

/// Shell used for `use_shell`/`interactive` entries: the configured override,
/// then `$SHELL`, then `bash`.
pub fn resolve_shell(configured: Option<&str>) -> String {
    configured
        .map(str::trim)
        .filter(|shell| !shell.is_empty())
        .map(String::from)
        .or_else(|| {
            std::env::var("SHELL")
                .ok()
                .filter(|shell| !shell.trim().is_empty())
        })
        .unwrap_or_else(|| FALLBACK_SHELL.to_string())
}

/// Program and arguments for one catalog entry, plus the directory it runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl CommandLine {
    /// Shell entries become `<shell> -lc <text>`; everything else is split on
    /// whitespace with no quoting rules.
    pub fn build(command: &Command, shell: &str) -> Result<Self, ExecError> {
        let text = command.command.trim();
        if text.is_empty() {
            return Err(ExecError::EmptyCommand);
        }

        if command.runs_in_shell() {
            return Ok(Self {
                program: shell.to_string(),
                args: vec!["-lc".to_string(), command.command.clone()],
                working_dir: None,
            });
        }

        let mut parts = text.split_whitespace().map(String::from);
        let program = parts.next().ok_or(ExecError::EmptyCommand)?;
        Ok(Self {
            program,
            args: parts.collect(),
            working_dir: None,
        })
    }

    pub fn in_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn to_tokio(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    pub fn to_std(&self) -> std::process::Command {
        let mut cmd = std::process::Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// PTY children need an explicit directory; inherit ours when unset.
    pub fn to_pty_builder(&self) -> Result<CommandBuilder, ExecError> {
        let mut builder = CommandBuilder::new(&self.program);
        for arg in &self.args {
            builder.arg(arg);
        }
        let dir = match &self.working_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()
                .map_err(|source| ExecError::io("resolving the current directory", source))?,
        };
        builder.cwd(dir);
        Ok(builder)
    }

    pub fn start_error(&self, source: std::io::Error) -> ExecError {
        ExecError::ProcessStart {
            program: self.program.clone(),
            source,
        }
    }
}
