use recipe_config::Command;

/// Overrides the operating system used for strategy selection.
pub const RECIPE_OS_OVERRIDE_ENV: &str = "RECIPE_OS_OVERRIDE";

/// How a catalog entry is run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStrategy {
    /// Wait for exit, then report stdout and stderr together.
    Synchronous,
    /// Proxy both pipes into a sink while the child runs.
    Streaming,
    /// Fire and forget, output goes to a log file.
    Detached,
    /// Hand the terminal to the child.
    AttachedPlain,
    /// Run on a pseudo-terminal and tail it into a sink.
    AttachedPty,
}

impl ExecutionStrategy {
    /// Background mode wins, then interactive entries attach (directly on
    /// Unix, through a PTY elsewhere), then everything else streams.
    pub fn select(command: &Command, run_in_background: bool, platform: &Platform) -> Self {
        if run_in_background {
            Self::Detached
        } else if command.interactive && platform.has_native_terminal() {
            Self::AttachedPlain
        } else if command.interactive {
            Self::AttachedPty
        } else {
            Self::Streaming
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Synchronous => "synchronous",
            Self::Streaming => "streaming",
            Self::Detached => "detached",
            Self::AttachedPlain => "attached",
            Self::AttachedPty => "pty",
        }
    }
}

/// Operating system identity as seen by strategy selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    os: String,
}

impl Platform {
    pub fn new(os: impl Into<String>) -> Self {
        Self {
            os: os.into().trim().to_lowercase(),
        }
    }

    /// `$RECIPE_OS_OVERRIDE` when set, otherwise the compile-time target.
    pub fn detect() -> Self {
        std::env::var(RECIPE_OS_OVERRIDE_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| Self::new(std::env::consts::OS), Self::new)
    }

    pub fn os(&self) -> &str {
        &self.os
    }

    pub fn has_native_terminal(&self) -> bool {
        matches!(
            self.os.as_str(),
            "linux"
                | "macos"
                | "darwin"
                | "freebsd"
                | "openbsd"
                | "netbsd"
                | "dragonfly"
                | "solaris"
                | "illumos"
                | "android"
                | "ios"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn background_mode_takes_precedence() {
        let interactive = Command::new("1", "top", "top").with_interactive(true);
        assert_eq!(
            ExecutionStrategy::select(&interactive, true, &Platform::new("linux")),
            ExecutionStrategy::Detached
        );
    }

    #[test]
    fn interactive_attaches_directly_on_unix_only() {
        let interactive = Command::new("1", "top", "top").with_interactive(true);
        assert_eq!(
            ExecutionStrategy::select(&interactive, false, &Platform::new("Darwin")),
            ExecutionStrategy::AttachedPlain
        );
        assert_eq!(
            ExecutionStrategy::select(&interactive, false, &Platform::new("windows")),
            ExecutionStrategy::AttachedPty
        );
    }

    #[test]
    fn plain_commands_stream() {
        let plain = Command::new("1", "ls", "ls");
        assert_eq!(
            ExecutionStrategy::select(&plain, false, &Platform::new("windows")),
            ExecutionStrategy::Streaming
        );
    }

    #[test]
    #[serial]
    fn os_override_is_honoured() {
        // SAFETY: serialized with the other environment-mutating tests.
        unsafe { std::env::set_var(RECIPE_OS_OVERRIDE_ENV, "Windows") };
        let detected = Platform::detect();
        unsafe { std::env::remove_var(RECIPE_OS_OVERRIDE_ENV) };

        assert_eq!(detected.os(), "windows");
        assert!(!detected.has_native_terminal());
        assert_eq!(Platform::detect().os(), std::env::consts::OS);
    }
}
