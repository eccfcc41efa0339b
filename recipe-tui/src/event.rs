use ratatui::crossterm::event::{Event as CrosstermEvent, KeyEvent, KeyEventKind};
use recipe_runner::ExecutionResult;

/// Inputs of the state machine.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize { width: u16, height: u16 },
    /// Timer for the streaming run `run_id`.
    PollTick { run_id: u64 },
    /// A streaming or PTY run finished.
    RunFinished {
        run_id: u64,
        result: ExecutionResult,
    },
    /// The child that owned the terminal exited.
    AttachedFinished { result: ExecutionResult },
}

impl AppEvent {
    /// Key presses and resizes; releases, repeats, mouse and focus events are
    /// not used.
    pub fn from_terminal(event: CrosstermEvent) -> Option<Self> {
        match event {
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Some(Self::Key(key)),
            CrosstermEvent::Resize(width, height) => Some(Self::Resize { width, height }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::{KeyCode, KeyEventState, KeyModifiers};

    #[test]
    fn only_presses_and_resizes_are_forwarded() {
        let press = KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE);
        assert!(matches!(
            AppEvent::from_terminal(CrosstermEvent::Key(press)),
            Some(AppEvent::Key(_))
        ));

        let release = KeyEvent {
            code: KeyCode::Char('j'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert!(AppEvent::from_terminal(CrosstermEvent::Key(release)).is_none());
        assert!(AppEvent::from_terminal(CrosstermEvent::FocusGained).is_none());
        assert!(matches!(
            AppEvent::from_terminal(CrosstermEvent::Resize(100, 30)),
            Some(AppEvent::Resize {
                width: 100,
                height: 30
            })
        ));
    }
}
