//! Output pane scrolling.

/// Fewest output lines shown however small the terminal is.
pub const MIN_VISIBLE_LINES: usize = 5;

/// Vertical position in the execution output, always within
/// `[0, max(0, total - visible)]` after every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollState {
    position: usize,
}

/// Line counts the scroll bounds are derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub total: usize,
    pub visible: usize,
}

impl Viewport {
    /// `visible = max(height - chrome_rows, 5)`; lines are `\n`-separated.
    pub fn new(output: &str, height: u16, chrome_rows: u16) -> Self {
        Self {
            total: line_count(output),
            visible: visible_lines(height, chrome_rows),
        }
    }

    pub fn max_position(self) -> usize {
        self.total.saturating_sub(self.visible)
    }

    /// Lines moved by PgUp/PgDn.
    pub fn page(self) -> usize {
        self.visible.saturating_sub(2).max(1)
    }
}

pub fn visible_lines(height: u16, chrome_rows: u16) -> usize {
    usize::from(height.saturating_sub(chrome_rows)).max(MIN_VISIBLE_LINES)
}

/// Number of `\n`-separated lines, counting a trailing empty one.
pub fn line_count(output: &str) -> usize {
    output.split('\n').count()
}

impl ScrollState {
    pub fn position(self) -> usize {
        self.position
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }

    pub fn line_up(&mut self, viewport: Viewport) {
        self.position = self.position.saturating_sub(1).min(viewport.max_position());
    }

    pub fn line_down(&mut self, viewport: Viewport) {
        self.position = (self.position + 1).min(viewport.max_position());
    }

    pub fn page_up(&mut self, viewport: Viewport) {
        self.position = self
            .position
            .saturating_sub(viewport.page())
            .min(viewport.max_position());
    }

    pub fn page_down(&mut self, viewport: Viewport) {
        self.position = (self.position + viewport.page()).min(viewport.max_position());
    }

    pub fn top(&mut self) {
        self.position = 0;
    }

    pub fn bottom(&mut self, viewport: Viewport) {
        self.position = viewport.max_position();
    }

    /// Re-apply the bounds after the output or the terminal changed.
    pub fn clamp(&mut self, viewport: Viewport) {
        self.position = self.position.min(viewport.max_position());
    }
}
