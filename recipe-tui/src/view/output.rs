use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Clear, Paragraph, Widget};
use recipe_commons::display_line;

use crate::scroll::Viewport;
use crate::state::AppState;

use super::{ACCENT, error_style, footer_line, title_line, truncate_to_width};

const SCROLL_BAR_WIDTH: usize = 30;
const SCROLL_FOOTER: &str =
    "↑/↓: Scroll  |  PgUp/PgDn: Page Scroll  |  Home/End: Top/Bottom  |  Enter/Esc: Back";
const BACK_FOOTER: &str = "Enter/Esc: Back to list";

/// `███░░░ 12/340 lines (3%)`, or `None` when everything fits.
pub fn scroll_indicator(position: usize, viewport: Viewport) -> Option<String> {
    if viewport.total <= viewport.visible {
        return None;
    }
    let max = viewport.max_position();
    let position = position.min(max);
    let filled = if max == 0 {
        0
    } else {
        (SCROLL_BAR_WIDTH * position / max).min(SCROLL_BAR_WIDTH)
    };
    let percent = if max == 0 {
        0.0
    } else {
        position as f64 / max as f64 * 100.0
    };
    Some(format!(
        "{}{} {}/{} lines ({percent:.0}%)",
        "█".repeat(filled),
        "░".repeat(SCROLL_BAR_WIDTH - filled),
        position + 1,
        viewport.total,
    ))
}

/// Execution view: header, scroll position and the visible output window.
pub struct OutputWidget<'a> {
    state: &'a AppState,
}

impl<'a> OutputWidget<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    fn heading(&self) -> String {
        let name = self
            .state
            .executing
            .as_ref()
            .map_or("", |command| command.name.as_str());
        match &self.state.session {
            Some(session) if session.is_running() => {
                format!("Executing: {name}  [{}]", session.strategy.as_str())
            }
            _ => format!("Finished: {name}"),
        }
    }
}

impl Widget for OutputWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        if area.height == 0 || area.width == 0 {
            return;
        }

        let Some(command) = &self.state.executing else {
            Paragraph::new(Line::from(Span::styled(
                "No command is being executed",
                error_style(),
            )))
            .render(area, buf);
            return;
        };

        let viewport = self.state.viewport();
        let indicator = scroll_indicator(self.state.scroll.position(), viewport);
        let [title, _, command_area, indicator_area, body, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Length(if indicator.is_some() { 2 } else { 0 }),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(area);

        Paragraph::new(title_line(&self.heading(), area.width)).render(title, buf);
        Paragraph::new(Line::from(Span::styled(
            truncate_to_width(&format!("Command: {}", command.command), usize::from(area.width)),
            Style::default().fg(Color::White).bg(Color::Rgb(0x38, 0x38, 0x38)),
        )))
        .render(command_area, buf);

        if let Some(indicator) = indicator {
            Paragraph::new(Line::from(Span::styled(
                indicator,
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            )))
            .render(indicator_area, buf);
        }

        let start = self.state.scroll.position().min(viewport.max_position());
        let width = usize::from(body.width);
        let lines: Vec<Line<'static>> = self
            .state
            .display_output()
            .split('\n')
            .skip(start)
            .take(viewport.visible)
            .map(|line| Line::raw(truncate_to_width(&display_line(line), width)))
            .collect();
        Paragraph::new(lines)
            .style(Style::default().fg(Color::Green))
            .render(body, buf);

        let help = if viewport.total > viewport.visible {
            SCROLL_FOOTER
        } else {
            BACK_FOOTER
        };
        Paragraph::new(footer_line(help)).render(footer, buf);
    }
}
