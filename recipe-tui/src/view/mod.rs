//! ratatui rendering of [`AppState`].

mod catalog;
mod form;
mod help;
mod output;


use ratatui::Frame;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthChar;

use crate::state::{AppState, Mode, Notice, NoticeKind};

pub use catalog::CatalogWidget;
pub use form::FormWidget;
pub use help::HelpWidget;
pub use output::{OutputWidget, scroll_indicator};

const ACCENT: Color = Color::Rgb(0x7D, 0x56, 0xF4);
const COMMAND: Color = Color::Rgb(0x36, 0xA9, 0xE0);
const DESCRIPTION: Color = Color::Rgb(0x4C, 0xAF, 0x50);
const MUTED: Color = Color::Rgb(0x66, 0x66, 0x66);
const HINT: Color = Color::Rgb(0xBB, 0xBB, 0xBB);

fn title_style() -> Style {
    Style::default()
        .fg(Color::White)
        .bg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

fn selected_style() -> Style {
    Style::default()
        .fg(Color::White)
        .bg(ACCENT)
        .add_modifier(Modifier::BOLD)
}

fn label_style() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

fn hint_style() -> Style {
    Style::default().fg(HINT)
}

fn error_style() -> Style {
    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
}

/// Draw the screen for the current mode.
pub fn render(frame: &mut Frame<'_>, state: &AppState) {
    let area = frame.area();
    match state.mode {
        Mode::Executing => frame.render_widget(OutputWidget::new(state), area),
        Mode::Help => frame.render_widget(HelpWidget, area),
        Mode::FormEdit => match &state.form {
            Some(form) => frame.render_widget(FormWidget::new(form), area),
            None => frame.render_widget(CatalogWidget::new(state), area),
        },
        Mode::Normal | Mode::FilterInput => frame.render_widget(CatalogWidget::new(state), area),
    }
}

fn title_line(text: &str, width: u16) -> Line<'static> {
    let padded = format!(" {text}");
    let fill = usize::from(width).saturating_sub(display_width(&padded));
    Line::from(Span::styled(
        format!("{padded}{}", " ".repeat(fill)),
        title_style(),
    ))
}

fn notice_line(notice: &Notice) -> Line<'static> {
    let style = match notice.kind {
        NoticeKind::Info => Style::default().fg(DESCRIPTION),
        NoticeKind::Error => error_style(),
    };
    Line::from(Span::styled(notice.text.clone(), style))
}

fn footer_line(text: &str) -> Line<'static> {
    Line::from(Span::styled(text.to_string(), hint_style()))
}

fn display_width(text: &str) -> usize {
    text.chars()
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}

/// Cut `text` to at most `width` terminal columns, marking the cut with `…`.
pub(crate) fn truncate_to_width(text: &str, width: usize) -> String {
    if display_width(text) <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let mut used = 0;
    let mut truncated = String::new();
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + ch_width + 1 > width {
            break;
        }
        used += ch_width;
        truncated.push(ch);
    }
    truncated.push('…');
    truncated
}
