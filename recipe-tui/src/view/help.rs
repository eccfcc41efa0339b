use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Clear, Paragraph, Widget};

use super::{footer_line, label_style, title_line};

const SHORTCUTS: [(&str, &str); 14] = [
    ("↑/↓ k/j", "Navigate the command list or scroll output"),
    ("Enter", "Execute the selected command"),
    ("n", "Add a new command"),
    ("e", "Edit the selected command"),
    ("d", "Delete the selected command"),
    ("f", "Filter commands by name, command, description or tags"),
    ("c", "Cycle through categories"),
    ("b", "Toggle background execution mode"),
    ("h", "Show/hide this help screen"),
    ("PgUp/PgDn", "Scroll output by a page"),
    ("Home/End", "Jump to the top or bottom of the output"),
    ("Esc", "Leave the output view, form or filter"),
    ("q", "Quit the application"),
    ("Ctrl+C", "Quit from anywhere"),
];

/// Key binding reference.
pub struct HelpWidget;

impl Widget for HelpWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        if area.height == 0 || area.width == 0 {
            return;
        }

        let mut lines = vec![
            title_line("Help - Keyboard Shortcuts", area.width),
            Line::default(),
        ];
        lines.extend(SHORTCUTS.iter().map(|(keys, description)| {
            Line::from(vec![
                Span::styled(format!("{keys:<10}"), label_style()),
                Span::raw(format!(" {description}")),
            ])
        }));
        lines.push(Line::default());
        lines.push(footer_line("Press Esc or h to go back"));

        Paragraph::new(lines).render(area, buf);
    }
}
