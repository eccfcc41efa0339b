use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Clear, Paragraph, Widget};

use crate::form::{FormField, FormState};

use super::{COMMAND, MUTED, error_style, footer_line, label_style, selected_style, title_line};

const NAVIGATE_FOOTER: &str =
    "↑/↓: Navigate  |  Tab: Next Field  |  Enter: Edit Field  |  y: Save  |  Esc: Cancel";
const EDIT_FOOTER: &str =
    "Enter: Confirm  |  Tab: Next Field  |  Esc: Cancel Edit  |  Ctrl+u: Clear Input";

fn editing_style() -> Style {
    Style::default()
        .fg(Color::White)
        .bg(Color::Rgb(0x00, 0x88, 0x00))
        .add_modifier(Modifier::BOLD)
}

/// Add/edit form for a single catalog entry.
pub struct FormWidget<'a> {
    form: &'a FormState,
}

impl<'a> FormWidget<'a> {
    pub fn new(form: &'a FormState) -> Self {
        Self { form }
    }

    fn field_line(&self, index: usize, field: FormField) -> Line<'static> {
        let active = index == self.form.active;
        let label = format!("{}: ", field.label());

        if active && let Some(buffer) = &self.form.editing {
            return Line::from(vec![
                Span::styled(label, editing_style()),
                Span::styled(buffer.clone(), editing_style()),
                Span::styled("_", selected_style()),
            ]);
        }

        let label_span = if active {
            Span::styled(label, selected_style())
        } else {
            Span::styled(label, label_style())
        };
        let value = field.value(&self.form.draft);
        let value_span = match (value.is_empty(), active) {
            (true, true) => Span::styled(format!("<{}>", field.hint()), selected_style()),
            (true, false) => Span::styled(format!("<{}>", field.hint()), Style::default().fg(MUTED)),
            (false, true) => Span::styled(value, selected_style()),
            (false, false) => Span::styled(value, Style::default().fg(COMMAND)),
        };
        Line::from(vec![label_span, value_span])
    }
}

impl Widget for FormWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        if area.height == 0 || area.width == 0 {
            return;
        }

        let mut lines = vec![title_line(self.form.title(), area.width), Line::default()];
        lines.extend(
            FormField::ALL
                .iter()
                .enumerate()
                .map(|(index, field)| self.field_line(index, *field)),
        );
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            self.form.active_field().hint(),
            Style::default().fg(MUTED),
        )));
        if let Some(error) = &self.form.error {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled(error.clone(), error_style())));
        }
        lines.push(Line::default());
        lines.push(footer_line(if self.form.is_editing() {
            EDIT_FOOTER
        } else {
            NAVIGATE_FOOTER
        }));

        Paragraph::new(lines).render(area, buf);
    }
}
