use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Clear, List, ListItem, ListState, Paragraph, StatefulWidget, Widget};

use crate::state::{AppState, Mode};

use super::{
    COMMAND, DESCRIPTION, footer_line, label_style, notice_line, selected_style, title_line,
    truncate_to_width,
};

const TITLE: &str = "recipe - command manager";
const LIST_FOOTER: &str =
    "↑/↓: Navigate  |  Enter: Execute  |  n: New  |  e: Edit  |  f: Filter  |  c: Category  |  d: Delete  |  b: Background  |  h: Help  |  q: Quit";
const FILTER_FOOTER: &str = "Enter: Apply Filter  |  Esc: Done  |  Ctrl+u: Clear Filter";

/// Main screen: categories, filter and the visible entries.
pub struct CatalogWidget<'a> {
    state: &'a AppState,
}

impl<'a> CatalogWidget<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    fn title(&self, width: u16) -> Line<'static> {
        if self.state.run_in_background {
            title_line(&format!("{TITLE}  [background]"), width)
        } else {
            title_line(TITLE, width)
        }
    }

    fn categories(&self) -> Line<'static> {
        let mut spans = vec![Span::raw("Categories: ")];
        for (index, category) in self.state.categories.iter().enumerate() {
            if index > 0 {
                spans.push(Span::raw(" | "));
            }
            let style = if *category == self.state.active_category {
                selected_style()
            } else {
                label_style()
            };
            spans.push(Span::styled(category.clone(), style));
        }
        Line::from(spans)
    }

    fn filter(&self) -> Option<Line<'static>> {
        if self.state.mode == Mode::FilterInput {
            Some(Line::from(vec![
                Span::raw("Filter: "),
                Span::styled(self.state.filter_input.clone(), selected_style()),
                Span::styled("_", selected_style()),
            ]))
        } else if !self.state.filter.is_empty() {
            Some(Line::from(vec![
                Span::raw("Filter: "),
                Span::styled(self.state.filter.clone(), Style::default().fg(COMMAND)),
            ]))
        } else {
            None
        }
    }

    fn items(&self, width: usize) -> Vec<ListItem<'static>> {
        self.state
            .visible
            .iter()
            .enumerate()
            .map(|(index, command)| {
                let heading =
                    truncate_to_width(&format!("{} ({})", command.name, command.category), width);
                if index != self.state.selected {
                    return ListItem::new(Line::raw(heading));
                }
                ListItem::new(Text::from(vec![
                    Line::from(Span::styled(heading, selected_style())),
                    Line::from(Span::styled(
                        truncate_to_width(&format!("  Command: {}", command.command), width),
                        Style::default().fg(COMMAND),
                    )),
                    Line::from(Span::styled(
                        truncate_to_width(
                            &format!("  Description: {}", command.description),
                            width,
                        ),
                        Style::default().fg(DESCRIPTION),
                    )),
                ]))
            })
            .collect()
    }
}

impl Widget for CatalogWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);
        if area.height == 0 || area.width == 0 {
            return;
        }

        let filter = self.filter();
        let notice = self.state.notice.as_ref().map(notice_line);
        let [title, _, categories, filter_area, list_area, notice_area, footer] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(2),
                Constraint::Length(if filter.is_some() { 2 } else { 0 }),
                Constraint::Min(1),
                Constraint::Length(u16::from(notice.is_some())),
                Constraint::Length(1),
            ])
            .areas(area);

        Paragraph::new(self.title(area.width)).render(title, buf);
        Paragraph::new(self.categories()).render(categories, buf);
        if let Some(line) = filter {
            Paragraph::new(line).render(filter_area, buf);
        }

        if self.state.visible.is_empty() {
            Paragraph::new("No commands found.").render(list_area, buf);
        } else {
            let list = List::new(self.items(usize::from(list_area.width)));
            let mut list_state = ListState::default().with_selected(Some(self.state.selected));
            StatefulWidget::render(list, list_area, buf, &mut list_state);
        }

        if let Some(line) = notice {
            Paragraph::new(line).render(notice_area, buf);
        }

        let help = if self.state.mode == Mode::FilterInput {
            FILTER_FOOTER
        } else {
            LIST_FOOTER
        };
        Paragraph::new(footer_line(help)).render(footer, buf);
    }
}
