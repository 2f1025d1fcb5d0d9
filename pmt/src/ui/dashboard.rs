//! Dashboard: the logged-in user's projects.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

use super::{format_date, theme};
use crate::app::App;

/// Render the project list.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .projects
        .iter()
        .enumerate()
        .map(|(idx, project)| {
            let line = Line::from(vec![
                Span::styled(project.name.clone(), theme::bold()),
                Span::raw("  "),
                Span::styled(project.description.clone(), theme::normal()),
                Span::raw("  "),
                Span::styled(
                    format!(
                        "{} \u{2192} {}",
                        format_date(project.start_date, &app.date_format),
                        format_date(project.end_date, &app.date_format)
                    ),
                    theme::dimmed(),
                ),
            ]);
            let style = if idx == app.selected_project {
                theme::selected()
            } else {
                theme::normal()
            };
            ListItem::new(line).style(style)
        })
        .collect();

    let who = app
        .session
        .current_user()
        .map_or_else(String::new, |u| format!(" ({})", u.name));
    let block = Block::default()
        .title(Span::styled(
            format!("Projects{who}"),
            theme::panel_title(theme::HIGHLIGHT),
        ))
        .borders(Borders::ALL)
        .border_style(theme::highlighted());

    if items.is_empty() {
        let empty = List::new([ListItem::new(Span::styled(
            "No project yet. Press n to create one.",
            theme::dimmed(),
        ))]);
        frame.render_widget(empty.block(block), area);
    } else {
        frame.render_widget(List::new(items).block(block), area);
    }
}
