//! Kanban board of the open project.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

use pmt_proto::task::{Task, TaskStatus};

use super::{format_date, theme};
use crate::app::App;

/// Render the three status columns side by side.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let columns = Layout::horizontal([Constraint::Ratio(1, 3); 3]).split(area);
    for (status, column_area) in TaskStatus::ALL.into_iter().zip(columns.iter()) {
        render_column(frame, *column_area, app, status);
    }
}

fn render_column(frame: &mut Frame, area: Rect, app: &App, status: TaskStatus) {
    let is_focused = app.cursor.column == status;
    let tasks = app.board.column(status);

    let mut items: Vec<ListItem> = tasks
        .iter()
        .enumerate()
        .map(|(idx, task)| {
            let is_cursor = is_focused && idx == app.cursor.index;
            let is_grabbed = app.grab.is_some_and(|g| g.task_id == task.id);
            let style = if is_grabbed {
                theme::grabbed()
            } else if is_cursor {
                theme::selected()
            } else {
                theme::normal()
            };
            ListItem::new(task_lines(task, &app.date_format)).style(style)
        })
        .collect();

    // Drop slot past the last task while dragging into this column.
    if is_focused && app.grab.is_some() && app.cursor.index == tasks.len() {
        items.push(ListItem::new(Span::styled("  \u{25b8} drop here", theme::highlighted())));
    }

    let title = format!("{} ({})", status.label(), tasks.len());
    let block = Block::default()
        .title(Span::styled(
            title,
            theme::panel_title(theme::status_color(status)),
        ))
        .borders(Borders::ALL)
        .border_style(if is_focused {
            theme::highlighted()
        } else {
            theme::normal()
        });

    frame.render_widget(List::new(items).block(block), area);
}

fn task_lines(task: &Task, date_format: &str) -> Vec<Line<'static>> {
    vec![
        Line::from(vec![
            Span::styled(format!("[{}] ", task.priority.label()), theme::priority(task.priority)),
            Span::raw(task.name.clone()),
        ]),
        Line::from(Span::styled(
            format!("  due {}", format_date(task.due_date, date_format)),
            theme::dimmed(),
        )),
    ]
}
