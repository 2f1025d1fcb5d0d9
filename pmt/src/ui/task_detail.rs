//! Task detail: fields, assignees and history.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

use pmt_proto::history::HistoryEntry;

use super::{format_date, theme};
use crate::app::{App, DetailFocus, TaskDetailData, TaskDetailView};

/// Render the task detail screen.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let Some(detail) = &app.detail else {
        return;
    };
    let Some(data) = &detail.data else {
        let loading = Paragraph::new(Span::styled("Loading task\u{2026}", theme::dimmed()))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(loading, area);
        return;
    };

    let [top, bottom] =
        Layout::vertical([Constraint::Length(8), Constraint::Min(3)]).areas(area);
    let [members_area, assignees_area, history_area] = Layout::horizontal([
        Constraint::Percentage(30),
        Constraint::Percentage(30),
        Constraint::Percentage(40),
    ])
    .areas(bottom);

    render_fields(frame, top, data, &app.date_format);
    render_members(frame, members_area, detail, data);
    render_assignees(frame, assignees_area, detail, data);
    render_history(frame, history_area, &data.history, &app.date_format);
}

fn render_fields(frame: &mut Frame, area: Rect, data: &TaskDetailData, date_format: &str) {
    let task = &data.task;
    let lines = vec![
        Line::from(Span::styled(task.name.clone(), theme::bold())),
        Line::from(vec![
            Span::styled(task.status.label(), theme::panel_title(theme::status_color(task.status))),
            Span::raw("  "),
            Span::styled(task.priority.label(), theme::priority(task.priority)),
        ]),
        Line::from(Span::styled(
            format!(
                "due {}  ended {}",
                format_date(task.due_date, date_format),
                format_date(task.end_date, date_format)
            ),
            theme::dimmed(),
        )),
        Line::from(task.description.clone()),
    ];
    let block = Block::default()
        .title(Span::styled("Task", theme::panel_title(theme::HIGHLIGHT)))
        .borders(Borders::ALL);
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn focus_block(title: &str, focused: bool) -> Block<'static> {
    Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(if focused {
            theme::highlighted()
        } else {
            theme::normal()
        })
}

fn render_members(frame: &mut Frame, area: Rect, detail: &TaskDetailView, data: &TaskDetailData) {
    let focused = detail.focus == DetailFocus::Members;
    let items: Vec<ListItem> = data
        .members
        .iter()
        .enumerate()
        .map(|(idx, user)| {
            let style = if focused && idx == detail.selected_member {
                theme::selected()
            } else {
                theme::normal()
            };
            ListItem::new(user.name.clone()).style(style)
        })
        .collect();
    frame.render_widget(
        List::new(items).block(focus_block("Members (Enter: assign)", focused)),
        area,
    );
}

fn render_assignees(
    frame: &mut Frame,
    area: Rect,
    detail: &TaskDetailView,
    data: &TaskDetailData,
) {
    let focused = detail.focus == DetailFocus::Assignees;
    let items: Vec<ListItem> = data
        .assignments
        .iter()
        .enumerate()
        .map(|(idx, assigned)| {
            let style = if focused && idx == detail.selected_assignee {
                theme::selected()
            } else {
                theme::normal()
            };
            ListItem::new(assigned.username.clone()).style(style)
        })
        .collect();
    frame.render_widget(
        List::new(items).block(focus_block("Assignees (x: remove)", focused)),
        area,
    );
}

/// History entries as display lines, newest first.
pub(crate) fn history_items(entries: &[HistoryEntry], date_format: &str) -> Vec<ListItem<'static>> {
    entries
        .iter()
        .rev()
        .map(|entry| {
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(
                        entry.changed_at.format(&format!("{date_format} %H:%M")).to_string(),
                        theme::dimmed(),
                    ),
                    Span::raw(" "),
                    Span::styled(entry.user.name.clone(), theme::bold()),
                    Span::raw(format!(" changed {}", entry.field.label())),
                ]),
                Line::from(Span::styled(
                    format!("  {} \u{2192} {}", entry.old_value, entry.new_value),
                    theme::normal(),
                )),
            ])
        })
        .collect()
}

fn render_history(frame: &mut Frame, area: Rect, entries: &[HistoryEntry], date_format: &str) {
    let block = Block::default().title("History").borders(Borders::ALL);
    frame.render_widget(List::new(history_items(entries, date_format)).block(block), area);
}
