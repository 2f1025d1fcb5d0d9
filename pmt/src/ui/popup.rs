//! Overlays: forms, panels and the blocking notice.

use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use pmt_proto::user::{User, UserId};

use super::login::form_lines;
use super::task_detail::history_items;
use super::theme;
use crate::app::{App, FormState, HistoryPanel, Modal, ParticipantsPanel};
use crate::forms::{ParticipantList, ProjectForm, TaskForm, TextForm};

/// Rectangle of `width` x `height` centered in `area`.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(row);
    cell
}

fn titled(title: &str) -> Block<'static> {
    Block::default()
        .title(Span::styled(
            title.to_string(),
            theme::panel_title(theme::HIGHLIGHT),
        ))
        .borders(Borders::ALL)
        .border_style(theme::highlighted())
}

/// Render the active modal.
pub fn render_modal(frame: &mut Frame, modal: &Modal, app: &App) {
    match modal {
        Modal::Project(state) => render_project_form(frame, state, &app.users),
        Modal::Task(state) => render_task_form(frame, state),
        Modal::Participants(panel) => render_participants(frame, panel, &app.users),
        Modal::History(panel) => render_history(frame, panel, &app.date_format),
    }
}

/// Render a notice that blocks input until a key is pressed.
pub fn render_notice(frame: &mut Frame, notice: &str) {
    let area = centered(frame.area(), 60, 7);
    let text = vec![
        Line::from(notice.to_string()),
        Line::default(),
        Line::from(Span::styled("Press any key", theme::dimmed())),
    ];
    let block = Block::default()
        .title(Span::styled("Notice", theme::notice()))
        .borders(Borders::ALL)
        .border_style(theme::notice());
    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn user_name(users: &[User], id: Option<UserId>) -> String {
    match id {
        None => "(choose a user)".to_string(),
        Some(id) => users
            .iter()
            .find(|u| u.id == id)
            .map_or_else(|| format!("user #{id}"), |u| u.name.clone()),
    }
}

fn participant_lines(
    list: &ParticipantList,
    users: &[User],
    focused_row: Option<usize>,
) -> Vec<Line<'static>> {
    list.rows()
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let marker = if focused_row == Some(index) { "> " } else { "  " };
            Line::from(vec![
                Span::styled(marker, theme::highlighted()),
                Span::raw(user_name(users, row.user_id)),
                Span::raw("  "),
                Span::styled(row.role.label(), theme::role(row.role)),
            ])
        })
        .collect()
}

fn render_project_form(frame: &mut Frame, state: &FormState<ProjectForm>, users: &[User]) {
    let form = &state.form;
    let mut lines = form_lines(form, state.focus);
    let title = if form.editing.is_some() {
        "Edit project"
    } else {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled("Participants", theme::bold())));
        let focused_row = state.focus.checked_sub(form.labels().len());
        lines.extend(participant_lines(&form.participants, users, focused_row));
        "New project"
    };

    let height = u16::try_from(lines.len()).unwrap_or(u16::MAX).saturating_add(2);
    let area = centered(frame.area(), 72, height);
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(titled(title)), area);
}

fn render_task_form(frame: &mut Frame, state: &FormState<TaskForm>) {
    let form = &state.form;
    let mut lines = form_lines(form, state.focus);
    let priority_focused = state.focus == form.labels().len();
    lines.push(Line::from(vec![
        Span::styled(
            format!("{:>22}: ", "Priority"),
            if priority_focused {
                theme::highlighted()
            } else {
                theme::dimmed()
            },
        ),
        Span::styled(form.priority.label(), theme::priority(form.priority)),
    ]));

    let title = if form.editing.is_some() {
        "Edit task"
    } else {
        "New task"
    };
    let height = u16::try_from(lines.len()).unwrap_or(u16::MAX).saturating_add(2);
    let area = centered(frame.area(), 72, height);
    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines).block(titled(title)), area);
}

fn render_participants(frame: &mut Frame, panel: &ParticipantsPanel, users: &[User]) {
    let area = centered(frame.area(), 64, 20);
    frame.render_widget(Clear, area);
    let [members_area, adding_area] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(8)]).areas(area);

    let members: Vec<ListItem> = panel.members.as_ref().map_or_else(
        || vec![ListItem::new(Span::styled("Loading\u{2026}", theme::dimmed()))],
        |members| {
            members
                .users
                .iter()
                .enumerate()
                .map(|(idx, line)| {
                    let style = if panel.adding_focus.is_none() && idx == panel.selected {
                        theme::selected()
                    } else {
                        theme::normal()
                    };
                    ListItem::new(Line::from(vec![
                        Span::raw(user_name(users, Some(line.user_id))),
                        Span::raw("  "),
                        Span::styled(line.role.label(), theme::role(line.role)),
                    ]))
                    .style(style)
                })
                .collect()
        },
    );
    frame.render_widget(List::new(members).block(titled("Participants")), members_area);

    let adding = participant_lines(&panel.adding, users, panel.adding_focus);
    let block = Block::default()
        .title("Add (a: new line)")
        .borders(Borders::ALL)
        .border_style(if panel.adding_focus.is_some() {
            theme::highlighted()
        } else {
            theme::normal()
        });
    frame.render_widget(Paragraph::new(adding).block(block), adding_area);
}

fn render_history(frame: &mut Frame, panel: &HistoryPanel, date_format: &str) {
    let area = centered(frame.area(), 80, 24);
    frame.render_widget(Clear, area);
    let items = panel.entries.as_ref().map_or_else(
        || vec![ListItem::new(Span::styled("Loading\u{2026}", theme::dimmed()))],
        |entries| {
            history_items(entries, date_format)
                .into_iter()
                .skip(panel.scroll)
                .collect()
        },
    );
    frame.render_widget(List::new(items).block(titled("Project history")), area);
}
