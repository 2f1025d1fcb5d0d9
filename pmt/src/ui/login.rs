//! Login and signup screens.

use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::theme;
use crate::app::{App, Screen};
use crate::forms::TextForm;

/// Render the login or signup form, centered.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let (title, lines) = if app.screen == Screen::Signup {
        ("Create an account", form_lines(&app.signup.form, app.signup.focus))
    } else {
        ("PMT: log in", form_lines(&app.login.form, app.login.focus))
    };

    let height = u16::try_from(lines.len()).unwrap_or(u16::MAX).saturating_add(2);
    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [form_area] = Layout::horizontal([Constraint::Length(60)])
        .flex(Flex::Center)
        .areas(row);

    let block = Block::default()
        .title(Span::styled(title, theme::panel_title(theme::HIGHLIGHT)))
        .borders(Borders::ALL)
        .border_style(theme::highlighted());

    frame.render_widget(Paragraph::new(lines).block(block), form_area);
}

/// One line per field: label, then the value (masked for secrets).
pub(crate) fn form_lines<F: TextForm>(form: &F, focus: usize) -> Vec<Line<'static>> {
    form.labels()
        .iter()
        .enumerate()
        .map(|(index, label)| {
            let value = form.field(index).unwrap_or_default();
            let shown = if form.is_secret(index) {
                "*".repeat(value.chars().count())
            } else {
                value.to_string()
            };
            let (label_style, cursor) = if index == focus {
                (theme::highlighted(), "_")
            } else {
                (theme::dimmed(), "")
            };
            Line::from(vec![
                Span::styled(format!("{label:>22}: "), label_style),
                Span::styled(shown, theme::normal()),
                Span::styled(cursor, theme::highlighted()),
            ])
        })
        .collect()
}
