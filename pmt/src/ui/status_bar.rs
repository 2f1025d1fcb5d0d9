//! Status bar rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme;
use crate::app::{App, Modal, Screen};

/// Render the status bar at the bottom of the screen.
pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let help_text = match (&app.modal, app.screen) {
        (Some(Modal::Project(_)), _) => {
            "Tab: next field | Ctrl+N: add participant | h/l: user | r: role | x: remove | Enter: save | Esc: cancel"
        }
        (Some(Modal::Task(_)), _) => "Tab: next field | h/l: priority | Enter: save | Esc: cancel",
        (Some(Modal::Participants(_)), _) => {
            "a: add line | Tab: switch list | h/l: user | r: role | x: remove | Enter: save | Esc: close"
        }
        (Some(Modal::History(_)), _) => "j/k: scroll | Esc: close",
        (None, Screen::Login) => "Enter: log in | Tab: next field | F2: create account | Esc: quit",
        (None, Screen::Signup) => "Enter: sign up | Tab: next field | F2/Esc: back to login",
        (None, Screen::Dashboard) => {
            "j/k: select | Enter: open | n: new | d: delete | r: refresh | L: log out | q: quit"
        }
        (None, Screen::Board) if app.grab.is_some() => {
            "h/j/k/l: choose slot | Space: drop | Esc: cancel"
        }
        (None, Screen::Board) => {
            "h/j/k/l: move | Space: grab | Enter: open | n: new | d: delete | e: edit | p: people | H: history | Esc: back"
        }
        (None, Screen::TaskDetail) => {
            "Tab: switch list | Enter: assign | x: unassign | e: edit | d: delete | Esc: back"
        }
    };

    let context = app.project.as_ref().map_or_else(
        || "PMT".to_string(),
        |p| format!("PMT \u{b7} {}", p.name),
    );

    let mut spans = vec![Span::styled(context, theme::bold())];
    if app.pending_transfers() > 0 {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            format!("saving {}", app.pending_transfers()),
            theme::normal().fg(theme::WARNING),
        ));
    }
    spans.push(Span::raw(" | "));
    spans.push(Span::styled(help_text, theme::dimmed()));

    let paragraph = Paragraph::new(Line::from(spans)).style(theme::status_bar_bg());
    frame.render_widget(paragraph, area);
}
