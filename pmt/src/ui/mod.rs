//! Terminal UI rendering.

pub mod board;
pub mod dashboard;
pub mod login;
pub mod popup;
pub mod status_bar;
pub mod task_detail;
pub mod theme;

use chrono::NaiveDate;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

use crate::app::{App, Screen};

/// Main draw function for the entire UI.
pub fn draw(frame: &mut Frame, app: &App) {
    // Main layout with status bar at bottom
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(frame.area());

    let content_area = main_chunks[0];
    let status_area = main_chunks[1];

    match app.screen {
        Screen::Login | Screen::Signup => login::render(frame, content_area, app),
        Screen::Dashboard => dashboard::render(frame, content_area, app),
        Screen::Board => board::render(frame, content_area, app),
        Screen::TaskDetail => task_detail::render(frame, content_area, app),
    }

    status_bar::render(frame, status_area, app);

    if let Some(modal) = &app.modal {
        popup::render_modal(frame, modal, app);
    }
    if let Some(notice) = app.current_notice() {
        popup::render_notice(frame, notice);
    }
}

/// Formats an optional date, or a dash.
pub(crate) fn format_date(date: Option<NaiveDate>, format: &str) -> String {
    date.map_or_else(|| "-".to_string(), |d| d.format(format).to_string())
}
