//! Theme and styling constants for the TUI.

use ratatui::style::{Color, Modifier, Style};

use pmt_proto::task::{Priority, TaskStatus};
use pmt_proto::user::Role;

/// Primary foreground color.
pub const FG_PRIMARY: Color = Color::White;

/// Secondary foreground color (dimmed text).
pub const FG_SECONDARY: Color = Color::Gray;

/// Highlight color for focused elements.
pub const HIGHLIGHT: Color = Color::Cyan;

/// Success indicator color.
pub const SUCCESS: Color = Color::Green;

/// Warning indicator color.
pub const WARNING: Color = Color::Yellow;

/// Error indicator color.
pub const ERROR: Color = Color::Red;

/// Normal text style.
#[must_use]
pub fn normal() -> Style {
    Style::default().fg(FG_PRIMARY)
}

/// Dimmed text style (dates, metadata).
#[must_use]
pub fn dimmed() -> Style {
    Style::default().fg(FG_SECONDARY)
}

/// Bold text style.
#[must_use]
pub fn bold() -> Style {
    Style::default().fg(FG_PRIMARY).add_modifier(Modifier::BOLD)
}

/// Highlighted text style (focused panel borders).
#[must_use]
pub fn highlighted() -> Style {
    Style::default().fg(HIGHLIGHT).add_modifier(Modifier::BOLD)
}

/// Selected item style (in lists).
#[must_use]
pub fn selected() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

/// Style of a task picked up for a drag.
#[must_use]
pub fn grabbed() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(WARNING)
        .add_modifier(Modifier::BOLD)
}

/// Header color of a board column.
#[must_use]
pub const fn status_color(status: TaskStatus) -> Color {
    match status {
        TaskStatus::Todo => Color::Blue,
        TaskStatus::InProgress => WARNING,
        TaskStatus::Done => SUCCESS,
    }
}

/// Badge style for a priority.
#[must_use]
pub fn priority(priority: Priority) -> Style {
    let color = match priority {
        Priority::Low => FG_SECONDARY,
        Priority::Medium => WARNING,
        Priority::High => ERROR,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Label style for a role.
#[must_use]
pub fn role(role: Role) -> Style {
    let color = match role {
        Role::Admin => Color::LightMagenta,
        Role::Member => HIGHLIGHT,
        Role::Observer => FG_SECONDARY,
    };
    Style::default().fg(color)
}

/// Style for the status bar background (dark background with white foreground).
#[must_use]
pub fn status_bar_bg() -> Style {
    Style::default().fg(Color::White).bg(Color::Rgb(30, 30, 50))
}

/// Style for panel titles with a given color (bold).
#[must_use]
pub fn panel_title(color: Color) -> Style {
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}

/// Border style of a blocking notice.
#[must_use]
pub fn notice() -> Style {
    Style::default().fg(ERROR).add_modifier(Modifier::BOLD)
}
