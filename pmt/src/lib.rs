//! PMT: terminal kanban client for the PMT project manager.

pub mod api;
pub mod app;
pub mod board;
pub mod config;
pub mod forms;
pub mod net;
pub mod session;
pub mod ui;
