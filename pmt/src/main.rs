//! `pmt` -- terminal kanban client for the PMT project manager.
//!
//! Configuration via CLI flags, environment variables, or config file
//! (`~/.config/pmt/config.toml`).
//!
//! ```bash
//! # Against a local pmt-server
//! cargo run --bin pmt
//!
//! # Another backend, private session file
//! cargo run --bin pmt -- --api-url http://10.0.0.5:8080 --session-file /tmp/pmt.json
//!
//! # Or via environment variables
//! PMT_API_URL=http://10.0.0.5:8080 PMT_LOG=debug cargo run --bin pmt
//! ```

use std::io;
use std::path::Path;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use pmt::app::App;
use pmt::config::{CliArgs, ClientConfig};
use pmt::net::{self, NetCommand, NetConfig, NetEvent};
use pmt::session::{FileStorage, MemoryStorage, SessionStore};
use pmt::ui;

#[tokio::main]
async fn main() -> io::Result<()> {
    let cli = CliArgs::parse();

    // Load and resolve configuration (CLI args > env > config file > defaults).
    let config = match ClientConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            ClientConfig::default()
        }
    };

    let net_config = match config.to_net_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    // Logs go to a file, never stdout: the terminal belongs to ratatui.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!(api = %net_config.api_url, "pmt starting");

    let session = open_session(&config);

    // Set up terminal.
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, net_config, session, &config).await;

    // Restore terminal.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    tracing::info!("pmt exiting");
    result
}

/// Initialize file-based logging.
///
/// Returns a [`WorkerGuard`] that must be held until shutdown to ensure all
/// buffered log entries are flushed.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("pmt.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Session over the configured file, or memory only when no file can be
/// located.
fn open_session(config: &ClientConfig) -> SessionStore {
    match config.session_path() {
        Ok(path) => {
            tracing::debug!(path = %path.display(), "session file");
            SessionStore::open(
                Box::new(FileStorage::new(path)),
                Box::new(MemoryStorage::new()),
            )
        }
        Err(e) => {
            tracing::warn!(error = %e, "session will not survive a restart");
            SessionStore::in_memory()
        }
    }
}

/// Main application loop.
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    net_config: NetConfig,
    session: SessionStore,
    client_config: &ClientConfig,
) -> io::Result<()> {
    let mut app = App::new(session).with_date_format(&client_config.date_format);

    let (cmd_tx, mut evt_rx) = match net::spawn_net(net_config) {
        Ok(channels) => channels,
        Err(e) => return Err(io::Error::other(e.message)),
    };

    if let Some(cmd) = app.startup_command() {
        dispatch(&mut app, &cmd_tx, cmd);
    }

    loop {
        // Step 1: Draw the UI frame.
        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Step 2: Drain all pending NetEvents (non-blocking).
        drain_net_events(&mut app, &mut evt_rx, &cmd_tx);

        // Step 3: Poll for terminal input events.
        if event::poll(client_config.poll_timeout)?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(cmd) = app.handle_key_event(key) {
                dispatch(&mut app, &cmd_tx, cmd);
            }
        }

        if app.should_quit {
            let _ = cmd_tx.try_send(NetCommand::Shutdown);
            return Ok(());
        }
    }
}

/// Hand a command to the network coordinator without blocking the loop.
fn dispatch(app: &mut App, tx: &mpsc::Sender<NetCommand>, cmd: NetCommand) {
    match tx.try_send(cmd) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(cmd)) => app.dispatch_failed(cmd, "network busy"),
        Err(mpsc::error::TrySendError::Closed(cmd)) => {
            app.dispatch_failed(cmd, "network stopped");
        }
    }
}

/// Drain all pending `NetEvent`s and dispatch any follow-up commands.
fn drain_net_events(
    app: &mut App,
    rx: &mut mpsc::Receiver<NetEvent>,
    tx: &mpsc::Sender<NetCommand>,
) {
    while let Ok(event) = rx.try_recv() {
        if let Some(cmd) = app.apply_net_event(event) {
            dispatch(app, tx, cmd);
        }
    }
}
