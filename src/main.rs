mod app;
mod auth;
mod board;
mod config;
mod error;
mod models;
mod parser;
mod repository;
mod storage;
mod tasks;
mod ui;
mod validate;
mod view;

use crate::app::App;
use crate::board::TaskBoard;
use crate::config::Config;
use crate::storage::FileStore;
use crate::ui::run_app;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dotenv::dotenv;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

// The terminal belongs to the UI, so logs go to a file
fn init_logging(log_file: &Path) -> io::Result<()> {
    if let Some(parent) = log_file.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "taskboard=info".into()),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::load()?;
    init_logging(&config.log_file)?;
    tracing::info!(data_dir = %config.data_dir.display(), "starting taskboard");

    let store = FileStore::open(&config.data_dir)?;
    let mut board = TaskBoard::open(store);
    board.load_user();
    board.set_filter(config.default_filter);
    board.set_sort_by(config.default_sort);

    // Setup terminal UI
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    terminal.hide_cursor()?;

    let res = run_app(&mut terminal, App::new(board));

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(%err, "terminal loop failed");
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}
