//! Regman - a TUI for registry user administration
//!
//! This tool lets you manage user accounts in a registry web service:
//! - Free-text user search
//! - Per-user detail view
//! - Editing profile fields and role assignments
//! - Soft-delete and restore

mod api;
mod auth;
mod config;
mod export;
mod models;
mod notify;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::RegistryClient;
use crate::auth::BasicAuthenticator;
use crate::config::Config;
use crate::ui::{ApiEvent, App, InputMode, KeyBindings, Route};

/// Regman - Registry user administration TUI
#[derive(Parser, Debug)]
#[command(name = "regman")]
#[command(about = "A terminal UI for managing user accounts in a registry web service")]
#[command(version)]
struct Args {
    /// Registry server URL (e.g., https://registry.example.org);
    /// defaults to the last used server
    #[arg(short, long, env = "REGMAN_SERVER")]
    server: Option<String>,

    /// Username for HTTP basic auth (required for admin operations)
    #[arg(short, long, env = "REGMAN_USER")]
    user: Option<String>,

    /// Password for HTTP basic auth
    #[arg(short, long, env = "REGMAN_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Use vim-style keybindings (j/k navigation)
    #[arg(long, default_value = "false")]
    vim: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (for debugging, set RUST_LOG=debug)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    let mut config = Config::load().unwrap_or_default();
    let server = args
        .server
        .or_else(|| config.current_server.clone())
        .context("No server given. Pass --server or set REGMAN_SERVER")?;

    let authenticator = Arc::new(BasicAuthenticator::new(&server, args.user, args.password));
    let client = Arc::new(RegistryClient::new(authenticator));

    // Test connection before starting TUI
    eprintln!("Connecting to {}...", server);
    client
        .test_connection()
        .await
        .context("Failed to reach the registry. Check the server URL and credentials")?;
    eprintln!("Connected successfully!");

    config.add_server(server);
    if let Err(e) = config.save() {
        tracing::warn!(error = %e, "could not save config");
    }

    // Set up key bindings
    let key_bindings = if args.vim {
        KeyBindings::Vim
    } else {
        KeyBindings::Arrows
    };

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app and run
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let mut app = App::new(client, key_bindings, events_tx);
    let result = run_app(&mut terminal, &mut app, events_rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {:?}", e);
    }

    Ok(())
}

/// Main event loop
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    mut events: mpsc::UnboundedReceiver<ApiEvent>,
) -> Result<()> {
    // The search view starts with an empty query applied
    app.search(String::new());

    loop {
        // Render
        terminal.draw(|f| ui::components::render(f, app))?;

        // Apply any completed API calls
        while let Ok(api_event) = events.try_recv() {
            app.handle_api_event(api_event);
        }

        // Handle events with timeout
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                match app.input_mode {
                    InputMode::Normal => handle_normal_mode(app, key),
                    InputMode::Search => handle_search_mode(app, key.code),
                    InputMode::Editing => handle_editing_mode(app, key.code),
                }

                if app.should_quit {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Handle input in normal mode, dispatched per route
fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match app.route.clone() {
        Route::UserSearch => handle_search_view(app, key),
        Route::UserDetail { .. } => handle_detail_view(app, key),
        Route::UserEdit { .. } => handle_edit_view(app, key),
    }
}

/// Keys on the search results view
fn handle_search_view(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('/') => {
            app.input_mode = InputMode::Search;
            app.search_query.clear();
            app.message = None;
            return;
        }
        KeyCode::Enter => {
            app.open_selected_user();
            return;
        }
        KeyCode::Char('x') => {
            app.export_results();
            return;
        }
        _ => {}
    }

    if app.key_bindings.is_up(key.code) {
        app.navigate_up();
    } else if app.key_bindings.is_down(key.code) {
        app.navigate_down();
    }
}

/// Keys on the user detail view
fn handle_detail_view(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.navigate(Route::UserSearch),
        KeyCode::Char('e') => app.edit_user(),
        KeyCode::Char('d') => app.delete(),
        KeyCode::Char('r') => app.restore(),
        _ => {}
    }
}

/// Keys on the user edit view
fn handle_edit_view(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.save();
        return;
    }

    match key.code {
        KeyCode::Esc => {
            app.cancel_edit();
            return;
        }
        KeyCode::Enter => {
            if app.edit_begin_text() {
                app.input_mode = InputMode::Editing;
            }
            return;
        }
        KeyCode::Char(' ') => {
            app.edit_toggle_role();
            return;
        }
        _ => {}
    }

    if app.key_bindings.is_up(key.code) {
        app.navigate_up();
    } else if app.key_bindings.is_down(key.code) {
        app.navigate_down();
    } else if app.key_bindings.is_left(key.code) {
        app.edit_cycle_country(false);
    } else if app.key_bindings.is_right(key.code) {
        app.edit_cycle_country(true);
    }
}

/// Handle input in search mode
fn handle_search_mode(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
            app.search(app.search_query.clone());
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.search_query.clear();
        }
        KeyCode::Backspace => {
            app.search_query.pop();
        }
        KeyCode::Char(c) => {
            app.search_query.push(c);
        }
        _ => {}
    }
}

/// Handle input while editing a form text field
fn handle_editing_mode(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
            app.edit_commit_text();
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.edit_buffer.clear();
        }
        KeyCode::Backspace => {
            app.edit_buffer.pop();
        }
        KeyCode::Char(c) => {
            app.edit_buffer.push(c);
        }
        _ => {}
    }
}
