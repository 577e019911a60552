//! authfront - a terminal front-end for a password-grant token endpoint.
//!
//! Two routes: a login form at `/` that exchanges credentials for a bearer
//! token, and a protected page at `/protected` shown once a token is stored.

mod app;
mod cli;
mod ui;

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use authfront_core::api::AuthClient;
use authfront_core::auth::open_store;
use authfront_core::router::Route;
use authfront_core::Config;

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file name prefix inside the log directory
const LOG_FILE_PREFIX: &str = "authfront.log";

/// What the command line asked for
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Tui(Route),
    Login,
    Register,
    Logout,
}

fn parse_args(args: &[String]) -> Result<Command> {
    match args.get(1).map(String::as_str) {
        None => Ok(Command::Tui(Route::Login)),
        Some("--open") => {
            let path = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("--open needs a path"))?;
            Ok(Command::Tui(path.parse()?))
        }
        Some("--login") => Ok(Command::Login),
        Some("--register") => Ok(Command::Register),
        Some("--logout") => Ok(Command::Logout),
        Some(other) => anyhow::bail!("unknown argument: {}", other),
    }
}

/// Default filter from RUST_LOG, falling back to warnings only
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Log to stderr; used by the line-mode commands
fn init_stderr_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter())
        .init();
}

/// Log to a daily file so output never lands on the alternate screen.
/// The returned guard flushes the writer when dropped.
fn init_file_tracing() -> Option<WorkerGuard> {
    let log_dir = Config::data_dir()?.join("logs");
    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(env_filter())
        .init();
    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    let command = parse_args(&args)?;

    let _guard = match command {
        Command::Tui(_) => init_file_tracing(),
        _ => {
            init_stderr_tracing();
            None
        }
    };

    let mut config = Config::load_or_default();
    let client = AuthClient::new(&config.base_url())?;
    let store = open_store(config.session_backend, Config::data_dir())?;
    info!(base_url = %client.base_url(), backend = ?config.session_backend, "authfront starting");

    match command {
        Command::Login => return cli::login(&mut config, &client, store.as_ref()).await,
        Command::Register => return cli::register(&config, &client).await,
        Command::Logout => return cli::logout(store.as_ref()),
        Command::Tui(start) => {
            let mut app = App::new(config, client, store, start);
            run_tui(&mut app).await?;
        }
    }

    info!("authfront shutting down");
    Ok(())
}

async fn run_tui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    app.sync_route()?;

    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout so background results show up promptly
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key) {
                    return Ok(());
                }
            }
        }

        // Apply finished requests and any route change they caused
        app.check_background_tasks()?;

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }

        // Yield so spawned requests make progress on this runtime
        tokio::task::yield_now().await;
    }
}
