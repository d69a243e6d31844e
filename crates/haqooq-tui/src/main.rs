use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{
        DisableBracketedPaste, EnableBracketedPaste, Event, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use haqooq_client::AnswerClient;
use haqooq_config::{ConfigManager, CONFIG_ENV, ENDPOINT_ENV};
use haqooq_observability::{LogManager, LogSink};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info};

mod app;
mod keys;
mod markdown;
mod ui;

use app::App;

#[derive(Parser, Debug)]
#[command(name = "haqooq-tui")]
#[command(about = "Terminal chat with the HaqooqAI legal assistant")]
#[command(version)]
struct Args {
    /// Answer service endpoint
    #[arg(long, env = ENDPOINT_ENV)]
    endpoint: Option<String>,

    /// Config file path
    #[arg(long, env = CONFIG_ENV)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let manager = match &args.config {
        Some(path) => ConfigManager::load(path).await,
        None => ConfigManager::load_default().await,
    }
    .context("Failed to load config")?;
    let config = manager.snapshot().await.with_endpoint_override(args.endpoint);
    haqooq_config::validate_url(&config.endpoint.url)?;

    // stdout belongs to the terminal UI, so logs go to a file or nowhere
    let _log_manager = match LogSink::from_config(&config.logging) {
        sink @ LogSink::File(_) => Some(LogManager::init(&config.logging, sink)?),
        LogSink::Stderr => None,
    };
    info!(endpoint = %config.endpoint.url, "starting haqooq-tui");

    let service = Arc::new(AnswerClient::new(&config.endpoint.url));
    let mut app = App::new(service, config.ui.clone(), &config.endpoint.url);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let enhanced = supports_keyboard_enhancement().unwrap_or(false);
    if enhanced {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let tick_rate = tokio::time::Duration::from_millis(config.ui.tick_rate_ms.max(10));
    let res = run_app(&mut terminal, &mut app, tick_rate, enhanced).await;

    // Restore terminal
    if enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        error!(error = %err, "terminal loop failed");
    }
    info!(messages = app.session.len(), "haqooq-tui exiting");
    res.map_err(Into::into)
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    tick_rate: tokio::time::Duration,
    shift_reported: bool,
) -> io::Result<()> {
    let mut last_tick = tokio::time::Instant::now();

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| tokio::time::Duration::from_secs(0));

        // crossterm polling blocks the thread; keep spawned requests moving
        let has_event = tokio::task::block_in_place(|| crossterm::event::poll(timeout))?;
        if has_event {
            match crossterm::event::read()? {
                Event::Key(key) => {
                    if let Some(action) = keys::map_key(key, shift_reported) {
                        app.handle_action(action);
                    }
                }
                Event::Paste(text) => app.paste(&text),
                _ => {}
            }
        }

        app.process_completions();
        if app.should_quit() {
            return Ok(());
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = tokio::time::Instant::now();
        }
    }
}
