//! Agentline CLI - terminal chat with remote conversational agents
//!
//! The session controller from agentline-core owns the conversation; this
//! binary only renders it and forwards user intents.

mod tui;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

use agentline_core::config::{Config, ConfigManager};
use agentline_core::session::{SessionConfig, SessionController};
use agentline_core::{AgentKind, HttpTransport};

// TUI imports
use crossterm::{
    event::{
        DisableMouseCapture, KeyEventKind, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::prelude::*;
use tui::{App, AppState, Event, EventHandler, KeyAction, handle_key_help, handle_key_normal};

#[derive(Parser)]
#[command(name = "agentline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Chat with remote conversational and summarization agents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (defaults to the platform config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Endpoint URL override
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Agent to start with (conversational, summarization)
    #[arg(short, long)]
    agent: Option<AgentKind>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Send a single message, print the reply, and exit
    #[arg(long)]
    one_shot: Option<String>,

    /// Print the one-shot reply as JSON
    #[arg(long, requires = "one_shot")]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat mode
    Chat,

    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path.clone())?,
        None => ConfigManager::new()?,
    };
    let mut config = config_manager.config().clone();
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint.url = endpoint.clone();
    }
    if let Some(agent) = cli.agent {
        config.agents.default_agent = agent;
    }

    if let Some(prompt) = cli.one_shot.as_deref() {
        // Logs go to stderr so stdout carries only the reply
        init_logging(cli.verbose, &config, None);
        return run_one_shot(&config, prompt, cli.json).await;
    }

    match cli.command {
        Some(Commands::Config) => {
            init_logging(cli.verbose, &config, None);
            show_config(&config, &config_manager);
            Ok(())
        }
        Some(Commands::Chat) | None => {
            // The TUI owns the terminal, so logs go to a file
            let _guard = init_logging(cli.verbose, &config, Some(log_dir(&config)));
            run_chat(&config).await
        }
    }
}

/// Directory for the interactive-mode log file
fn log_dir(config: &Config) -> PathBuf {
    config
        .general
        .log_dir
        .clone()
        .or_else(|| {
            directories::ProjectDirs::from("", "", "agentline")
                .map(|dirs| dirs.data_local_dir().to_path_buf())
        })
        .unwrap_or_else(fallback_log_dir)
}

fn fallback_log_dir() -> PathBuf {
    std::env::temp_dir().join("agentline")
}

/// Setup logging - warn level on the console by default to stay out of the way.
/// Use --verbose for info/debug level logs. With a directory, logs go to a file there.
fn init_logging(verbose: bool, config: &Config, dir: Option<PathBuf>) -> Option<WorkerGuard> {
    let default_filter = if verbose {
        "info,agentline=debug,agentline_core=debug".to_string()
    } else if dir.is_some() {
        config.general.log_level.clone()
    } else {
        "warn".to_string()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let Some(dir) = dir else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return None;
    };

    // Never fall back to stderr here: the TUI owns the terminal
    let (appender, unusable) = match file_appender(&dir) {
        Ok(appender) => (appender, None),
        Err(e) => match file_appender(&fallback_log_dir()) {
            Ok(appender) => (appender, Some(e)),
            Err(_) => return None,
        },
    };

    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    if let Some(e) = unusable {
        warn!(
            "Cannot log to {} ({}), using {} instead",
            dir.display(),
            e,
            fallback_log_dir().display()
        );
    }
    Some(guard)
}

/// Daily-rotated log file in `dir`
fn file_appender(dir: &Path) -> anyhow::Result<RollingFileAppender> {
    std::fs::create_dir_all(dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("agentline.log")
        .build(dir)?;
    Ok(appender)
}

/// Build a controller wired to the configured endpoint
fn build_controller(
    config: &Config,
) -> anyhow::Result<(SessionController, agentline_core::CompletionReceiver, String)> {
    let transport = HttpTransport::new(&config.endpoint)?;
    let host = transport.host().to_string();
    let (controller, completions) =
        SessionController::new(SessionConfig::from_config(config), Arc::new(transport));
    Ok((controller, completions, host))
}

async fn run_one_shot(config: &Config, prompt: &str, json: bool) -> anyhow::Result<()> {
    if config.endpoint.get_api_key().is_none() {
        show_setup_instructions(config);
        anyhow::bail!("No API key configured");
    }

    let (mut controller, _completions, _host) = build_controller(config)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.magenta} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(format!("{} is typing...", controller.agent().label()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let reply = controller.send(prompt).await.cloned();
    spinner.finish_and_clear();

    let Some(turn) = reply else {
        anyhow::bail!("Nothing to send: message is empty");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&turn)?);
    } else if turn.is_failed() {
        eprintln!("{}", style(turn.content()).red());
    } else {
        println!("{}: {}", style(turn.agent_kind().label()).bold().green(), turn.content());
    }

    if turn.is_failed() {
        anyhow::bail!("Request to the agent failed");
    }
    Ok(())
}

async fn run_chat(config: &Config) -> anyhow::Result<()> {
    if config.endpoint.get_api_key().is_none() {
        show_setup_instructions(config);
        return Ok(());
    }

    let (mut controller, completions, host) = build_controller(config)?;
    let session_events = controller.subscribe();
    info!(host = %host, agent = %controller.agent(), "Starting chat");
    run_chat_tui(App::new(controller, host), completions, session_events).await
}

/// Run the TUI-based chat interface
async fn run_chat_tui(
    mut app: App,
    completions: agentline_core::CompletionReceiver,
    session_events: agentline_core::session::EventReceiver,
) -> anyhow::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    // Needed to tell Shift+Enter from Enter on terminals that support it
    let enhanced_keys = supports_keyboard_enhancement().unwrap_or(false);
    if enhanced_keys {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        )?;
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut events = EventHandler::new(completions, session_events);

    // Main event loop
    let result = run_event_loop(&mut terminal, &mut app, &mut events).await;

    // Restore terminal
    if enhanced_keys {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result
}

/// Main event loop for the TUI
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
) -> anyhow::Result<()> {
    loop {
        // Draw UI
        terminal.draw(|frame| tui::draw(frame, app))?;

        let Some(event) = events.next().await else {
            break;
        };

        match event {
            Event::Terminal(crossterm::event::Event::Key(key)) => {
                // Only handle key press events, not release or repeat
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                let action = match app.state() {
                    AppState::Help => handle_key_help(key),
                    state => handle_key_normal(key, &mut app.input, state == AppState::Processing),
                };

                match action {
                    KeyAction::Quit => app.should_quit = true,
                    KeyAction::Submit(input) => app.handle_user_input(&input),
                    KeyAction::SwitchAgent => {
                        app.switch_agent();
                    }
                    KeyAction::ClearChat => app.clear_chat(),
                    KeyAction::ToggleHelp => app.show_help = !app.show_help,
                    KeyAction::ScrollUp => app.scroll_up(),
                    KeyAction::ScrollDown => app.scroll_down(),
                    KeyAction::PageUp => {
                        for _ in 0..10 {
                            app.scroll_up();
                        }
                    }
                    KeyAction::PageDown => {
                        for _ in 0..10 {
                            app.scroll_down();
                        }
                    }
                    KeyAction::HistoryPrev => app.history_prev(),
                    KeyAction::HistoryNext => app.history_next(),
                    KeyAction::None => {}
                }
            }
            Event::Terminal(_) => {
                // Resize and others: redraw on next iteration
            }
            Event::Completion(completion) => {
                let agent = completion.agent();
                match app.controller.resolve(completion) {
                    Some(turn) => debug!(agent = %agent, failed = turn.is_failed(), "Reply resolved"),
                    None => debug!(agent = %agent, "Reply dropped"),
                }
            }
            Event::Session(session_event) => app.handle_session_event(session_event),
            Event::Tick => app.tick(),
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn show_config(config: &Config, config_manager: &ConfigManager) {
    println!("{}", style("Agentline configuration").bold().cyan());
    println!();
    println!("  Config file:     {}", config_manager.config_path().display());
    println!("  Endpoint:        {}", config.endpoint.url);
    println!("  Key header:      {}", config.endpoint.api_key_header);
    println!("  API key:         {}", mask_key(config.endpoint.get_api_key().as_deref()));
    if let Some(env) = &config.endpoint.api_key_env {
        println!("  Key variable:    {}", env);
    }
    println!("  Timeout:         {}s", config.endpoint.timeout_secs);
    println!();

    let directory = config.agent_directory();
    for agent in [AgentKind::Conversational, AgentKind::Summarization] {
        let marker = if agent == config.agents.default_agent { "*" } else { " " };
        println!(
            "{} {:<15} {}",
            style(marker).green(),
            format!("{}:", agent.label()),
            directory.agent_id(agent)
        );
    }
    println!();
    println!("  Stale replies:   {:?}", config.session.stale_replies);
    println!("  Log level:       {}", config.general.log_level);
    println!("  Log directory:   {}", log_dir(config).display());
}

/// Show everything but the last four characters of a key
fn mask_key(key: Option<&str>) -> String {
    match key {
        None => style("not set").red().to_string(),
        Some(key) if key.chars().count() <= 4 => "****".to_string(),
        Some(key) => {
            let tail: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
            format!("****{}", tail)
        }
    }
}

fn show_setup_instructions(config: &Config) {
    let env_name = config
        .endpoint
        .api_key_env
        .as_deref()
        .unwrap_or("AGENTLINE_API_KEY");

    eprintln!("{}", style("No API key configured for the agent endpoint.").yellow().bold());
    eprintln!();
    eprintln!("Set it in the environment:");
    eprintln!("  export {}=<your key>", env_name);
    eprintln!();
    eprintln!("or add it to the config file:");
    eprintln!("  [endpoint]");
    eprintln!("  api_key = \"<your key>\"");
}
