use anyhow::Result;
use clap::{Parser, Subcommand};
use spectra_core::Config;
use tracing::info;

mod app;
mod commands;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use logging::LogTarget;

#[derive(Parser)]
#[command(name = "spectra")]
#[command(about = "Terminal chat client for the Spectra AI backend", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Backend API base URL, including the /api prefix
    #[arg(long, global = true, value_name = "URL")]
    api_url: Option<String>,

    /// Seconds to wait for a reply before giving up
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat (default)
    Chat,
    /// Send a single message and print the reply
    Ask {
        /// Message text
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Check whether the backend is reachable
    Status,
    /// Query the backend's health endpoint
    Health,
    /// List the models the backend can use
    Models,
    /// Switch the backend to a different model
    SelectModel {
        /// Exact model name or shorthand (e.g. "phi")
        name: String,
    },
    /// Show or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Chat);

    let target = match command {
        Commands::Chat => LogTarget::File,
        _ => LogTarget::Stderr,
    };
    logging::init_tracing(target)?;

    // `config init` must not read the file it is about to replace
    let api_url = cli.api_url;
    let timeout = cli.timeout;
    let load_config = move || -> Result<Config> {
        Ok(Config::load()?.with_env()?.with_overrides(api_url, timeout))
    };

    match command {
        Commands::Chat => run_chat(&load_config()?).await?,
        Commands::Ask { text } => commands::ask(&load_config()?, &text.join(" ")).await?,
        Commands::Status => commands::status(&load_config()?).await?,
        Commands::Health => commands::health(&load_config()?).await?,
        Commands::Models => commands::list_models(&load_config()?).await?,
        Commands::SelectModel { name } => {
            commands::select_model(&load_config()?, &name).await?
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::show_config(&load_config()?)?,
            ConfigAction::Init { force } => commands::init_config(force)?,
        },
    }

    Ok(())
}

async fn run_chat(config: &Config) -> Result<()> {
    info!(api_url = %config.api_url, timeout = config.timeout_secs, "starting chat session");
    let mut app = App::new(config)?;
    app.start_status_probe();

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run_loop(
    terminal: &mut tui::Tui,
    app: &mut App,
    events: &mut tui::EventHandler,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}
