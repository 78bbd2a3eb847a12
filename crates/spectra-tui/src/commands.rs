use std::path::Path;

use anyhow::{anyhow, bail, Result};
use colored::*;
use spectra_core::{ApiClient, ChatBackend, Config, Session, TransportError};

fn client(config: &Config) -> Result<ApiClient> {
    ApiClient::new(&config.api_url, config.timeout())
}

/// Pair the user-facing text with the underlying cause.
fn friendly(err: TransportError) -> anyhow::Error {
    anyhow!("{} ({})", err.user_message(), err)
}

pub async fn ask(config: &Config, text: &str) -> Result<()> {
    let mut session = Session::new(client(config)?);
    if !session.submit(text) {
        bail!("Nothing to send: the message is empty");
    }

    println!("💬 Asking {}...\n", "Spectra".bold().magenta());

    let reply = session
        .settle()
        .await
        .ok_or_else(|| anyhow!("No reply was recorded"))?;

    if reply.is_error {
        bail!("{}", reply.content);
    }

    println!("{}", "Spectra:".bold().magenta());
    println!("{}", reply.content);
    Ok(())
}

pub async fn status(config: &Config) -> Result<()> {
    let client = client(config)?;

    match client.check_status().await {
        Ok(status) => {
            println!("{} {}", "●".green(), "Connected".bold().green());
            println!("  {} {}", "status:".dimmed(), status.status);
            if let Some(provider) = status.ai_provider {
                println!("  {} {}", "provider:".dimmed(), provider);
            }
            if let Some(model) = status.model {
                println!("  {} {}", "model:".dimmed(), model.cyan());
            }
            if let Some(loaded) = status.personality_loaded {
                println!("  {} {}", "personality loaded:".dimmed(), loaded);
            }
        }
        Err(err) => {
            println!("{} {}", "●".red(), "Offline".bold().red());
            println!("  {}", err.to_string().dimmed());
        }
    }
    println!("  {} {}", "api:".dimmed(), client.base_url());
    println!("  {} {}s", "timeout:".dimmed(), client.timeout().as_secs());
    Ok(())
}

pub async fn health(config: &Config) -> Result<()> {
    let health = client(config)?.health().await.map_err(friendly)?;

    let service = health.service.as_deref().unwrap_or("backend");
    println!("{}: {}", service.bold(), health.status.green());
    if let Some(timestamp) = health.timestamp {
        println!("  {} {}", "at:".dimmed(), timestamp);
    }
    Ok(())
}

pub async fn list_models(config: &Config) -> Result<()> {
    let models = client(config)?.list_models().await.map_err(friendly)?;

    println!("\n{}", "🤖 Available Models".bold().blue());
    println!("{}", "=".repeat(30).dimmed());

    if models.available.is_empty() {
        println!("{}", "No models reported by the backend".yellow());
    }
    for model in &models.available {
        if *model == models.current {
            println!("  * {}", model.bold().green());
        } else {
            println!("    {}", model);
        }
    }
    if let Some(preferred) = models.preferred {
        println!("\n{} {}", "preferred:".dimmed(), preferred);
    }
    Ok(())
}

pub async fn select_model(config: &Config, name: &str) -> Result<()> {
    let selection = client(config)?.select_model(name).await.map_err(friendly)?;

    if selection.selected == selection.previous {
        println!("{} {}", "Model unchanged:".yellow(), selection.selected.bold());
    } else {
        println!(
            "{} {} → {}",
            "Model updated:".green(),
            selection.previous.dimmed(),
            selection.selected.bold().green()
        );
    }
    if !selection.message.is_empty() {
        println!("  {}", selection.message.dimmed());
    }
    Ok(())
}

pub fn show_config(config: &Config) -> Result<()> {
    println!("{} {}", "file:".dimmed(), Config::config_path()?.display());
    println!("{} {}", "api_url:".dimmed(), config.api_url);
    println!("{} {}s", "timeout:".dimmed(), config.timeout_secs);
    if config.greeting.is_empty() {
        println!("{} {}", "greeting:".dimmed(), "(none)".dimmed());
    } else {
        println!("{} {}", "greeting:".dimmed(), config.greeting);
    }
    Ok(())
}

pub fn init_config(force: bool) -> Result<()> {
    let path = Config::config_path()?;
    write_default_config(&path, force)?;
    println!("{} {}", "Wrote".green(), path.display());
    Ok(())
}

/// Write the default config without reading what is already there, so a
/// corrupt file can be replaced with `--force`.
fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("Config already exists at {} (use --force to overwrite)", path.display());
    }
    Config::default().save_to(path)
}
