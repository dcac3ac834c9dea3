#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use croc_common::logging::init_logging;
use croc_common::Config;
use croc_game::WordCatalog;

mod app;
mod console;

use console::{broadcast_shutdown, Command, Console, HELP};

/// Crocodile - the group word-guessing game.
#[derive(Parser, Debug)]
#[command(name = "crocodile")]
#[command(version)]
#[command(about = "Play Crocodile, the word-explaining game, from a terminal.", long_about = None)]
struct Cli {
    /// Config file (default: ~/.crocodile/config.json or $CROC_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate the configuration and try loading every word pack
    Check,

    /// List languages and word packs
    Packs,

    /// Play one chat from the terminal
    Play {
        /// Chat id to play in
        #[arg(long, default_value_t = 1)]
        chat: i64,

        /// Player id you start as
        #[arg(long, default_value_t = 1)]
        player: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_with_env(cli.config.as_deref()).context("Failed to load config")?;
    init_logging(
        &config.observability.log_level,
        &config.observability.log_format,
    );

    match cli.command {
        Commands::Check => check(&config),
        Commands::Packs => packs(&config),
        Commands::Play { chat, player } => play(&config, chat, player).await,
    }
}

fn ensure_valid(config: &Config) -> Result<()> {
    if let Err(err) = config.validate() {
        bail!("Configuration is invalid:\n{err}");
    }
    Ok(())
}

fn check(config: &Config) -> Result<()> {
    ensure_valid(config)?;

    let catalog = WordCatalog::from_config(config).context("Failed to load word packs")?;
    app::load_dictionary(config)?;

    println!(
        "Configuration OK: {} of {} word packs loaded.",
        catalog.pack_count(),
        config.pack_count()
    );
    Ok(())
}

fn packs(config: &Config) -> Result<()> {
    let catalog = WordCatalog::from_config(config).context("Failed to load word packs")?;

    for language_id in catalog.language_ids() {
        let name = catalog.language_name(language_id).unwrap_or(language_id);
        println!("{name} [{language_id}]");
        for pack_id in catalog.pack_ids(language_id).unwrap_or_default() {
            let pack = catalog.pack(language_id, pack_id);
            let words = pack.as_ref().map_or(0, |p| p.len());
            let pack_name = pack.as_ref().map_or(pack_id, |p| p.name());
            println!("  {pack_id}: {pack_name} ({words} words)");
        }
    }
    Ok(())
}

async fn play(config: &Config, chat_id: i64, player: i64) -> Result<()> {
    ensure_valid(config)?;
    let engine = app::build_engine(config)?;
    let janitor = engine
        .store()
        .spawn_janitor(config.session.sweep_interval()?);

    info!(chat_id, player, "Console game started");
    println!("{HELP}");

    let mut console = Console::new(engine.clone(), chat_id, player);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }

                match Command::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        for reply in console.handle(command) {
                            println!("{reply}");
                        }
                    }
                    Err(err) => println!("{err}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    for (chat_id, notice) in broadcast_shutdown(&engine) {
        println!("[chat {chat_id}] {notice}");
    }
    janitor.abort();

    info!(player = console.player(), "Console game finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_sweep_interval_is_rejected() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../demos/config.json");
        let mut config = Config::load_from(&path).unwrap();
        ensure_valid(&config).unwrap();

        config.session.sweep_interval = "0s".into();
        let err = ensure_valid(&config).unwrap_err().to_string();
        assert!(err.starts_with("Configuration is invalid"));
        assert!(err.contains("session.sweep_interval"));
    }
}
