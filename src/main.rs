mod config;
mod error;
mod logging;
mod ports;
mod services;
mod spotify_rs;
#[cfg(test)]
mod test_utils;

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use color_eyre::{
    Result,
    eyre::{OptionExt, WrapErr},
};

use crate::{
    config::Config,
    logging::setup_logging,
    services::{pipeline::RemovalPipeline, spotify::account::SpotifyAccountService},
    spotify_rs::{client::SpotifyClient, token_cache::CachedToken},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "REMIX_REMOVER_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Where the Spotify token is cached between runs
    #[arg(long, env = "REMIX_REMOVER_TOKEN_CACHE", global = true)]
    token_cache: Option<PathBuf>,

    /// Console log level
    #[arg(long, default_value = "info", global = true, env = "LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// File log level
    #[arg(long, default_value = "debug", global = true)]
    log_file_level: log::LevelFilter,

    /// Path to log file
    #[arg(long, env = "REMIX_REMOVER_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy the source playlist to the destination playlist without banned tracks
    Run(RunArgs),
    /// Log in to Spotify and cache the access token
    Auth,
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(ClapArgs, Debug)]
struct RunArgs {
    /// Playlist to filter (defaults to `release_playlist_name`)
    #[arg(long)]
    source: Option<String>,

    /// Playlist to publish to (defaults to `remix_free_playlist_name`)
    #[arg(long)]
    destination: Option<String>,

    /// Remove the destination's previous tracks first
    #[arg(long, conflicts_with = "keep_old_songs")]
    replace_old_songs: bool,

    /// Append to the destination's previous tracks
    #[arg(long)]
    keep_old_songs: bool,

    /// Only print which tracks would be kept and removed
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    log::debug!("Loading configuration");
    let config = {
        if let Some(path) = path {
            Config::from_file(&path)
        } else {
            Config::load()
        }
    }
    .wrap_err("Failed to load remix-remover config")?;
    Ok(config)
}

fn token_cache_path(path: Option<PathBuf>) -> Result<PathBuf> {
    match path {
        Some(path) => Ok(path),
        None => CachedToken::default_path().ok_or_eyre("Could not determine cache directory"),
    }
}

async fn run(config: Config, account: SpotifyAccountService, args: RunArgs) -> Result<()> {
    let source = args
        .source
        .unwrap_or_else(|| config.remover.release_playlist_name.clone());
    let destination = args
        .destination
        .unwrap_or_else(|| config.remover.remix_free_playlist_name.clone());
    let purge = if args.replace_old_songs {
        true
    } else if args.keep_old_songs {
        false
    } else {
        config.remover.replace_old_songs
    };

    log::debug!(
        "Banned keywords: {:?}",
        config.remover.banned_keywords.iter().collect::<Vec<_>>()
    );

    let access_token = account.access_token().await?;
    let pipeline = RemovalPipeline::new(&config.remover, SpotifyClient::new(access_token))?;

    if args.dry_run {
        let preview = pipeline.preview(&source).await?;
        println!("Keeping {} tracks from '{}':", preview.kept.len(), preview.source.name);
        for track in &preview.kept {
            println!("  + {}", track.name);
        }
        println!("Removing {} tracks:", preview.removed.len());
        for track in &preview.removed {
            println!("  - {}", track.name);
        }
        if !preview.skipped.is_empty() {
            println!("Skipping {} local files:", preview.skipped.len());
            for track in &preview.skipped {
                println!("  ~ {}", track.name);
            }
        }
        return Ok(());
    }

    match pipeline.run(&source, &destination, purge).await {
        Ok(summary) => {
            println!(
                "Added {} of {} tracks to '{}' (playlist {}{})",
                summary.total_kept,
                summary.total_fetched,
                destination,
                summary.destination_playlist_id,
                if summary.created { ", newly created" } else { "" }
            );
            Ok(())
        }
        Err(error) if error.is_partial_write() => Err(error).wrap_err(format!(
            "'{}' was only partially updated and may contain a mix of old and new tracks",
            destination
        )),
        Err(error) => Err(error.into()),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    setup_logging(args.log_level, args.log_file.clone(), args.log_file_level)?;

    log::debug!("Remix remover starting");

    match args.command {
        Commands::Config(config_commands) => match config_commands {
            ConfigCommands::CreateDefault => {
                log::debug!("Creating default config");
                let path = Config::create_default()?;
                println!("{}", path.display());
            }
            ConfigCommands::Path => match Config::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No default config path found"),
            },
        },
        Commands::Auth => {
            let config = load_config(args.config)?;
            let account =
                SpotifyAccountService::new(config.spotify, token_cache_path(args.token_cache)?);
            account
                .authorize(std::io::stdin().lock(), std::io::stdout())
                .await?;
            log::info!("Token saved to {}", account.token_cache_path().display());
        }
        Commands::Run(run_args) => {
            let config = load_config(args.config)?;
            let account = SpotifyAccountService::new(
                config.spotify.clone(),
                token_cache_path(args.token_cache)?,
            );
            run(config, account, run_args).await?;
        }
    }

    Ok(())
}
