//! NowPlaying - command-line client
//!
//! Logs in through the relay and follows the currently-playing track.

use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use nowplaying_domain::{NowPlayingError, Track};
use nowplaying_infra::config::load_client_config;
use nowplaying_lib::commands::{self, WatchExit};
use nowplaying_lib::utils::logging::{init_tracing, log_command_execution};
use nowplaying_lib::{AppContext, Cli, Command};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let dotenv = dotenvy::dotenv();
    init_tracing(if cli.verbose { "debug" } else { "info" });
    match dotenv {
        Ok(path) => info!(path = %path.display(), "Loaded .env"),
        Err(e) => info!("No .env file loaded: {}", e),
    }

    let config = cli.apply_overrides(load_client_config().context("loading client config")?);
    let ctx = AppContext::new(config).await.context("building client context")?;

    let started = Instant::now();
    let result = run(&cli.command, &ctx).await;
    log_command_execution(cli.command_name(), started.elapsed(), result.as_ref().err());

    result.map_err(anyhow::Error::from)
}

async fn run(command: &Command, ctx: &AppContext) -> Result<(), NowPlayingError> {
    match command {
        Command::Login { timeout_secs } => {
            let pending = commands::begin_login(ctx).await?;
            println!("Open this URL in your browser to log in:\n\n  {}\n", pending.url);
            println!("Waiting for the callback on {} ...", pending.callback_origin());

            let tokens = pending.finish(ctx, Duration::from_secs(*timeout_secs)).await?;
            println!("Logged in. Access token valid for {}s.", tokens.expires_in);
        }
        Command::Watch { .. } => {
            let exit = commands::watch(ctx, shutdown_signal(), print_track).await?;
            if exit == WatchExit::SessionEnded {
                println!("Session ended. Run `nowplaying login` to log in again.");
            }
        }
        Command::Status => {
            println!("{}", commands::status(ctx).await?);
        }
        Command::Logout => {
            commands::logout(ctx).await?;
            println!("Logged out.");
        }
    }
    Ok(())
}

fn print_track(track: Option<&Track>) {
    match track {
        Some(track) => {
            let marker = if track.is_playing { "▶" } else { "⏸" };
            println!("{marker} {} - {} ({})", track.name, track.artist, track.album);
        }
        None => println!("Nothing playing"),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
