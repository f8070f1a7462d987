//! WCBN 88.3 FM in the terminal
//!
//! ```text
//! WCBNPlayer now                 # what is on air
//! WCBNPlayer playlist --limit 20 # latest playlist entries
//! WCBNPlayer listen              # follow the stream until Ctrl-C
//! ```

mod listeners;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use listeners::{AlbumArtSaver, SongInfoPrinter};
use pmoconfig::{Config, get_config};
use pmowcbn::{
    NotificationListener, NowPlayingNotification, PlayerSetup, StreamQuality, TickOutcome,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Now playing on WCBN 88.3 FM, Ann Arbor")]
struct Args {
    /// Configuration directory (default: $WCBN_CONFIG, ./.wcbn or ~/.wcbn)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Stream quality: mid, hi or hd
    #[arg(long, short, global = true)]
    quality: Option<StreamQuality>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the song on air
    Now,
    /// Print the station playlist
    Playlist {
        /// Only print the first N rows
        #[arg(long, short)]
        limit: Option<usize>,
    },
    /// Follow the stream metadata until Ctrl-C
    Listen,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(dir) => Arc::new(
            Config::load_config(&dir.to_string_lossy())
                .with_context(|| format!("Failed to load configuration from {}", dir.display()))?,
        ),
        None => get_config(),
    };

    init_tracing(&config);

    let mut setup = PlayerSetup::from_config(Arc::clone(&config)).await?;
    if let Some(quality) = args.quality {
        setup = setup.with_quality(quality);
    }
    info!(config_dir = %config.directory().display(), quality = %setup.quality(), "WCBN player ready");

    match args.command {
        Command::Now => now(&setup).await,
        Command::Playlist { limit } => playlist(&setup, limit).await,
        Command::Listen => listen(&setup, &config).await,
    }
}

/// Console logging; `RUST_LOG` wins over `host.logger.min_level`
fn init_tracing(config: &Config) {
    if !config.get_log_enable_console().unwrap_or(true) {
        return;
    }

    let level = config
        .get_log_min_level()
        .unwrap_or_else(|_| "INFO".to_string())
        .to_lowercase();
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn now(setup: &PlayerSetup) -> Result<()> {
    let cycle = setup.cycle()?;
    let station = setup.station();

    match cycle.tick(None).await {
        TickOutcome::Changed { snapshot, art } => {
            println!("Song:        {}", station.song_name(&snapshot));
            println!("Artist:      {}", station.artist_name(&snapshot));
            println!("Album:       {}", snapshot.album);
            println!("Description: {}", station.description(&snapshot));
            match art.artwork() {
                Some(artwork) => println!("Artwork:     {}", artwork.url),
                None => println!("Artwork:     (station logo)"),
            }
            Ok(())
        }
        _ => bail!("Could not read now-playing metadata from {}", cycle.stream_uri()),
    }
}

async fn playlist(setup: &PlayerSetup, limit: Option<usize>) -> Result<()> {
    let rows = setup.client().playlist_rows().await?;
    let limit = limit.unwrap_or(usize::MAX);

    let mut malformed = 0;
    for row in rows.into_iter().take(limit) {
        match row {
            Ok(row) => println!(
                "{:>8}  {} - {}  [{}, {}]",
                row.time,
                row.display_artist(),
                row.display_title(),
                row.display_album(),
                row.label
            ),
            Err(e) => {
                malformed += 1;
                warn!("{}", e);
            }
        }
    }

    if malformed > 0 {
        warn!("{} malformed playlist row(s) skipped", malformed);
    }
    Ok(())
}

async fn listen(setup: &PlayerSetup, config: &Config) -> Result<()> {
    let art_dir = config.get_managed_dir(&["host", "artwork", "directory"], "artwork")?;
    let (handle, join) = setup.spawn_service()?;

    handle.attach(Arc::new(SongInfoPrinter::new())).await?;
    handle.attach(Arc::new(AlbumArtSaver::new(art_dir))).await?;
    handle
        .attach(Arc::new(NotificationListener::new(Arc::new(
            |n: &NowPlayingNotification| {
                if n.visible {
                    info!(title = %n.title, text = %n.text, sub_text = %n.sub_text, playing = n.playing, "Notification");
                } else {
                    info!("Notification dismissed");
                }
            },
        ))))
        .await?;

    handle.play().await?;
    println!("Press Ctrl+C to stop...");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    handle.stop().await?;
    handle.shutdown().await?;
    join.await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let args = Args::parse_from(["WCBNPlayer", "playlist", "--limit", "5", "-q", "hd"]);
        assert!(matches!(args.command, Command::Playlist { limit: Some(5) }));
        assert_eq!(args.quality, Some(StreamQuality::Hd));

        let args = Args::parse_from(["WCBNPlayer", "--config", "/tmp/wcbn", "now"]);
        assert!(matches!(args.command, Command::Now));
        assert_eq!(args.config, Some(PathBuf::from("/tmp/wcbn")));
    }

    #[test]
    fn test_invalid_quality_is_rejected() {
        assert!(Args::try_parse_from(["WCBNPlayer", "-q", "ultra", "listen"]).is_err());
    }
}
