//! Example: Show what WCBN is playing right now
//!
//! Run with: cargo run -p pmowcbn --example live_metadata
//! Or with a specific quality: cargo run -p pmowcbn --example live_metadata -- hd

use pmowcbn::{ItunesClient, Station, StreamQuality, WcbnClient, WcbnStation};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Get quality from command line or use default
    let quality: StreamQuality = match env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => StreamQuality::default(),
    };

    let station = WcbnStation::new();
    println!(
        "Fetching now playing for {} ({})...\n",
        station.name(),
        station.stream_url(quality)
    );

    let client = WcbnClient::new().await?;
    let snapshot = client.now_playing(&station, quality).await?;

    println!("Now playing:");
    println!("  Song: {}", station.song_name(&snapshot));
    println!("  Artist: {}", station.artist_name(&snapshot));
    println!("  Description: {}", station.description(&snapshot));
    if !snapshot.genre.is_empty() {
        println!("  Genre: {}", snapshot.genre);
    }
    if let Some(listeners) = snapshot.listeners {
        println!("  Listeners: {}", listeners);
    }

    // Artwork
    let itunes = ItunesClient::builder()
        .client(client.http_client().clone())
        .build()?;
    let art = pmowcbn::lookup_artwork(&itunes, &snapshot).await;
    match art.artwork() {
        Some(artwork) => println!(
            "\nArtwork: {} ({} bytes, {})",
            artwork.url,
            artwork.bytes.len(),
            artwork.content_type.as_deref().unwrap_or("unknown type")
        ),
        None => println!("\nArtwork: station logo"),
    }

    Ok(())
}
