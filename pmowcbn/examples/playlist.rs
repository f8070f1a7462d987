//! Example: Print the WCBN playlist
//!
//! Run with: cargo run -p pmowcbn --example playlist
//! Or limit the output: cargo run -p pmowcbn --example playlist -- 10

use pmowcbn::WcbnClient;
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let limit = env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<usize>().ok())
        .unwrap_or(20);

    let client = WcbnClient::new().await?;
    println!("Fetching {}...\n", client.playlist_url());

    let rows = client.playlist_rows().await?;
    let malformed = rows.iter().filter(|row| row.is_err()).count();

    for row in rows.into_iter().flatten().take(limit) {
        println!(
            "{:>8}  {} - {}",
            row.time,
            row.display_artist(),
            row.display_title()
        );
        if !row.album.is_empty() || !row.label.is_empty() {
            println!("          {} [{}]", row.display_album(), row.label);
        }
    }

    if malformed > 0 {
        println!("\n{} malformed row(s) skipped", malformed);
    }

    Ok(())
}
