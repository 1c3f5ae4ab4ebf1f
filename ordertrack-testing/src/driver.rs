use std::sync::Arc;

use clap::Parser;
use ordertrack_logic::{
    Coordinate, MapSurface, StateUpdateSender, TrackingSession, TrackingSettings,
};
use ordertrack_test_shared::{FeedScript, ScriptedFeed, prelude::*, sample_script};

#[derive(Parser)]
/// Replays a scripted tracking feed against a live session, printing every
/// draw call and panel change to stdout
struct Cli {
    /// Path to a JSON feed script (see --sample for the format)
    script: Option<String>,

    /// Print a sample feed script and exit
    #[arg(long)]
    sample: bool,
}

/// A map surface that just narrates what a real map would draw
struct PrintSurface;

impl MapSurface for PrintSurface {
    fn set_marker(&self, coordinate: Coordinate) -> Result {
        println!("marker  {:.6},{:.6}", coordinate.lat, coordinate.long);
        Ok(())
    }

    fn set_route(&self, coordinates: &[Coordinate], opacity: f64) -> Result {
        println!("route   {} points @ {opacity:.2}", coordinates.len());
        Ok(())
    }
}

struct PrintSender;

impl StateUpdateSender for PrintSender {
    fn send_update(&self) {
        println!("panel   state changed");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result {
    let cli = Cli::parse();

    if cli.sample {
        println!("{}", serde_json::to_string_pretty(&sample_script())?);
        return Ok(());
    }

    let script: FeedScript = match cli.script {
        Some(path) => {
            let raw = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read script {path}"))?;
            serde_json::from_str(&raw).context("Failed to parse feed script")?
        }
        None => sample_script(),
    };

    let (feed, mut taps) = ScriptedFeed::spawn(script);
    let session = Arc::new(TrackingSession::new(
        TrackingSettings::default(),
        feed,
        PrintSurface,
        PrintSender,
    ));

    let loop_handle = tokio::spawn({
        let session = session.clone();
        async move { session.main_loop().await }
    });

    // Taps come from the script's Toggle steps; apply them like a user would
    while taps.recv().await.is_some() {
        session.toggle_expanded().await;
        if let Some(view) = session.panel_view().await {
            println!("panel   {}", serde_json::to_string(&view)?);
        }
    }

    loop_handle
        .await
        .context("Session task panicked")?
        .context("Session ended with an error")?;

    Ok(())
}
