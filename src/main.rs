// src/main.rs - Replay recorded landmark frames through a gesture session
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use air_guitar::data::EventLog;
use air_guitar::session::{run as run_session, GestureSession};
use air_guitar::{LandmarkFrame, LoggingSink, SessionConfig, TemplateClassifier};

#[derive(Parser, Debug)]
#[command(name = "air_guitar", about = "Play guitar from recorded hand and pose landmarks")]
struct Cli {
    /// JSON-lines file, one `{"left": [...], "right": [...], "pose": [...]}` per frame
    #[arg(long)]
    frames: PathBuf,

    /// Chord templates for the built-in nearest-template classifier
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Session config (defaults to the per-user config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write events.csv and summary.json under this directory
    #[arg(long)]
    export: Option<PathBuf>,

    /// Frame rate of the recording, used for event timestamps
    #[arg(long, default_value_t = 30.0)]
    fps: f64,
}

async fn read_frames(path: PathBuf, tx: mpsc::Sender<LandmarkFrame>) -> Result<()> {
    let file = tokio::fs::File::open(&path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))?;
    let mut lines = BufReader::new(file).lines();
    let mut line_no = 0usize;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let frame = match serde_json::from_str::<LandmarkFrame>(&line) {
            Ok(frame) => frame,
            Err(e) => {
                // A bad frame should not stop the performance; feed an empty one.
                warn!("{}:{}: {}", path.display(), line_no, e);
                LandmarkFrame::default()
            }
        };
        if tx.send(frame).await.is_err() {
            break;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SessionConfig::from_file(path)?,
        None => SessionConfig::load(),
    };

    let classifier = match &cli.templates {
        Some(path) => TemplateClassifier::from_json_file(path)?,
        None => {
            warn!("No templates given, chord gestures will not be recognised");
            TemplateClassifier::new()
        }
    };

    let mut session = GestureSession::new(classifier, LoggingSink, config);
    let mut log = cli.export.as_ref().map(|dir| EventLog::new(dir, None));

    // One frame buffered at most; the reader waits for the session.
    let (frame_tx, frame_rx) = mpsc::channel(1);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let reader = tokio::spawn(read_frames(cli.frames.clone(), frame_tx));
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(());
        }
    });

    let fps = cli.fps.max(1.0);
    let processed = run_session(&mut session, frame_rx, shutdown_rx, |report| {
        if let Some(log) = log.as_mut() {
            let timestamp = report.frame.saturating_sub(1) as f64 / fps;
            log.add_frame(report, timestamp);
        }
    })
    .await;

    reader.abort();
    match reader.await {
        Ok(result) => result?,
        Err(e) if e.is_cancelled() => {}
        Err(e) => return Err(e.into()),
    }

    info!("Processed {} frames", processed);

    if let Some(log) = &log {
        let csv = log.export_csv()?;
        let summary = log.write_summary()?;
        info!("Exported {} events to {}", log.event_count(), csv.display());
        info!("Summary written to {}", summary.display());
    }

    Ok(())
}
