//! REEL CLI
//!
//! Replays a recorded session to a point in time and prints the resulting
//! tree, or summarizes what a recording contains.

#![warn(missing_docs)]
#![warn(clippy::all)]

use clap::{Parser, Subcommand};
use color_eyre::Result;
use indexmap::IndexMap;
use reel_core::SessionTime;
use reel_log::{decode_chunk, load_chunks, FileSource, LoadError, LoadOutcome, Message};
use reel_replay::{Document, ReplayConfig, ReplaySession};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "reel")]
#[command(about = "REEL - session replay engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the page at a point in time
    Replay {
        /// Recording chunks, in order
        #[arg(short, long, required = true, num_args = 1..)]
        log: Vec<String>,
        /// Replay time in milliseconds
        #[arg(long)]
        at: u64,
        /// JSON replay configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Summarize a recording
    Inspect {
        /// Recording chunks, in order
        #[arg(short, long, required = true, num_args = 1..)]
        log: Vec<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Replay {
            log,
            at,
            config,
            json,
        } => replay(&log, SessionTime::from_millis(at), config, json).await,
        Commands::Inspect { log } => {
            let (outcome, summary) = inspect(&log).await?;
            for line in summary.to_lines(&outcome) {
                println!("{line}");
            }
            Ok(())
        }
    }
}

async fn replay(log: &[String], at: SessionTime, config: Option<PathBuf>, json: bool) -> Result<()> {
    let config = match config {
        Some(path) => ReplayConfig::from_json(&tokio::fs::read(path).await?)?,
        None => ReplayConfig::default(),
    };

    let screen = Document::new_shared();
    let mut session = ReplaySession::new(&screen, &config)?;
    let outcome = session.load(&FileSource::new("."), log).await?;
    let report = session.settle(at).await?;
    let snapshot = session.snapshot()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }
    for line in snapshot.to_lines() {
        println!("{line}");
    }
    let stats = session.reconciler().stats();
    println!();
    println!("time:               {}", report.time);
    println!("chunks:             {}{}", outcome.chunks, if outcome.truncated { " (truncated)" } else { "" });
    println!("messages applied:   {}", report.applied);
    println!("scrolls restored:   {}", report.scrolls_restored);
    println!("dropped attributes: {}", stats.dropped_attributes);
    println!("skipped messages:   {}", stats.failures);
    Ok(())
}

/// What a recording contains
#[derive(Debug, Default, PartialEq, Eq)]
struct LogSummary {
    kinds: IndexMap<&'static str, usize>,
    first: Option<SessionTime>,
    last: Option<SessionTime>,
}

impl LogSummary {
    fn add(&mut self, msg: &Message) {
        *self.kinds.entry(msg.kind_name()).or_default() += 1;
        let t = msg.time();
        self.first = Some(self.first.map_or(t, |first| first.min(t)));
        self.last = Some(self.last.map_or(t, |last| last.max(t)));
    }

    fn total(&self) -> usize {
        self.kinds.values().sum()
    }

    fn to_lines(&self, outcome: &LoadOutcome) -> Vec<String> {
        let mut lines = vec![format!(
            "{} messages in {} chunks{}",
            self.total(),
            outcome.chunks,
            if outcome.truncated { " (truncated)" } else { "" }
        )];
        if let (Some(first), Some(last)) = (self.first, self.last) {
            lines.push(format!(
                "span: {first} .. {last} ({}ms)",
                last.saturating_since(first)
            ));
        }
        for (kind, count) in &self.kinds {
            lines.push(format!("  {kind:<24} {count}"));
        }
        lines
    }
}

async fn inspect(log: &[String]) -> Result<(LoadOutcome, LogSummary)> {
    let mut summary = LogSummary::default();
    let outcome = load_chunks(&FileSource::new("."), log, |location, body| {
        let messages = decode_chunk(&body).map_err(|source| LoadError::Decode {
            location: location.to_string(),
            source,
        })?;
        for msg in &messages {
            summary.add(msg);
        }
        Ok(())
    })
    .await?;
    Ok((outcome, summary))
}
