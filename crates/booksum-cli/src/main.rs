//! # booksum
//!
//! Uploads a document to the summarization backend, streams the summary
//! with a live token monitor, and prints the final rendering.

#![deny(unsafe_code)]

mod terminal;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

use booksum_session::{CancelHandle, HttpBackend, Outcome, Session, SessionError};
use booksum_settings::{BooksumSettings, LoggingSettings, load_settings, load_settings_from_path};

use crate::terminal::TerminalObserver;

/// How long to wait for the backend stop request before exiting.
const STOP_REQUEST_WAIT: Duration = Duration::from_secs(2);

/// Exit status after a second Ctrl-C.
const INTERRUPTED_EXIT: i32 = 130;

/// Book summarization client.
#[derive(Parser, Debug)]
#[command(name = "booksum", about = "Upload a document and stream its summary")]
struct Cli {
    /// Backend base URL (overrides settings).
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Settings file (default `~/.booksum/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is unset (overrides settings).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload FILE, summarize it and print the summary. Ctrl-C stops it.
    Summarize {
        /// Document to summarize (.txt, .pdf, .epub by default).
        file: PathBuf,

        /// Save the summary as HTML, into DIR or the configured directory.
        #[arg(long, value_name = "DIR", num_args = 0..=1)]
        export: Option<Option<PathBuf>>,

        /// Leave the document on the backend afterwards.
        #[arg(long)]
        keep: bool,
    },
    /// Remove the current document from the backend.
    Remove,
}

impl Cli {
    /// Level used until the settings are loaded.
    fn bootstrap_log_level(&self) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| LoggingSettings::default().level)
    }

    fn load_settings(&self) -> Result<BooksumSettings> {
        let mut settings = match &self.settings {
            Some(path) => load_settings_from_path(path)
                .with_context(|| format!("Failed to load settings from {}", path.display()))?,
            None => load_settings().context("Failed to load settings")?,
        };
        if let Some(url) = &self.base_url {
            settings.backend.base_url.clone_from(url);
        }
        if let Some(level) = &self.log_level {
            settings.logging.level.clone_from(level);
        }
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let logging = booksum_core::logging::init_subscriber(&cli.bootstrap_log_level());
    let settings = cli.load_settings()?;
    if let Some(logging) = &logging {
        logging.set_level(&settings.logging.level);
    }

    let backend = HttpBackend::new(&settings.backend).context("Failed to build HTTP client")?;
    let mut session = Session::new(Arc::new(backend), &settings);

    match cli.command {
        Command::Summarize { file, export, keep } => {
            let export_dir =
                export.map(|dir| dir.unwrap_or_else(|| PathBuf::from(&settings.export.directory)));
            summarize(&mut session, &file, export_dir.as_deref(), keep).await
        }
        Command::Remove => {
            session
                .remove_document()
                .await
                .context("Failed to remove document")?;
            eprintln!("Document removed.");
            Ok(())
        }
    }
}

async fn summarize(
    session: &mut Session,
    file: &Path,
    export_dir: Option<&Path>,
    keep: bool,
) -> Result<()> {
    let document = session
        .upload_file(file)
        .await
        .with_context(|| format!("Failed to upload {}", file.display()))?;
    eprintln!("Uploaded {} ({} bytes)", document.name, document.size);

    let handle = session.cancel_handle();
    let ctrl_c = tokio::spawn(watch_interrupts(handle.clone()));

    let mut terminal = TerminalObserver::default();
    let result = session.summarize(&mut terminal).await;
    terminal.finish_line();
    let _ = handle.wait_for_stop_request(STOP_REQUEST_WAIT).await;
    let report = result.context("Summarization did not start")?;

    println!("{}", session.state().rendered());
    eprintln!(
        "Summary {}: {} tokens in, {} tokens out",
        report.outcome.as_str(),
        report.tokens.tokens_in,
        report.tokens.tokens_out
    );
    if report.records_rejected > 0 {
        eprintln!("{} malformed records skipped", report.records_rejected);
    }

    if let Some(dir) = export_dir {
        match session.export(dir) {
            Ok(path) => eprintln!("Saved {}", path.display()),
            Err(SessionError::DownloadUnavailable) => {
                eprintln!("Nothing to export: the summary ended with an error.");
            }
            Err(e) => return Err(e).context("Failed to export summary"),
        }
    }

    if !keep {
        if let Err(e) = session.remove_document().await {
            warn!(error = %e, "failed to remove document from backend");
        }
    }

    ctrl_c.abort();
    if report.outcome == Outcome::Errored {
        anyhow::bail!("Summarization failed");
    }
    Ok(())
}

/// First Ctrl-C cancels the running attempt; any later one exits.
async fn watch_interrupts(handle: CancelHandle) {
    while tokio::signal::ctrl_c().await.is_ok() {
        if handle.cancel() {
            eprintln!("\nStopping... (press Ctrl-C again to quit)");
        } else {
            eprintln!("\nInterrupted.");
            std::process::exit(INTERRUPTED_EXIT);
        }
    }
}
