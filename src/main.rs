use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc;

use clap::Parser;
use tracing::info;

mod client;
mod controller;
mod dataset;
mod domain;
mod fetcher;
mod inputter;
mod model;
mod ui;

use client::{DictClient, HUGGINGFACE_API_BASE, Source};
use controller::Controller;
use domain::{RechnikError, ViewerConfig};
use model::{Model, Status};
use ui::TableUI;

/// Terminal pager for remote dictionary datasets.
#[derive(Parser, Debug)]
#[command(name = "rechnik", version, about)]
struct Args {
    /// Dataset to open (alpaca, bogko)
    #[arg(short, long, default_value = "alpaca")]
    dataset: String,

    /// Base url of the dataset server (direct mode)
    #[arg(long, default_value = HUGGINGFACE_API_BASE)]
    remote: String,

    /// Base url of a same-origin proxy, e.g. http://localhost:3000
    #[arg(long, conflicts_with = "remote")]
    proxy: Option<String>,

    /// Append tracing output to this file (filtered by RUST_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    match run() {
        Err(e) => {
            ratatui::restore();
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
        Ok(_) => {
            ratatui::restore();
            ExitCode::SUCCESS
        }
    }
}

fn run() -> Result<(), RechnikError> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let source = match &args.proxy {
        Some(base) => Source::Proxy {
            base: base.trim_end_matches('/').to_string(),
        },
        None => Source::Direct {
            base: args.remote.trim_end_matches('/').to_string(),
        },
    };
    info!("Starting rechnik against {source:?}");

    let (request_tx, request_rx) = mpsc::channel();
    let (outcome_tx, outcome_rx) = mpsc::channel();
    fetcher::spawn(DictClient::new(source), request_rx, outcome_tx)?;

    let cfg = ViewerConfig::default();
    let mut model = Model::init(&cfg, &args.dataset, request_tx)?;
    let ui = TableUI::new();
    let controller = Controller::new(&cfg, outcome_rx);

    let mut terminal = ratatui::init();
    model.start();

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(model.get_uidata(), f))?;

        // Handle events and map to a Message
        if let Some(message) = controller.handle_event(&model)? {
            model.update(message)?;
        }

        // Drain fetch outcomes that arrived while we were drawing
        while let Some(message) = controller.poll_outcome() {
            model.update(message)?;
        }
    }

    Ok(())
}

fn init_logging(log_file: Option<&Path>) -> Result<(), RechnikError> {
    let Some(path) = log_file else {
        return Ok(());
    };
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
