use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;
mod controller;
mod domain;
mod filter;
mod inputter;
mod model;
mod notice;
mod parser;
mod ui;

use config::AppConfig;
use controller::{Controller, SystemClipboard};
use domain::{AppError, Message};
use model::{Model, Status};
use ui::TableUI;

/// Filterable terminal viewer for csv files of url probe results.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// File to open on start
    file: Option<PathBuf>,

    /// Config file, defaults to ~/.config/probeview/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write logs to this file, filtered by RUST_LOG
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Column rendered as links, copied and counted
    #[arg(long)]
    link_column: Option<String>,

    /// Milliseconds the copied notice stays visible
    #[arg(long)]
    notice_ms: Option<u64>,

    /// Preset a column filter, e.g. --filter status_code=200
    #[arg(short, long = "filter", value_name = "KEY=VALUE", value_parser = parse_filter)]
    filters: Vec<(String, String)>,
}

fn parse_filter(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| AppError::InvalidFilter(s.to_string()).to_string())
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = init_tracing(args.log_file.as_ref()) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let result = run(args);
    ratatui::restore();
    match result {
        Err(e) => {
            error!("Exiting with error: {e:?}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn init_tracing(log_file: Option<&PathBuf>) -> Result<(), AppError> {
    // The terminal belongs to the ui, so logs only go to a file
    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(shellexpand::tilde(&path.to_string_lossy()).into_owned())?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(file_layer)
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn run(args: Args) -> Result<(), AppError> {
    let mut cfg = AppConfig::load(args.config.as_deref())?;
    if let Some(column) = args.link_column {
        cfg = cfg.link_column(column);
    }
    if let Some(ms) = args.notice_ms {
        cfg = cfg.notice_timeout_ms(ms);
    }
    info!("Starting probeview with {:?}", cfg);

    let mut controller = Controller::new(&cfg, Box::new(SystemClipboard::default()));
    let mut terminal = ratatui::init();
    let size = terminal.size()?;
    let mut model = Model::init(&cfg, size.width as usize, size.height as usize);

    let mut pending: Vec<Message> = args
        .filters
        .into_iter()
        .map(|(key, value)| Message::SetFilter { key, value })
        .collect();
    if let Some(path) = args.file
        && let Some(message) = controller.perform(domain::Effect::ReadFile(path))
    {
        pending.push(message);
    }
    for message in pending {
        dispatch(&mut model, &mut controller, message)?;
    }

    let ui = TableUI::new();
    while model.status != Status::QUITTING {
        terminal.draw(|f| ui.draw(&model, f))?;

        if let Some(message) = controller.handle_event(&model)? {
            dispatch(&mut model, &mut controller, message)?;
        };
    }

    Ok(())
}

/// Feed a message to the model and run the effects it asks for until no
/// further messages result.
fn dispatch(model: &mut Model, controller: &mut Controller, message: Message) -> Result<(), AppError> {
    let mut next = Some(message);
    while let Some(message) = next.take() {
        if let Some(effect) = model.update(message)? {
            next = controller.perform(effect);
        }
    }
    Ok(())
}
