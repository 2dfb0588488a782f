use std::fs::{self, File};
use std::process::ExitCode;
use std::sync::Mutex;

use arboard::Clipboard;
use clap::Parser;
use ratatui::DefaultTerminal;
use tracing::{info, warn};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod catalog;
mod columns;
mod config;
mod controller;
mod detail;
mod domain;
mod inputter;
mod item;
mod login;
mod model;
mod pagination;
mod runtime;
mod session;
mod table;
mod ui;

use catalog::HttpCatalog;
use config::{AppConfig, CliArgs, load_config_file};
use controller::Controller;
use domain::AppError;
use model::{Model, Status};
use runtime::Runtime;
use session::{Session, SessionStore};
use ui::TableUI;

fn main() -> ExitCode {
    match run() {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn run() -> Result<(), AppError> {
    let args = CliArgs::parse();
    let file = load_config_file(args.config.as_deref())?;
    let config = AppConfig::resolve(&args, &file)?;
    init_logging(&config)?;
    info!("Starting catalog-admin against {}", config.base_url);

    let tokio = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let catalog = HttpCatalog::new(&config.base_url, config.request_timeout)?;
    let store = SessionStore::new(config.storage_path.clone());
    let session = match store.load() {
        Ok(session) => session,
        Err(e) => {
            warn!("Ignoring unreadable session storage {:?}: {e}", store.path());
            Session::anonymous()
        }
    };
    let clipboard = match Clipboard::new() {
        Ok(clipboard) => Some(clipboard),
        Err(e) => {
            warn!("Clipboard not available: {e}");
            None
        }
    };
    let mut runtime = Runtime::new(catalog, store, clipboard, tokio.handle().clone());

    let mut terminal = ratatui::init();
    let result = ui_loop(&mut terminal, &config, session, &mut runtime);
    ratatui::restore();
    info!("Stopped catalog-admin");
    result
}

fn ui_loop(
    terminal: &mut DefaultTerminal,
    config: &AppConfig,
    session: Session,
    runtime: &mut Runtime<HttpCatalog>,
) -> Result<(), AppError> {
    let size = terminal.size()?;
    let (mut model, commands) = Model::init(
        config,
        session,
        config.start_route,
        size.width as usize,
        size.height as usize,
    );
    runtime.execute(commands);

    let ui = TableUI::new(config);
    let controller = Controller::new(config);

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        // Handle events and map to a Message
        if let Some(message) = controller.handle_event(&model)? {
            let commands = model.update(Some(message));
            runtime.execute(commands);
        }

        // Results of finished fetches
        while let Some(message) = runtime.try_next() {
            let commands = model.update(Some(message));
            runtime.execute(commands);
        }
    }
    Ok(())
}

/// Log into a file, the terminal is owned by the ui.
fn init_logging(config: &AppConfig) -> Result<(), AppError> {
    if let Some(dir) = config.log_file.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir)?;
    }
    let file = File::create(&config.log_file)?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| AppError::Config(format!("invalid log level '{}': {e}", config.log_level)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .with(ErrorLayer::default())
        .init();
    Ok(())
}
