use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::DEFAULT_BASE_URL;
use crate::domain::{AppError, Route};

pub const DEFAULT_CONFIG_PATH: &str = "~/.config/catalog-admin/config.yml";
pub const DEFAULT_STORAGE_PATH: &str = "~/.config/catalog-admin/storage.json";
pub const DEFAULT_LOG_FILE: &str = "~/.cache/catalog-admin/catalog-admin.log";

#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "catalog-admin",
    version,
    about = "A tui admin client for a remote product catalog.",
    long_about = "Log in against a catalog service and browse its products in a paginated, sortable table.\n\nExamples:\n  catalog-admin\n  catalog-admin -u https://dummyjson.com -p 20\n  catalog-admin --config ~/.config/catalog-admin/config.yml\n\nLogs are written to a file, the terminal belongs to the ui."
)]
pub struct CliArgs {
    #[arg(
        short = 'u',
        long = "base-url",
        value_name = "URL",
        help = "Base url of the catalog service."
    )]
    pub base_url: Option<String>,

    #[arg(
        short = 'p',
        long = "page-size",
        value_name = "ROWS",
        help = "Rows per table page."
    )]
    pub page_size: Option<usize>,

    #[arg(
        short = 't',
        long = "timeout",
        value_name = "SECONDS",
        help = "Per request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "YAML config file (default ~/.config/catalog-admin/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "storage",
        value_name = "FILE",
        help = "File holding the stored session token."
    )]
    pub storage: Option<String>,

    #[arg(long = "log-file", value_name = "FILE", help = "Log file.")]
    pub log_file: Option<String>,

    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        help = "Log filter, RUST_LOG takes precedence."
    )]
    pub log_level: Option<String>,

    #[arg(
        long = "poll",
        value_name = "MS",
        help = "Terminal event poll interval in milliseconds."
    )]
    pub event_poll_time: Option<u64>,

    #[arg(long = "login", help = "Start on the login screen.")]
    pub login: bool,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConfigFile {
    pub base_url: Option<String>,
    pub page_size: Option<usize>,
    pub timeout: Option<u64>,
    pub storage: Option<String>,
    pub log_file: Option<String>,
    pub log_level: Option<String>,
    pub event_poll_time: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Setters)]
#[setters(prefix = "with_")]
pub struct AppConfig {
    pub base_url: String,
    pub page_size: usize,
    pub request_timeout: Duration,
    pub event_poll_time: u64,
    pub storage_path: PathBuf,
    pub log_file: PathBuf,
    pub log_level: String,
    pub start_route: Route,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: 10,
            request_timeout: Duration::from_secs(10),
            event_poll_time: 100,
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            log_level: "info".to_string(),
            start_route: Route::Dashboard,
        }
    }
}

impl AppConfig {
    /// Layer command line over config file over defaults.
    pub fn resolve(args: &CliArgs, file: &ConfigFile) -> Result<Self, AppError> {
        let defaults = Self::default();

        let storage = args
            .storage
            .clone()
            .or_else(|| file.storage.clone())
            .unwrap_or_else(|| DEFAULT_STORAGE_PATH.to_string());
        let log_file = args
            .log_file
            .clone()
            .or_else(|| file.log_file.clone())
            .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());
        let timeout = args
            .timeout
            .or(file.timeout)
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);

        let config = defaults
            .clone()
            .with_base_url(
                args.base_url
                    .clone()
                    .or_else(|| file.base_url.clone())
                    .unwrap_or(defaults.base_url),
            )
            .with_page_size(args.page_size.or(file.page_size).unwrap_or(defaults.page_size))
            .with_request_timeout(timeout)
            .with_event_poll_time(
                args.event_poll_time
                    .or(file.event_poll_time)
                    .unwrap_or(defaults.event_poll_time),
            )
            .with_storage_path(expand_path(&storage)?)
            .with_log_file(expand_path(&log_file)?)
            .with_log_level(
                args.log_level
                    .clone()
                    .or_else(|| file.log_level.clone())
                    .unwrap_or(defaults.log_level),
            )
            .with_start_route(if args.login {
                Route::Login
            } else {
                Route::Dashboard
            });

        config.validate()?;
        debug!("Resolved configuration {:?}", config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.page_size == 0 {
            return Err(AppError::Config("page size must be at least 1".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(AppError::Config("timeout must be at least 1 second".into()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "base url '{}' must start with http:// or https://",
                self.base_url
            )));
        }
        Ok(())
    }
}

/// Expand `~` and environment variables in a path.
pub fn expand_path(path: &str) -> Result<PathBuf, AppError> {
    let expanded = shellexpand::full(path)
        .map_err(|e| AppError::Config(format!("could not expand '{path}': {e}")))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Read the config file. An explicitly given file has to exist, the default
/// one is optional.
pub fn load_config_file(path: Option<&str>) -> Result<ConfigFile, AppError> {
    let explicit = path.is_some();
    let path = expand_path(path.unwrap_or(DEFAULT_CONFIG_PATH))?;
    match fs::read_to_string(&path) {
        Ok(content) => {
            debug!("Reading config file {:?}", path);
            if content.trim().is_empty() {
                return Ok(ConfigFile::default());
            }
            Ok(serde_yaml::from_str(&content)?)
        }
        Err(e) if e.kind() == ErrorKind::NotFound && !explicit => Ok(ConfigFile::default()),
        Err(e) => Err(AppError::Io(e)),
    }
}
