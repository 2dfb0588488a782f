use std::io::Error;

use ratatui::crossterm::event::KeyEvent;
use thiserror::Error;

use crate::catalog::{Credentials, FetchError};
use crate::detail::DetailRequest;
use crate::item::Item;
use crate::session::Session;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("io error: {0}")]
    Io(#[from] Error),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("could not parse config file: {0}")]
    ConfigFormat(#[from] serde_yaml::Error),
    #[error("could not read or write local storage: {0}")]
    Storage(#[from] serde_json::Error),
    #[error("could not build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("loading products failed: {0}")]
    CollectionFetch(#[source] FetchError),
    #[error("loading product {id} failed: {source}")]
    DetailFetch {
        id: u64,
        #[source]
        source: FetchError,
    },
    #[error("login failed: {0}")]
    Login(#[source] FetchError),
}

/// Client side routes. The path strings are the navigation boundary of the
/// application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/",
            Route::Dashboard => "/dashboard",
        }
    }
}

#[derive(Debug)]
pub enum Message {
    Quit,
    Resize(usize, usize),
    RawKey(KeyEvent),
    LoginFinished(Result<String, FetchError>),
    Logout,
    ProductsLoaded {
        mount: u64,
        result: Result<Vec<Item>, FetchError>,
    },
    DetailLoaded {
        mount: u64,
        request: DetailRequest,
        result: Result<Item, FetchError>,
    },
    Retry,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    LargerPages,
    SmallerPages,
    SortAscending,
    SortDescending,
    ClearSort,
    Activate,
    ViewDetails(u64),
    CopyRow,
    Help,
    Exit,
}

/// Side effects requested by `Model::update`, executed by the runtime.
#[derive(Debug, PartialEq)]
pub enum Command {
    Login(Credentials),
    FetchProducts { mount: u64 },
    FetchProduct { mount: u64, request: DetailRequest },
    PersistSession(Session),
    ClearSession,
    CopyToClipboard(String),
}

pub const HELP_TEXT: &str = r#"
Dashboard
  ↑ ↓ / k j      select row
  ← → / h l      select column
  n / PgDn       next page
  p / PgUp       previous page
  g / Home       first page
  G / End        last page
  + / -          larger / smaller pages
  Enter / v      view reviews of selected product
  s / S          sort column ascending / descending
  c              clear sort
  y              copy selected row
  r              retry loading products
  L              logout
  ?              this help
  Esc            close dialog
  q              quit

Login
  Tab / ↓        next field
  Shift-Tab / ↑  previous field
  Enter          next field / submit
  Esc            clear form
  Ctrl-c         quit
"#;
