use std::fmt;
use std::io::Error as IoError;

use ratatui::crossterm::event::KeyEvent;

use crate::client::PageData;

/// Rows requested per page, fixed by the remote pagination contract.
pub const PAGE_SIZE: usize = 100;

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub event_poll_time: u64,
    pub page_size: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            event_poll_time: 100,
            page_size: PAGE_SIZE,
        }
    }
}

/// Reported total row count of the remote table. Advisory only: Unknown
/// means "more pages always available", never an arithmetic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Total {
    Known(u64),
    Unknown,
}

#[derive(Debug)]
pub enum RechnikError {
    IoError(IoError),
    Transport(String),
    HttpStatus(u16, String),
    Malformed(String),
    UnknownDataset(String),
    WorkerGone,
}

impl fmt::Display for RechnikError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RechnikError::IoError(e) => write!(f, "io error: {e}"),
            RechnikError::Transport(msg) => write!(f, "network error: {msg}"),
            RechnikError::HttpStatus(code, text) => {
                write!(f, "remote returned HTTP {code} {text}")
            }
            RechnikError::Malformed(msg) => write!(f, "unexpected response: {msg}"),
            RechnikError::UnknownDataset(key) => write!(f, "unknown dataset \"{key}\""),
            RechnikError::WorkerGone => write!(f, "fetch worker is gone"),
        }
    }
}

impl From<IoError> for RechnikError {
    fn from(err: IoError) -> Self {
        RechnikError::IoError(err)
    }
}

impl From<ureq::Error> for RechnikError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, response) => {
                RechnikError::HttpStatus(code, response.status_text().to_string())
            }
            ureq::Error::Transport(t) => RechnikError::Transport(t.to_string()),
        }
    }
}

/// Everything the model reacts to: key-driven commands from the controller
/// and fetch outcomes from the worker. Fetch outcomes carry the generation
/// number of the request they answer.
#[derive(Debug)]
pub enum Message {
    Quit,
    NextPage,
    PrevPage,
    Reload,
    CycleDataset,
    EnterSearch,
    MoveUp,
    MoveDown,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    Help,
    Exit,
    RawKey(KeyEvent),
    PageFetched(u64, Result<PageData, RechnikError>),
    StatsFetched(u64, Result<Total, RechnikError>),
}

pub const HELP_TEXT: &str = "\
 rechnik keys

 Left/p   previous page
 Right/n  next page
 Up/Down  move selection (also k/j)
 PgUp/PgDn, g/G   jump within the page
 /        filter the loaded page
 Esc      clear filter / close popup
 d        switch dataset
 r        reload current page
 ?        this help
 q        quit
";
