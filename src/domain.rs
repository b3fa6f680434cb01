use std::fmt;
use std::io::Error;
use std::path::PathBuf;
use std::time::Duration;

use ratatui::crossterm::event::KeyEvent;

#[derive(Debug)]
pub enum AppError {
    IoError(Error),
    ClipboardError(arboard::Error),
    ConfigError(toml::de::Error),
    InvalidFilter(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::IoError(e) => write!(f, "{e}"),
            AppError::ClipboardError(e) => write!(f, "clipboard: {e}"),
            AppError::ConfigError(e) => write!(f, "config: {e}"),
            AppError::InvalidFilter(s) => write!(f, "invalid filter \"{s}\", expected KEY=VALUE"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        AppError::IoError(err)
    }
}

impl From<arboard::Error> for AppError {
    fn from(err: arboard::Error) -> Self {
        AppError::ClipboardError(err)
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::ConfigError(err)
    }
}

/// What the line editor at the bottom of the screen is currently used for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PromptMode {
    OpenFile,
    Filter(usize),
}

/// Everything that can change the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    EditFilters,
    OpenFile,
    CopyUrl,
    OpenLink,
    DismissNotice,
    Help,
    Exit,
    Resize(usize, usize),
    RawKey(KeyEvent),
    SetFilter { key: String, value: String },
    FileLoaded { name: String, content: String },
    LoadFailed(String),
    CopySucceeded,
    CopyFailed(String),
    OpenLinkFailed(String),
    NoticeExpired(u64),
}

/// Side effects requested by the model, carried out by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ReadFile(PathBuf),
    WriteClipboard(String),
    OpenUrl(String),
    ArmNoticeTimer { generation: u64, after: Duration },
}

pub const HELP_TEXT: &str = "\
probeview

  j / Down        next row
  k / Up          previous row
  PageDown/Up     scroll a page
  g / Home        first row
  G / End         last row

  / or Tab        edit filters
  Tab / S-Tab     next / previous filter (while editing)
  Ctrl-U          clear the focused filter
  Enter / Esc     back to the table

  c / y           copy the url of the selected row
  Enter           open the url of the selected row in a browser
  x               dismiss the copied notice
  o               open another file
  ?               this help
  q / Ctrl-C      quit

Esc closes this window.";
