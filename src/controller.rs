use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use arboard::Clipboard;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use tracing::{error, info, instrument, trace, warn};

use crate::config::AppConfig;
use crate::domain::{AppError, Effect, Message};
use crate::model::Model;

/// Destination for copied text.
pub trait ClipboardSink {
    fn set_text(&mut self, text: String) -> Result<(), AppError>;
}

/// System clipboard, opened on first use so a missing display only fails copies.
#[derive(Default)]
pub struct SystemClipboard {
    clipboard: Option<Clipboard>,
}

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: String) -> Result<(), AppError> {
        let clipboard = match self.clipboard.take() {
            Some(clipboard) => clipboard,
            None => Clipboard::new()?,
        };
        self.clipboard.insert(clipboard).set_text(text)?;
        Ok(())
    }
}

pub struct Controller {
    event_poll_time: u64,
    clipboard: Box<dyn ClipboardSink>,
    open_link: fn(&str) -> io::Result<()>,
    notice_deadline: Option<(Instant, u64)>,
}

impl Controller {
    pub fn new(cfg: &AppConfig, clipboard: Box<dyn ClipboardSink>) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
            clipboard,
            open_link: webbrowser::open,
            notice_deadline: None,
        }
    }

    pub fn handle_event(&mut self, model: &Model) -> Result<Option<Message>, AppError> {
        if let Some(message) = self.poll_timer(Instant::now()) {
            return Ok(Some(message));
        }

        if event::poll(Duration::from_millis(self.event_poll_time))? {
            match event::read()? {
                // Crossterm also emits release and repeat events on Windows
                Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                    return Ok(self.handle_key(key, model.raw_keyevents()));
                }
                Event::Resize(width, height) => {
                    return Ok(Some(Message::Resize(width as usize, height as usize)));
                }
                _ => {}
            }
        }
        Ok(None)
    }

    /// Returns the expiry message once the armed notice timer is due.
    pub fn poll_timer(&mut self, now: Instant) -> Option<Message> {
        match self.notice_deadline {
            Some((deadline, generation)) if now >= deadline => {
                self.notice_deadline = None;
                Some(Message::NoticeExpired(generation))
            }
            _ => None,
        }
    }

    pub fn handle_key(&self, key: KeyEvent, raw: bool) -> Option<Message> {
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            _ if raw => Some(Message::RawKey(key)),
            (KeyCode::Char('q'), _) => Some(Message::Quit),
            (KeyCode::Char('j') | KeyCode::Down, _) => Some(Message::MoveDown),
            (KeyCode::Char('k') | KeyCode::Up, _) => Some(Message::MoveUp),
            (KeyCode::PageDown, _) => Some(Message::MovePageDown),
            (KeyCode::PageUp, _) => Some(Message::MovePageUp),
            (KeyCode::Char('g') | KeyCode::Home, _) => Some(Message::MoveBeginning),
            (KeyCode::Char('G') | KeyCode::End, _) => Some(Message::MoveEnd),
            (KeyCode::Char('/') | KeyCode::Tab, _) => Some(Message::EditFilters),
            (KeyCode::Char('c') | KeyCode::Char('y'), _) => Some(Message::CopyUrl),
            (KeyCode::Enter, _) => Some(Message::OpenLink),
            (KeyCode::Char('x'), _) => Some(Message::DismissNotice),
            (KeyCode::Char('o'), _) => Some(Message::OpenFile),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            (KeyCode::Esc, _) => Some(Message::Exit),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }

    /// Carry out an effect requested by the model. Results that the model
    /// needs to know about come back as a message.
    pub fn perform(&mut self, effect: Effect) -> Option<Message> {
        trace!("Perform {effect:?}");
        match effect {
            Effect::ReadFile(path) => Some(Self::read_file(&expand_path(&path))),
            Effect::WriteClipboard(text) => match self.clipboard.set_text(text) {
                Ok(_) => {
                    trace!("Copied cell content to clipboard.");
                    Some(Message::CopySucceeded)
                }
                Err(e) => {
                    error!("Error copying to clipboard: {:?}", e);
                    Some(Message::CopyFailed(e.to_string()))
                }
            },
            Effect::OpenUrl(url) => match (self.open_link)(&url) {
                Ok(_) => {
                    info!("Opened {url}");
                    None
                }
                Err(e) => {
                    error!("Error opening {url}: {:?}", e);
                    Some(Message::OpenLinkFailed(e.to_string()))
                }
            },
            Effect::ArmNoticeTimer { generation, after } => {
                self.notice_deadline = Some((Instant::now() + after, generation));
                None
            }
        }
    }

    #[instrument]
    fn read_file(path: &Path) -> Message {
        match fs::read(path) {
            Ok(bytes) => {
                let name = path
                    .file_name()
                    .and_then(|s| s.to_str())
                    .unwrap_or("???")
                    .to_string();
                info!("Read {} bytes", bytes.len());
                Message::FileLoaded {
                    name,
                    content: String::from_utf8_lossy(&bytes).into_owned(),
                }
            }
            Err(e) => {
                warn!("Could not read file: {e}");
                Message::LoadFailed(format!("{}: {e}", path.display()))
            }
        }
    }
}

/// Expand a leading `~` and environment variables, leaving the path as is if
/// a variable is undefined.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.into_owned()),
        Err(e) => {
            trace!("Could not expand {raw}: {e}");
            PathBuf::from(shellexpand::tilde(&raw).into_owned())
        }
    }
}
