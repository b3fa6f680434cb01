use std::path::PathBuf;
use std::time::Duration;

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use tracing::{debug, info, trace, warn};

use crate::config::AppConfig;
use crate::domain::{AppError, Effect, HELP_TEXT, Message, PromptMode};
use crate::filter::{FilterEntry, FilterState, column_match_count, filtered_indices};
use crate::inputter::{InputResult, Inputter};
use crate::notice::CopiedNotice;
use crate::parser::{ParsedTable, parse};
use crate::ui::{NOTICE_HEIGHT, STATUSLINE_HEIGHT, TABLE_CHROME_HEIGHT, TITLE_HEIGHT, filterbar_height};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Status {
    EMPTY,
    LOADED,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    PROMPT,
    POPUP,
}

#[derive(Default, Clone, Debug, PartialEq)]
pub struct UILayout {
    pub width: usize,
    pub height: usize,
    pub table_height: usize,
}

impl UILayout {
    pub fn from_values(ui_width: usize, ui_height: usize, nfilters: usize) -> Self {
        let chrome = TITLE_HEIGHT
            + filterbar_height(nfilters)
            + TABLE_CHROME_HEIGHT
            + NOTICE_HEIGHT
            + STATUSLINE_HEIGHT;
        let layout = UILayout {
            width: ui_width,
            height: ui_height,
            table_height: ui_height.saturating_sub(chrome).max(1),
        };
        trace!("Build UILayout: {:?}", layout);
        layout
    }
}

/// Snapshot of everything the ui needs for one frame.
#[derive(Default, Clone, Debug)]
pub struct UIData {
    pub loaded: bool,
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>, // Visible rows only, cells in header order
    pub link_column: String,
    pub selected_row: Option<usize>,    // Relative to `rows`
    pub abs_selected_row: usize,
    pub nrows: usize,
    pub total_rows: usize,
    pub filters: Vec<FilterEntry>,
    pub focused_filter: Option<usize>,
    pub url_count: Option<usize>,
    pub show_notice: bool,
    pub prompt: Option<(PromptMode, InputResult)>,
    pub show_popup: bool,
    pub popup_message: String,
    pub status_message: String,
}

pub struct Model {
    config: AppConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    name: String,
    table: Option<ParsedTable>,
    filters: FilterState,
    rows: Vec<usize>, // Indices into table.data that pass all filters
    curser_row: usize,
    offset_row: usize,
    show_counts: bool,
    notice: CopiedNotice,
    input: Inputter,
    prompt_mode: Option<PromptMode>,
    last_input: InputResult,
    uilayout: UILayout,
    status_message: String,
}

impl Model {
    pub fn init(config: &AppConfig, ui_width: usize, ui_height: usize) -> Self {
        let filters = FilterState::new(&config.filter_keys);
        let uilayout = UILayout::from_values(ui_width, ui_height, filters.len());
        let mut model = Self {
            config: config.clone(),
            status: Status::EMPTY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            name: String::new(),
            table: None,
            filters,
            rows: Vec::new(),
            curser_row: 0,
            offset_row: 0,
            show_counts: false,
            notice: CopiedNotice::default(),
            input: Inputter::default(),
            prompt_mode: None,
            last_input: InputResult::default(),
            uilayout,
            status_message: "Enter the path of a csv file".to_string(),
        };
        model.enter_prompt(PromptMode::OpenFile);
        model
    }

    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::PROMPT
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn url_count(&self) -> usize {
        self.table
            .as_ref()
            .map(|t| column_match_count(t, &self.filters, &self.config.link_column))
            .unwrap_or(0)
    }

    pub fn update(&mut self, message: Message) -> Result<Option<Effect>, AppError> {
        trace!("Update: Modus {:?}, Message {:?}", self.modus, message);
        let effect = match message {
            Message::Quit => {
                self.quit();
                None
            }
            Message::Resize(width, height) => {
                self.ui_resize(width, height);
                None
            }
            Message::FileLoaded { name, content } => {
                self.load(name, &content);
                None
            }
            Message::LoadFailed(reason) => {
                warn!("Loading failed: {reason}");
                self.set_status_message(format!("Could not load file: {reason}"));
                None
            }
            Message::SetFilter { key, value } => {
                self.set_filter(&key, value);
                None
            }
            Message::CopySucceeded => {
                let generation = self.notice.show();
                Some(Effect::ArmNoticeTimer {
                    generation,
                    after: Duration::from_millis(self.config.notice_timeout_ms),
                })
            }
            Message::CopyFailed(reason) => {
                warn!("Copy failed: {reason}");
                self.set_status_message(format!("Copy failed: {reason}"));
                None
            }
            Message::OpenLinkFailed(reason) => {
                warn!("Open link failed: {reason}");
                self.set_status_message(format!("Could not open link: {reason}"));
                None
            }
            Message::DismissNotice => {
                self.notice.dismiss();
                None
            }
            Message::NoticeExpired(generation) => {
                if self.notice.expire(generation) {
                    trace!("Notice {generation} expired");
                }
                None
            }
            msg => match self.modus {
                Modus::TABLE => self.update_table(msg),
                Modus::PROMPT => match msg {
                    Message::RawKey(key) => self.raw_input(key),
                    _ => None,
                },
                Modus::POPUP => {
                    if matches!(msg, Message::Exit | Message::Help) {
                        self.close_popup();
                    }
                    None
                }
            },
        };
        Ok(effect)
    }

    fn update_table(&mut self, msg: Message) -> Option<Effect> {
        match msg {
            Message::MoveDown => self.move_selection_down(1),
            Message::MoveUp => self.move_selection_up(1),
            Message::MovePageDown => self.move_selection_down(self.uilayout.table_height),
            Message::MovePageUp => self.move_selection_up(self.uilayout.table_height),
            Message::MoveBeginning => self.move_selection_up(self.rows.len()),
            Message::MoveEnd => self.move_selection_down(self.rows.len()),
            Message::EditFilters => {
                if !self.filters.is_empty() {
                    self.enter_prompt(PromptMode::Filter(0));
                }
            }
            Message::OpenFile => self.enter_prompt(PromptMode::OpenFile),
            Message::CopyUrl => return self.copy_selected_url(),
            Message::OpenLink => return self.open_selected_url(),
            Message::Help => self.show_help(),
            Message::Exit => self.notice.dismiss(),
            _ => (),
        }
        None
    }

    // -------------------- Loading ---------------------- //

    fn load(&mut self, name: String, content: &str) {
        let table = parse(content);
        info!(
            "Loaded {name}: {} columns, {} rows",
            table.headers.len(),
            table.data.len()
        );
        let mut message = format!(
            "Loaded {name}: {} rows, {} columns",
            table.data.len(),
            table.headers.len()
        );
        if !table.has_column(&self.config.link_column) {
            message.push_str(&format!(", no \"{}\" column", self.config.link_column));
        }

        self.table = Some(table);
        self.name = name;
        self.status = Status::LOADED;
        self.show_counts = true;
        self.curser_row = 0;
        self.offset_row = 0;
        if self.modus == Modus::PROMPT && self.prompt_mode == Some(PromptMode::OpenFile) {
            self.leave_prompt();
        }
        self.refilter();
        self.set_status_message(message);
    }

    fn refilter(&mut self) {
        self.rows = match &self.table {
            Some(table) => filtered_indices(table, &self.filters),
            None => Vec::new(),
        };
        self.clamp_selection();
    }

    fn set_filter(&mut self, key: &str, value: String) {
        if self.filters.set(key, value) {
            self.refilter();
        } else {
            debug!("Ignoring filter for unknown key {key}");
        }
    }

    // -------------------- Prompt handling ---------------------- //

    fn enter_prompt(&mut self, mode: PromptMode) {
        trace!("Entering prompt {:?}", mode);
        if self.modus != Modus::PROMPT {
            self.previous_modus = self.modus;
        }
        self.modus = Modus::PROMPT;
        self.prompt_mode = Some(mode);
        match mode {
            PromptMode::OpenFile => self.input.clear(),
            PromptMode::Filter(idx) => {
                let value = self
                    .filters
                    .entries()
                    .get(idx)
                    .map(|e| e.value.clone())
                    .unwrap_or_default();
                self.input.set(&value);
            }
        }
        self.last_input = self.input.get();
    }

    fn leave_prompt(&mut self) {
        self.modus = Modus::TABLE;
        self.previous_modus = Modus::PROMPT;
        self.prompt_mode = None;
        self.input.clear();
        self.last_input = self.input.get();
    }

    fn raw_input(&mut self, key: KeyEvent) -> Option<Effect> {
        match self.prompt_mode {
            Some(PromptMode::Filter(idx)) => {
                self.filter_input(idx, key);
                None
            }
            Some(PromptMode::OpenFile) => self.open_file_input(key),
            None => None,
        }
    }

    fn filter_input(&mut self, idx: usize, key: KeyEvent) {
        let count = self.filters.len();
        match key.code {
            KeyCode::Tab => self.enter_prompt(PromptMode::Filter((idx + 1) % count)),
            KeyCode::BackTab => self.enter_prompt(PromptMode::Filter((idx + count - 1) % count)),
            _ => {
                self.last_input = self.input.read(key);
                if self.last_input.finished {
                    self.leave_prompt();
                    return;
                }
                let Some(filter_key) = self.filters.key_at(idx).map(str::to_string) else {
                    return;
                };
                if self.filters.get(&filter_key) != Some(self.last_input.input.as_str()) {
                    let value = self.last_input.input.clone();
                    self.set_filter(&filter_key, value);
                }
            }
        }
    }

    fn open_file_input(&mut self, key: KeyEvent) -> Option<Effect> {
        self.last_input = self.input.read(key);
        if !self.last_input.finished {
            return None;
        }

        if self.last_input.canceled {
            if self.status == Status::EMPTY {
                self.input.clear();
                self.last_input = self.input.get();
            } else {
                self.leave_prompt();
            }
            return None;
        }

        let path = self.last_input.input.trim().to_string();
        if path.is_empty() {
            self.input.clear();
            self.last_input = self.input.get();
            self.set_status_message("No file given");
            return None;
        }

        info!("Opening {path}");
        if self.status == Status::EMPTY {
            // Keep the prompt around in case the file can not be read
            self.input.set(&path);
            self.last_input = self.input.get();
        } else {
            self.leave_prompt();
        }
        Some(Effect::ReadFile(PathBuf::from(path)))
    }

    // -------------------- Popup ---------------------- //

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
    }

    fn close_popup(&mut self) {
        trace!("Close popup ...");
        self.modus = self.previous_modus;
        self.previous_modus = Modus::POPUP;
    }

    // -------------------- Clipboard ---------------------- //

    /// Link cell of the selected row, exactly as parsed.
    fn selected_link(&mut self) -> Option<String> {
        let link = self.rows.get(self.curser_row).and_then(|&ridx| {
            self.table
                .as_ref()
                .and_then(|t| t.data[ridx].get(&self.config.link_column))
                .map(str::to_string)
        });
        if link.is_none() {
            self.set_status_message(format!(
                "Selected row has no {}",
                self.config.link_column
            ));
        }
        link
    }

    fn copy_selected_url(&mut self) -> Option<Effect> {
        let link = self.selected_link()?;
        trace!("Copy {link}");
        Some(Effect::WriteClipboard(link))
    }

    fn open_selected_url(&mut self) -> Option<Effect> {
        let link = self.selected_link()?;
        if link.is_empty() {
            self.set_status_message("Selected link is empty");
            return None;
        }
        trace!("Open {link}");
        Some(Effect::OpenUrl(link))
    }

    // -------------------- Selection ---------------------- //

    fn move_selection_up(&mut self, size: usize) {
        self.curser_row = self.curser_row.saturating_sub(size);
        self.clamp_selection();
    }

    fn move_selection_down(&mut self, size: usize) {
        self.curser_row = self.curser_row.saturating_add(size);
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let nrows = self.rows.len();
        if nrows == 0 {
            self.curser_row = 0;
            self.offset_row = 0;
            return;
        }
        self.curser_row = self.curser_row.min(nrows - 1);

        let height = self.uilayout.table_height.max(1);
        if self.curser_row < self.offset_row {
            self.offset_row = self.curser_row;
        } else if self.curser_row >= self.offset_row + height {
            self.offset_row = self.curser_row + 1 - height;
        }
        self.offset_row = self.offset_row.min(nrows.saturating_sub(height));
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.uilayout.width, width, self.uilayout.height, height
        );
        self.uilayout = UILayout::from_values(width, height, self.filters.len());
        self.clamp_selection();
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    // -------------------- UI data ---------------------- //

    pub fn uidata(&self) -> UIData {
        let prompt = self.prompt_mode.map(|mode| (mode, self.last_input.clone()));
        let focused_filter = match self.prompt_mode {
            Some(PromptMode::Filter(idx)) => Some(idx),
            _ => None,
        };
        let mut uidata = UIData {
            loaded: self.table.is_some(),
            name: self.name.clone(),
            link_column: self.config.link_column.clone(),
            filters: self.filters.entries().to_vec(),
            focused_filter,
            url_count: self.show_counts.then(|| self.url_count()),
            show_notice: self.notice.is_visible(),
            prompt,
            show_popup: self.modus == Modus::POPUP,
            popup_message: HELP_TEXT.to_string(),
            status_message: self.status_message.clone(),
            ..UIData::default()
        };

        if let Some(table) = &self.table {
            let rend = (self.offset_row + self.uilayout.table_height).min(self.rows.len());
            let rbegin = self.offset_row.min(rend);
            uidata.headers = table.headers.clone();
            uidata.rows = self.rows[rbegin..rend]
                .iter()
                .map(|&ridx| {
                    let row = &table.data[ridx];
                    table
                        .headers
                        .iter()
                        .map(|h| row.get(h).map(str::to_string))
                        .collect()
                })
                .collect();
            uidata.nrows = self.rows.len();
            uidata.total_rows = table.data.len();
            uidata.abs_selected_row = self.curser_row;
            if !self.rows.is_empty() {
                uidata.selected_row = Some(self.curser_row - rbegin);
            }
        }
        uidata
    }
}
