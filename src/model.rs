use std::cmp;
use std::sync::mpsc::Sender;

use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, info, trace};

use crate::client::{PageData, Row};
use crate::dataset::{self, ColumnSpec, DATASETS, DatasetDescriptor};
use crate::domain::{Message, RechnikError, Total, ViewerConfig};
use crate::fetcher::FetchRequest;
use crate::inputter::{InputResult, Inputter};

#[derive(Debug, PartialEq)]
pub enum Status {
    IDLE,
    LOADING,
    LOADED,
    FAILED,
    QUITTING,
}

/// The single page window over the remote table. `filtered` is always
/// derived from `rows` by the current search predicate and `offset` is
/// always a multiple of `page_size`.
pub struct PageState {
    pub offset: usize,
    pub page_size: usize,
    pub rows: Vec<Row>,
    pub filtered: Vec<Row>,
    pub total: Total,
}

impl PageState {
    pub fn empty(page_size: usize) -> Self {
        PageState {
            offset: 0,
            page_size,
            rows: Vec::new(),
            filtered: Vec::new(),
            total: Total::Unknown,
        }
    }

    pub fn page_label(&self) -> usize {
        self.offset / self.page_size + 1
    }

    pub fn can_prev(&self) -> bool {
        self.offset > 0
    }

    pub fn can_next(&self) -> bool {
        match self.total {
            Total::Known(total) => ((self.offset + self.page_size) as u64) < total,
            Total::Unknown => true,
        }
    }

    /// Case-insensitive substring match over the configured columns of the
    /// already-fetched page. Never reorders, only removes; an empty or
    /// whitespace-only query restores the full set.
    pub fn apply_filter(&mut self, query: &str, columns: &[ColumnSpec]) {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            self.filtered = self.rows.clone();
        } else {
            self.filtered = self
                .rows
                .iter()
                .filter(|row| {
                    columns
                        .iter()
                        .any(|col| row.field(col.key).to_lowercase().contains(&query))
                })
                .cloned()
                .collect();
        }
    }

    /// The range end is clamped to the known total, and the start to the
    /// end, so a zero-row table shows "0-0" rather than "1-0".
    pub fn stats_line(&self) -> String {
        match self.total {
            Total::Known(total) => {
                let end = cmp::min((self.offset + self.page_size) as u64, total);
                let start = cmp::min(self.offset as u64 + 1, end);
                format!(
                    "Total entries: {} | Showing {}-{}",
                    group_thousands(total),
                    start,
                    end
                )
            }
            Total::Unknown => format!(
                "Showing entries {}-{}",
                self.offset + 1,
                self.offset + self.page_size
            ),
        }
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Remote cell text is rendered as literal text. Newlines fold into a
/// one-line marker and remaining control characters are dropped, so a
/// hostile cell cannot smuggle escape sequences into the terminal.
pub fn sanitize_cell(value: &str) -> String {
    value
        .replace("\r\n", " ↵ ")
        .replace('\n', " ↵ ")
        .chars()
        .filter(|c| !c.is_control())
        .collect()
}

#[derive(Debug, Clone)]
pub struct DisplayRow {
    pub index: String,
    pub cells: Vec<String>,
}

/// Snapshot of everything the UI draws. Rebuilt by the model after each
/// state change; the UI holds no state of its own.
pub struct UIData {
    pub title: String,
    pub columns: &'static [ColumnSpec],
    pub rows: Vec<DisplayRow>,
    pub empty_message: Option<String>,
    pub stats_text: String,
    pub page_label: String,
    pub prev_enabled: bool,
    pub next_enabled: bool,
    pub loading: bool,
    pub error_message: Option<String>,
    pub search_term: String,
    pub cmdinput: InputResult,
    pub active_cmdinput: bool,
    pub show_help: bool,
    pub selected_row: usize,
}

impl UIData {
    fn empty() -> Self {
        UIData {
            title: String::new(),
            columns: DATASETS[0].columns,
            rows: Vec::new(),
            empty_message: None,
            stats_text: String::new(),
            page_label: String::new(),
            prev_enabled: false,
            next_enabled: false,
            loading: false,
            error_message: None,
            search_term: String::new(),
            cmdinput: InputResult::default(),
            active_cmdinput: false,
            show_help: false,
            selected_row: 0,
        }
    }
}

pub struct Model {
    config: ViewerConfig,
    pub status: Status,
    dataset: &'static DatasetDescriptor,
    page: PageState,
    pending_offset: usize,
    search_term: String,
    error_message: Option<String>,
    stats_failed: bool,
    cursor_row: usize,
    show_help: bool,
    input: Inputter,
    last_input: InputResult,
    active_cmdinput: bool,
    page_seq: u64,
    stats_seq: u64,
    requests: Sender<FetchRequest>,
    uidata: UIData,
}

impl Model {
    pub fn init(
        config: &ViewerConfig,
        dataset_key: &str,
        requests: Sender<FetchRequest>,
    ) -> Result<Self, RechnikError> {
        let dataset = dataset::find(dataset_key)
            .ok_or_else(|| RechnikError::UnknownDataset(dataset_key.to_string()))?;
        let mut model = Self {
            config: config.clone(),
            status: Status::IDLE,
            dataset,
            page: PageState::empty(config.page_size),
            pending_offset: 0,
            search_term: String::new(),
            error_message: None,
            stats_failed: false,
            cursor_row: 0,
            show_help: false,
            input: Inputter::default(),
            last_input: InputResult::default(),
            active_cmdinput: false,
            page_seq: 0,
            stats_seq: 0,
            requests,
            uidata: UIData::empty(),
        };
        model.update_uidata();
        Ok(model)
    }

    pub fn dataset(&self) -> &'static DatasetDescriptor {
        self.dataset
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    /// When the search input is open, keys go to the inputter verbatim.
    pub fn raw_keyevents(&self) -> bool {
        self.active_cmdinput
    }

    /// Initial load: one page fetch plus one stats fetch.
    pub fn start(&mut self) {
        self.fetch_page_at(0);
        self.request_stats();
    }

    pub fn update(&mut self, message: Message) -> Result<(), RechnikError> {
        trace!("Update: {:?} (status {:?})", message, self.status);
        match message {
            Message::Quit => self.status = Status::QUITTING,
            Message::NextPage => self.next_page(),
            Message::PrevPage => self.previous_page(),
            Message::Reload => self.fetch_page_at(self.page.offset),
            Message::CycleDataset => self.cycle_dataset(),
            Message::EnterSearch => self.enter_search(),
            Message::MoveUp => self.move_selection_up(1),
            Message::MoveDown => self.move_selection_down(1),
            Message::MovePageUp => self.move_selection_up(10),
            Message::MovePageDown => self.move_selection_down(10),
            Message::MoveBeginning => self.select_row(0),
            Message::MoveEnd => self.select_row(self.page.filtered.len().saturating_sub(1)),
            Message::Help => {
                self.show_help = true;
                self.update_uidata();
            }
            Message::Exit => self.exit(),
            Message::RawKey(key) => self.raw_input(key),
            Message::PageFetched(seq, result) => self.page_fetched(seq, result),
            Message::StatsFetched(seq, result) => self.stats_fetched(seq, result),
        }
        Ok(())
    }

    // -------------------- Transition handlers ---------------------- //

    fn next_page(&mut self) {
        if self.page.can_next() {
            self.fetch_page_at(self.page.offset + self.page.page_size);
        }
    }

    fn previous_page(&mut self) {
        if self.page.can_prev() {
            self.fetch_page_at(self.page.offset - self.page.page_size);
        }
    }

    /// Enters Loading and asks the worker for the page at `offset`. The
    /// visible page state only changes once the response arrives.
    fn fetch_page_at(&mut self, offset: usize) {
        self.page_seq += 1;
        self.pending_offset = offset;
        self.status = Status::LOADING;
        self.error_message = None;
        let request = FetchRequest::Page {
            seq: self.page_seq,
            dataset: self.dataset(),
            offset,
            length: self.page.page_size,
        };
        if self.requests.send(request).is_err() {
            self.status = Status::FAILED;
            self.error_message =
                Some(format!("Failed to load dictionary: {}", RechnikError::WorkerGone));
        }
        self.update_uidata();
    }

    fn request_stats(&mut self) {
        self.stats_seq += 1;
        let request = FetchRequest::Stats {
            seq: self.stats_seq,
            dataset: self.dataset(),
        };
        if self.requests.send(request).is_err() {
            debug!("Stats request dropped: {}", RechnikError::WorkerGone);
            self.stats_failed = true;
        }
    }

    fn cycle_dataset(&mut self) {
        let idx = DATASETS
            .iter()
            .position(|ds| ds.key == self.dataset.key)
            .unwrap_or(0);
        self.dataset = &DATASETS[(idx + 1) % DATASETS.len()];
        info!("Switched dataset to {}", self.dataset.key);
        self.page = PageState::empty(self.config.page_size);
        self.search_term.clear();
        self.cursor_row = 0;
        self.stats_failed = false;
        self.fetch_page_at(0);
        self.request_stats();
    }

    fn page_fetched(&mut self, seq: u64, result: Result<PageData, RechnikError>) {
        if seq != self.page_seq {
            trace!("Dropping stale page response (seq {seq}, current {})", self.page_seq);
            return;
        }
        match result {
            Ok(page) => {
                self.page.offset = self.pending_offset;
                self.page.rows = page.rows;
                if let Some(total) = page.total {
                    self.page.total = Total::Known(total);
                    self.stats_failed = false;
                }
                // Pagination does not preserve the search term.
                self.search_term.clear();
                self.page.filtered = self.page.rows.clone();
                self.cursor_row = 0;
                self.error_message = None;
                self.status = Status::LOADED;
            }
            Err(e) => {
                // Prior page state stays untouched: stale but consistent.
                self.error_message = Some(format!("Failed to load dictionary: {e}"));
                self.status = Status::FAILED;
            }
        }
        self.update_uidata();
    }

    fn stats_fetched(&mut self, seq: u64, result: Result<Total, RechnikError>) {
        if seq != self.stats_seq {
            trace!("Dropping stale stats response (seq {seq}, current {})", self.stats_seq);
            return;
        }
        match result {
            Ok(total) => {
                self.page.total = total;
                self.stats_failed = false;
            }
            Err(e) => {
                // Non-fatal; the stats line degrades to a placeholder.
                debug!("Stats fetch failed: {e}");
                self.stats_failed = true;
            }
        }
        self.update_uidata();
    }

    fn enter_search(&mut self) {
        self.active_cmdinput = true;
        self.input.clear();
        self.last_input = self.input.get();
        self.update_uidata();
    }

    fn raw_input(&mut self, key: KeyEvent) {
        if !self.active_cmdinput {
            return;
        }
        self.last_input = self.input.read(key);
        if self.last_input.finished {
            self.active_cmdinput = false;
            if !self.last_input.canceled {
                self.search_term = self.last_input.input.clone();
                self.apply_search();
            }
        }
        self.update_uidata();
    }

    fn apply_search(&mut self) {
        let columns = self.dataset.columns;
        self.page.apply_filter(&self.search_term, columns);
        self.cursor_row = 0;
    }

    fn clear_search(&mut self) {
        self.search_term.clear();
        self.apply_search();
        self.update_uidata();
    }

    fn exit(&mut self) {
        if self.show_help {
            self.show_help = false;
            self.update_uidata();
        } else if !self.search_term.is_empty() {
            self.clear_search();
        }
    }

    fn select_row(&mut self, row: usize) {
        self.cursor_row = row;
        self.update_uidata();
    }

    fn move_selection_up(&mut self, size: usize) {
        self.cursor_row = self.cursor_row.saturating_sub(size);
        self.update_uidata();
    }

    fn move_selection_down(&mut self, size: usize) {
        let last = self.page.filtered.len().saturating_sub(1);
        self.cursor_row = cmp::min(self.cursor_row + size, last);
        self.update_uidata();
    }

    // -------------------- UI snapshot ---------------------- //

    fn update_uidata(&mut self) {
        let dataset = self.dataset();
        let filtered_len = self.page.filtered.len();
        self.cursor_row = cmp::min(self.cursor_row, filtered_len.saturating_sub(1));

        // Display index is 1-based from the page offset; filtering removes
        // rows but never reorders, so positions stay monotonic.
        let rows = self
            .page
            .filtered
            .iter()
            .enumerate()
            .map(|(position, row)| DisplayRow {
                index: (self.page.offset + position + 1).to_string(),
                cells: dataset
                    .columns
                    .iter()
                    .map(|col| sanitize_cell(&row.field(col.key)))
                    .collect(),
            })
            .collect();

        let empty_message = if filtered_len == 0 {
            Some("No entries found".to_string())
        } else {
            None
        };

        let stats_text = if self.stats_failed && self.page.total == Total::Unknown {
            "Could not load statistics".to_string()
        } else {
            self.page.stats_line()
        };

        self.uidata = UIData {
            title: dataset.name.to_string(),
            columns: dataset.columns,
            rows,
            empty_message,
            stats_text,
            page_label: format!("Page {}", self.page.page_label()),
            prev_enabled: self.page.can_prev(),
            next_enabled: self.page.can_next(),
            loading: self.status == Status::LOADING,
            error_message: self.error_message.clone(),
            search_term: self.search_term.clone(),
            cmdinput: self.last_input.clone(),
            active_cmdinput: self.active_cmdinput,
            show_help: self.show_help,
            selected_row: self.cursor_row,
        };
    }
}
