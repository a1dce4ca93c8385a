use std::cmp::min;
use std::mem;

use anyhow::Result;
use crossterm::event::KeyCode;
use open::that as open_link;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use ratatui::Frame;

use crate::catalog::{embed_url, CatalogError, SongCatalog, SortKey};
use crate::models::Song;

use super::forms::{ConfirmSongDelete, SongField, SongForm};
use super::helpers::{
    build_song_card_lines, centered_rect, rating_bar, repeat_pattern_row, surface_error,
    thumbnail_motif,
};

/// Number of song cards shown in each row of the card grid. Three columns keep
/// titles legible on typical terminal widths.
const GRID_COLUMNS: usize = 3;
/// Header space for the title bar with search/sort/view state.
const HEADER_HEIGHT: u16 = 3;
/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Height allocation per card in the card grid, borders included.
const CARD_HEIGHT: u16 = 7;

/// The two interchangeable projections of the catalog.
#[derive(Copy, Clone, PartialEq, Eq)]
enum ViewMode {
    Table,
    Cards,
}

impl ViewMode {
    fn toggle(self) -> Self {
        match self {
            ViewMode::Table => ViewMode::Cards,
            ViewMode::Cards => ViewMode::Table,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ViewMode::Table => "Table",
            ViewMode::Cards => "Cards",
        }
    }
}

/// Fine-grained input modes. Keeping this explicit makes it easy to reason
/// about which rendering path runs and what keyboard shortcuts should do.
enum Mode {
    Normal,
    AddingSong(SongForm),
    EditingSong { id: i64, form: SongForm },
    ConfirmDelete(ConfirmSongDelete),
    Searching,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    catalog: SongCatalog,
    view: ViewMode,
    sort: SortKey,
    search: String,
    selected: usize,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(catalog: SongCatalog) -> Self {
        Self {
            catalog,
            view: ViewMode::Table,
            sort: SortKey::default(),
            search: String::new(),
            selected: 0,
            mode: Mode::Normal,
            status: None,
        }
    }

    /// The current display projection. Owned copies so rendering and key
    /// handling never hold a borrow into the catalog.
    fn visible(&self) -> Vec<Song> {
        self.catalog.query(&self.search, self.sort)
    }

    fn current_song(&self) -> Option<Song> {
        self.visible().into_iter().nth(self.selected)
    }

    /// Dispatch a key press. Returns `true` when the app should exit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::AddingSong(form) => self.handle_add_song(code, form),
            Mode::EditingSong { id, form } => self.handle_edit_song(code, id, form),
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
            Mode::Searching => self.handle_search(code),
        };

        Ok(exit)
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') => {
                *exit = true;
            }
            KeyCode::Esc => {
                // Esc first drops an active filter; a second Esc quits.
                if self.search.is_empty() {
                    *exit = true;
                } else {
                    self.search.clear();
                    self.selected = 0;
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_vertical(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_vertical(1),
            KeyCode::Left | KeyCode::Char('h') => self.move_horizontal(-1),
            KeyCode::Right | KeyCode::Char('l') => self.move_horizontal(1),
            KeyCode::Char('a') => {
                self.clear_status();
                return Mode::AddingSong(SongForm::default());
            }
            KeyCode::Char('e') | KeyCode::Enter => {
                if let Some(song) = self.current_song() {
                    self.clear_status();
                    return Mode::EditingSong {
                        id: song.id,
                        form: SongForm::from_song(&song),
                    };
                }
                self.set_status("No song selected to edit.", StatusKind::Error);
            }
            KeyCode::Char('d') => {
                if let Some(song) = self.current_song() {
                    self.clear_status();
                    return Mode::ConfirmDelete(ConfirmSongDelete::from(&song));
                }
                self.set_status("No song selected to delete.", StatusKind::Error);
            }
            KeyCode::Char('/') | KeyCode::Char('f') => {
                self.clear_status();
                return Mode::Searching;
            }
            KeyCode::Char('s') => {
                self.sort = self.sort.cycle();
                self.selected = 0;
                self.set_status(format!("Sorted by {}.", self.sort.label()), StatusKind::Info);
            }
            KeyCode::Char('v') => {
                self.view = self.view.toggle();
            }
            KeyCode::Char('w') => self.open_watch_page(),
            KeyCode::Char('p') => self.open_player(),
            _ => {}
        }
        Mode::Normal
    }

    fn handle_add_song(&mut self, code: KeyCode, mut form: SongForm) -> Mode {
        match code {
            KeyCode::Esc => Mode::Normal,
            KeyCode::Tab => {
                form.next_field();
                Mode::AddingSong(form)
            }
            KeyCode::Backspace => {
                form.backspace();
                Mode::AddingSong(form)
            }
            KeyCode::Enter => {
                let (title, url, rating) = match form.parse_inputs() {
                    Ok(inputs) => inputs,
                    Err(err) => {
                        form.error = Some(surface_error(&err));
                        return Mode::AddingSong(form);
                    }
                };
                match self.catalog.add(&title, &url, rating) {
                    Ok(song) => {
                        self.select_song(song.id);
                        self.set_status(format!("Added '{}'.", song.title), StatusKind::Info);
                        Mode::Normal
                    }
                    Err(err) => {
                        form.error = Some(err.to_string());
                        Mode::AddingSong(form)
                    }
                }
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
                Mode::AddingSong(form)
            }
            _ => Mode::AddingSong(form),
        }
    }

    fn handle_edit_song(&mut self, code: KeyCode, id: i64, mut form: SongForm) -> Mode {
        match code {
            KeyCode::Esc => Mode::Normal,
            KeyCode::Tab => {
                form.next_field();
                Mode::EditingSong { id, form }
            }
            KeyCode::Backspace => {
                form.backspace();
                Mode::EditingSong { id, form }
            }
            KeyCode::Enter => {
                let (title, url, rating) = match form.parse_inputs() {
                    Ok(inputs) => inputs,
                    Err(err) => {
                        form.error = Some(surface_error(&err));
                        return Mode::EditingSong { id, form };
                    }
                };
                match self.catalog.update(id, &title, &url, rating) {
                    Ok(song) => {
                        self.select_song(song.id);
                        self.set_status(format!("Updated '{}'.", song.title), StatusKind::Info);
                        Mode::Normal
                    }
                    Err(err @ CatalogError::InvalidUrl) => {
                        form.error = Some(err.to_string());
                        Mode::EditingSong { id, form }
                    }
                    Err(err) => {
                        // The song vanished or the store failed; the form
                        // cannot fix either, so surface and leave edit mode.
                        self.set_status(err.to_string(), StatusKind::Error);
                        Mode::Normal
                    }
                }
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
                Mode::EditingSong { id, form }
            }
            _ => Mode::EditingSong { id, form },
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmSongDelete) -> Mode {
        match code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.catalog.remove(confirm.id) {
                    Ok(true) => {
                        self.set_status(format!("Deleted '{}'.", confirm.title), StatusKind::Info);
                    }
                    Ok(false) => {
                        self.set_status("Song was already gone.", StatusKind::Info);
                    }
                    Err(err) => {
                        self.set_status(err.to_string(), StatusKind::Error);
                    }
                }
                self.clamp_selection();
                Mode::Normal
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Mode::Normal,
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    fn handle_search(&mut self, code: KeyCode) -> Mode {
        match code {
            KeyCode::Esc => {
                self.search.clear();
                self.selected = 0;
                Mode::Normal
            }
            KeyCode::Enter => Mode::Normal,
            KeyCode::Backspace => {
                self.search.pop();
                self.selected = 0;
                Mode::Searching
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                self.search.push(ch);
                self.selected = 0;
                Mode::Searching
            }
            _ => Mode::Searching,
        }
    }

    fn open_watch_page(&mut self) {
        let Some(song) = self.current_song() else {
            self.set_status("No song selected to watch.", StatusKind::Error);
            return;
        };
        match open_link(&song.url) {
            Ok(()) => self.set_status(format!("Opened '{}'.", song.title), StatusKind::Info),
            Err(err) => self.set_status(format!("Failed to open link: {err}"), StatusKind::Error),
        }
    }

    fn open_player(&mut self) {
        let Some(song) = self.current_song() else {
            self.set_status("No song selected to play.", StatusKind::Error);
            return;
        };
        let Some(video_id) = song.video_id.as_deref() else {
            self.set_status("This song has no playable video id.", StatusKind::Error);
            return;
        };
        match open_link(&embed_url(video_id)) {
            Ok(()) => self.set_status(format!("Playing '{}'.", song.title), StatusKind::Info),
            Err(err) => {
                self.set_status(format!("Failed to open player: {err}"), StatusKind::Error)
            }
        }
    }

    /// Move the selection onto a specific song within the current projection,
    /// e.g. right after it was added so the user sees where it sorted to.
    fn select_song(&mut self, id: i64) {
        if let Some(position) = self.visible().iter().position(|song| song.id == id) {
            self.selected = position;
        } else {
            self.clamp_selection();
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.visible().len();
        if len == 0 {
            self.selected = 0;
        } else {
            self.selected = min(self.selected, len - 1);
        }
    }

    fn move_vertical(&mut self, delta: isize) {
        let len = self.visible().len();
        if len == 0 {
            return;
        }
        let step = match self.view {
            ViewMode::Table => delta,
            ViewMode::Cards => delta * GRID_COLUMNS as isize,
        };
        let next = self.selected as isize + step;
        if next >= 0 && (next as usize) < len {
            self.selected = next as usize;
        }
    }

    fn move_horizontal(&mut self, delta: isize) {
        // Sideways movement only means something in the card grid.
        if self.view != ViewMode::Cards {
            return;
        }
        let len = self.visible().len();
        if len == 0 {
            return;
        }
        let next = self.selected as isize + delta;
        if next >= 0 && (next as usize) < len {
            self.selected = next as usize;
        }
    }

    fn set_status(&mut self, text: impl Into<String>, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, content_area, footer_area] = Layout::vertical([
            Constraint::Length(HEADER_HEIGHT.min(area.height)),
            Constraint::Min(0),
            Constraint::Length(FOOTER_HEIGHT.min(area.height)),
        ])
        .areas(area);

        self.draw_header(frame, header_area);

        let songs = self.visible();
        match self.view {
            ViewMode::Table => self.draw_song_table(frame, content_area, &songs),
            ViewMode::Cards => self.draw_song_cards(frame, content_area, &songs),
        }

        self.draw_footer(frame, footer_area);

        match &self.mode {
            Mode::AddingSong(form) => self.draw_song_form(frame, area, "Add Song", form),
            Mode::EditingSong { form, .. } => self.draw_song_form(frame, area, "Edit Song", form),
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Searching => self.draw_search_bar(frame, area),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::BOTTOM);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let count = self.catalog.len();
        let noun = if count == 1 { "song" } else { "songs" };
        let title_line = Line::from(vec![
            Span::styled(
                "Song Shelf",
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("  {count} {noun}")),
        ]);

        let mut state_spans = vec![
            Span::raw(format!("Sort: {}   View: {}", self.sort.label(), self.view.label())),
        ];
        if !self.search.is_empty() || matches!(self.mode, Mode::Searching) {
            state_spans.push(Span::styled(
                format!("   Filter: {}", self.search),
                Style::default().fg(Color::Cyan),
            ));
        }

        let paragraph = Paragraph::new(vec![title_line, Line::from(state_spans)]);
        frame.render_widget(paragraph, inner);
    }

    fn draw_song_table(&self, frame: &mut Frame, area: Rect, songs: &[Song]) {
        if songs.is_empty() {
            self.draw_empty_state(frame, area);
            return;
        }

        // One header row plus one line per song; scroll so the selection
        // stays visible.
        let capacity = area.height.saturating_sub(1).max(1) as usize;
        let start = if self.selected >= capacity {
            self.selected + 1 - capacity
        } else {
            0
        };
        let end = min(start + capacity, songs.len());

        let header = Row::new(vec!["Thumb", "Title", "Rating", "Video"]).style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

        let rows: Vec<Row> = songs[start..end]
            .iter()
            .enumerate()
            .map(|(offset, song)| {
                let index = start + offset;
                let motif = song
                    .video_id
                    .as_deref()
                    .map(|video_id| repeat_pattern_row(thumbnail_motif(video_id)[0], 5))
                    .unwrap_or_else(|| "     ".to_string());
                let row = Row::new(vec![
                    Cell::from(Span::styled(motif, Style::default().fg(Color::DarkGray))),
                    Cell::from(song.title.clone()),
                    Cell::from(format!("{} {}", rating_bar(song.rating), song.rating_badge())),
                    Cell::from(song.video_id_label().to_string()),
                ]);
                if index == self.selected {
                    row.style(
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    )
                } else {
                    row
                }
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(5),
                Constraint::Min(20),
                Constraint::Length(17),
                Constraint::Length(14),
            ],
        )
        .header(header)
        .column_spacing(2);

        frame.render_widget(table, area);
    }

    fn draw_song_cards(&self, frame: &mut Frame, area: Rect, songs: &[Song]) {
        if songs.is_empty() {
            self.draw_empty_state(frame, area);
            return;
        }

        let grid_rows = ((area.height / CARD_HEIGHT).max(1)) as usize;
        let total_rows = songs.len().div_ceil(GRID_COLUMNS);
        let selected_row = self.selected / GRID_COLUMNS;

        // Scroll whole rows so the selected card is always on screen.
        let mut first_row = if selected_row >= grid_rows {
            selected_row + 1 - grid_rows
        } else {
            0
        };
        if first_row + grid_rows > total_rows {
            first_row = total_rows.saturating_sub(grid_rows);
        }

        let visible_rows = min(grid_rows, total_rows - first_row);
        let constraints: Vec<Constraint> = (0..visible_rows)
            .map(|_| Constraint::Length(CARD_HEIGHT))
            .collect();
        let row_chunks = Layout::vertical(constraints).split(area);

        for (chunk_idx, row_chunk) in row_chunks.iter().enumerate() {
            let column_constraints: Vec<Constraint> = (0..GRID_COLUMNS)
                .map(|_| Constraint::Ratio(1, GRID_COLUMNS as u32))
                .collect();
            let columns = Layout::horizontal(column_constraints).split(*row_chunk);

            for (col_idx, column_chunk) in columns.iter().enumerate() {
                let song_index = (first_row + chunk_idx) * GRID_COLUMNS + col_idx;
                let Some(song) = songs.get(song_index) else {
                    continue;
                };

                let selected = song_index == self.selected;
                let mut block = Block::default()
                    .borders(Borders::ALL)
                    .title(song.rating_badge());
                if selected {
                    block = block.style(Style::default().fg(Color::Yellow));
                }

                let inner_width = column_chunk.width.saturating_sub(2);
                let inner_height = column_chunk.height.saturating_sub(2);
                let lines = build_song_card_lines(song, inner_width, inner_height, selected);
                let card = Paragraph::new(lines)
                    .alignment(Alignment::Left)
                    .block(block);
                frame.render_widget(card, *column_chunk);
            }
        }
    }

    fn draw_empty_state(&self, frame: &mut Frame, area: Rect) {
        let message = if self.catalog.is_empty() {
            "No songs yet. Press 'a' to add one.".to_string()
        } else {
            format!("No songs match '{}'.", self.search)
        };
        let paragraph = Paragraph::new(message)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::NONE));
        frame.render_widget(paragraph, area);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph =
            Paragraph::new(vec![status_line, self.footer_instructions()]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let pairs: &[(&str, &str)] = match self.mode {
            Mode::AddingSong(_) | Mode::EditingSong { .. } => &[
                ("[Tab]", " Switch   "),
                ("[Enter]", " Save   "),
                ("[Esc]", " Cancel"),
            ],
            Mode::ConfirmDelete(_) => &[("[Y]", " Delete   "), ("[N/Esc]", " Cancel")],
            Mode::Searching => &[
                ("[type]", " Filter   "),
                ("[Enter]", " Keep   "),
                ("[Esc]", " Clear"),
            ],
            Mode::Normal => &[
                ("[a]", " Add   "),
                ("[e]", " Edit   "),
                ("[d]", " Delete   "),
                ("[w]", " Watch   "),
                ("[p]", " Play   "),
                ("[/]", " Search   "),
                ("[s]", " Sort   "),
                ("[v]", " View   "),
                ("[q]", " Quit"),
            ],
        };

        let mut spans = Vec::with_capacity(pairs.len() * 2);
        for (key, action) in pairs {
            spans.push(Span::styled(*key, key_style));
            spans.push(Span::raw(*action));
        }
        Line::from(spans)
    }

    fn draw_song_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &SongForm) {
        let popup_area = centered_rect(70, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![
            form.build_line("Title", SongField::Title),
            form.build_line("URL", SongField::Url),
            form.build_line("Rating", SongField::Rating),
            Line::from(""),
        ];

        if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save, Tab to switch, Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let (prefix, row) = match form.active {
            SongField::Title => ("Title: ", 0u16),
            SongField::Url => ("URL: ", 1),
            SongField::Rating => ("Rating: ", 2),
        };
        let cursor_x = inner.x + prefix.len() as u16 + form.value_len(form.active) as u16;
        frame.set_cursor_position((cursor_x, inner.y + row));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmSongDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Delete Song").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("Delete '{}' permanently?", confirm.title)),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("Title contains: {}", self.search)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x =
            inner.x + "Title contains: ".len() as u16 + self.search.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }
}
