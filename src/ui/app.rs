use std::mem;

use anyhow::Result;
use crossterm::event::{KeyCode, MouseButton, MouseEvent, MouseEventKind};
use log::{debug, info};
use open::that as open_link;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::config::{AppConfig, MIN_ROW_HEIGHT};
use crate::drag::{DragController, DragEvent, Reorder, VerticalSpan};
use crate::models::{ItemId, ItemPayload, ProgramItem, SongRef};
use crate::program::ProgramSequence;
use crate::ui_state::{DetailTab, ItemUiPatch, UiStateStore};

use super::forms::{
    ConfirmItemDelete, ElementField, ElementForm, HeaderField, HeaderForm, NoteForm,
};
use super::helpers::{
    centered_rect, format_minutes, pointer_y, surface_error, vertical_span,
};
use super::rows::{resolved_arrangement, resolved_key, row_paragraph, RowFlags};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Title bar above the program list.
const TITLE_HEIGHT: u16 = 1;

/// Fine-grained modes layered over the program list.
enum Mode {
    Normal,
    /// Keyboard drag in progress; arrows nudge, Enter drops.
    Moving,
    AddingHeader(HeaderForm),
    AddingElement(ElementForm),
    EditingNote(NoteForm),
    ConfirmDelete(ConfirmItemDelete),
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

/// Where a row landed during the last draw. Pointer events are resolved
/// against this.
#[derive(Debug, Clone, Copy)]
struct RowLayout {
    id: ItemId,
    /// Position in the displayed (possibly drag-previewed) order.
    index: usize,
    area: Rect,
    /// Full extent of the row, even when the draw had to clip it.
    span: VerticalSpan,
}

/// The program editor: owns the running order, the per-item view state and
/// the drag controller, and applies reorders the controller hands back.
pub struct App {
    config: AppConfig,
    title: String,
    program: ProgramSequence,
    ui_state: UiStateStore,
    drag: DragController,
    library: Vec<SongRef>,
    next_song: usize,
    selected: Option<ItemId>,
    scroll: usize,
    mode: Mode,
    status: Option<StatusMessage>,
    rows: Vec<RowLayout>,
}

impl App {
    pub fn new(
        config: AppConfig,
        title: impl Into<String>,
        program: ProgramSequence,
        library: Vec<SongRef>,
    ) -> Self {
        let ui_state = UiStateStore::with_defaults(config.item_defaults());
        let selected = program.item_at(0).map(ProgramItem::id);
        Self {
            config,
            title: title.into(),
            program,
            ui_state,
            drag: DragController::new(),
            library,
            next_song: 0,
            selected,
            scroll: 0,
            mode: Mode::Normal,
            status: None,
            rows: Vec::new(),
        }
    }

    pub fn program(&self) -> &ProgramSequence {
        &self.program
    }

    pub fn ui_state(&self) -> &UiStateStore {
        &self.ui_state
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn selected_id(&self) -> Option<ItemId> {
        self.selected
    }

    pub fn mouse_capture(&self) -> bool {
        self.config.mouse_capture
    }

    /// Process one key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::Moving => self.handle_moving_key(code),
            Mode::AddingHeader(form) => self.handle_add_header(code, form),
            Mode::AddingElement(form) => self.handle_add_element(code, form),
            Mode::EditingNote(form) => self.handle_edit_note(code, form),
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
        };

        // No drag outlives a switch into a modal.
        if self.in_modal() && self.drag.is_dragging() {
            debug!("modal opened mid-drag");
            self.dispatch(DragEvent::Cancel);
        }

        Ok(exit)
    }

    /// Pointer-driven drags. Press picks a row up, motion hovers, release
    /// drops; the reorder (if any) is applied on release.
    pub fn handle_mouse(&mut self, event: MouseEvent) -> Result<()> {
        if self.in_modal() {
            if matches!(event.kind, MouseEventKind::Up(_)) && self.drag.is_dragging() {
                self.dispatch(DragEvent::Cancel);
            }
            return Ok(());
        }
        if matches!(self.mode, Mode::Moving) {
            return Ok(());
        }
        let hit = self.row_at(event.column, event.row);

        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(row) = hit {
                    self.selected = Some(row.id);
                    self.dispatch(DragEvent::Start {
                        id: row.id,
                        index: row.index,
                    });
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(row) = hit {
                    self.dispatch(DragEvent::Hover {
                        target: row.id,
                        index: row.index,
                        pointer_y: pointer_y(event.row),
                        bounds: Some(row.span),
                    });
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let target = hit.map(|row| row.id);
                self.dispatch(DragEvent::Drop { target });
            }
            // The wheel carries a drag past the rows on screen.
            MouseEventKind::ScrollUp if self.drag.is_dragging() => {
                self.dispatch(DragEvent::Nudge(-1))
            }
            MouseEventKind::ScrollDown if self.drag.is_dragging() => {
                self.dispatch(DragEvent::Nudge(1))
            }
            MouseEventKind::ScrollUp => self.move_selection(-1),
            MouseEventKind::ScrollDown => self.move_selection(1),
            _ => {}
        }
        Ok(())
    }

    /// Pointer capture was lost (focus change, terminal resize).
    pub fn handle_focus_lost(&mut self) {
        if self.drag.is_dragging() {
            debug!("focus lost mid-drag");
            self.dispatch(DragEvent::Cancel);
            if matches!(self.mode, Mode::Moving) {
                self.mode = Mode::Normal;
            }
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Esc if self.drag.is_dragging() => {
                self.dispatch(DragEvent::Cancel);
                self.set_status("Move cancelled.", StatusKind::Info);
            }
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-5),
            KeyCode::PageDown => self.move_selection(5),
            KeyCode::Home => self.selected = self.program.item_at(0).map(ProgramItem::id),
            KeyCode::End => {
                self.selected = self
                    .program
                    .len()
                    .checked_sub(1)
                    .and_then(|last| self.program.item_at(last))
                    .map(ProgramItem::id);
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_expanded(),
            KeyCode::Tab => self.cycle_tab(),
            KeyCode::Char('m') => return Ok(self.pick_up_selected()),
            KeyCode::Char('a') => self.cycle_arrangement(),
            KeyCode::Char('k') => self.cycle_key(),
            KeyCode::Char('v') => self.toggle_files_view(),
            KeyCode::Char('t') => self.cycle_note_type(),
            KeyCode::Char('n') => return Ok(self.open_note_editor()),
            KeyCode::Char('h') => {
                self.clear_status();
                return Ok(Mode::AddingHeader(HeaderForm::default()));
            }
            KeyCode::Char('e') => {
                self.clear_status();
                return Ok(Mode::AddingElement(ElementForm::default()));
            }
            KeyCode::Char('s') => self.add_next_library_song(),
            KeyCode::Char('d') => {
                if let Some(item) = self.selected_item() {
                    return Ok(Mode::ConfirmDelete(ConfirmItemDelete::from(item)));
                }
                self.set_status("No item selected.", StatusKind::Error);
            }
            KeyCode::Char('o') => self.open_selected_link()?,
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_moving_key(&mut self, code: KeyCode) -> Mode {
        match code {
            KeyCode::Up => self.dispatch(DragEvent::Nudge(-1)),
            KeyCode::Down => self.dispatch(DragEvent::Nudge(1)),
            KeyCode::PageUp => self.dispatch(DragEvent::Nudge(-5)),
            KeyCode::PageDown => self.dispatch(DragEvent::Nudge(5)),
            KeyCode::Enter | KeyCode::Char('m') => {
                let target = self.drag.session().map(|session| session.dragged_id());
                self.dispatch(DragEvent::Drop { target });
            }
            KeyCode::Esc => {
                self.dispatch(DragEvent::Cancel);
                self.set_status("Move cancelled.", StatusKind::Info);
            }
            _ => {}
        }

        if self.drag.is_dragging() {
            Mode::Moving
        } else {
            Mode::Normal
        }
    }

    fn handle_add_header(&mut self, code: KeyCode, mut form: HeaderForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Header not added.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::BackTab => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match form.parse_inputs() {
                Ok(payload) => {
                    self.insert_after_selection(payload);
                    self.set_status("Header added.", StatusKind::Info);
                    return Mode::Normal;
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::AddingHeader(form)
    }

    fn handle_add_element(&mut self, code: KeyCode, mut form: ElementForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Element not added.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match form.parse_inputs() {
                Ok(payload) => {
                    self.insert_after_selection(payload);
                    self.set_status("Element added.", StatusKind::Info);
                    return Mode::Normal;
                }
                Err(err) => {
                    let message = surface_error(&err);
                    form.error = Some(message.clone());
                    self.set_status(message, StatusKind::Error);
                }
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::AddingElement(form)
    }

    fn handle_edit_note(&mut self, code: KeyCode, mut form: NoteForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.ui_state
                    .set(form.id, ItemUiPatch::default().adding_note_type(None));
                self.set_status("Note discarded.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter => {
                let mut notes = self.ui_state.get(form.id).notes_by_type;
                let text = form.text.trim().to_string();
                if text.is_empty() {
                    notes.remove(&form.note_type);
                } else {
                    notes.insert(form.note_type.clone(), text);
                }
                self.ui_state.set(
                    form.id,
                    ItemUiPatch::default()
                        .notes_by_type(notes)
                        .adding_note_type(None),
                );
                self.set_status(format!("{} note saved.", form.note_type), StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Backspace => {
                form.backspace();
                Mode::EditingNote(form)
            }
            KeyCode::Char(ch) => {
                form.push_char(ch);
                Mode::EditingNote(form)
            }
            _ => Mode::EditingNote(form),
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmItemDelete) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.delete_item(confirm.id);
                Mode::Normal
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    /// Run `event` through the drag controller and apply whatever it commits.
    fn dispatch(&mut self, event: DragEvent) {
        if let Some(reorder) = self.drag.handle(event, &self.program) {
            self.on_reorder(reorder);
        }
    }

    /// Apply a committed move. View state is keyed by id, so nothing else
    /// needs to move with the item.
    fn on_reorder(&mut self, reorder: Reorder) {
        match self.program.move_range(reorder.from, reorder.to) {
            Ok(true) => {
                self.selected = Some(reorder.id);
                let title = self
                    .program
                    .get(reorder.id)
                    .map(|item| item.title().to_string())
                    .unwrap_or_default();
                self.set_status(
                    format!("Moved {title} to position {}.", reorder.to + 1),
                    StatusKind::Info,
                );
            }
            Ok(false) => {}
            Err(err) => self.set_status(err.to_string(), StatusKind::Error),
        }
    }

    fn pick_up_selected(&mut self) -> Mode {
        let Some(id) = self.selected else {
            self.set_status("No item selected.", StatusKind::Error);
            return Mode::Normal;
        };
        let index = self.program.position_of(id).unwrap_or_default();
        self.dispatch(DragEvent::Start { id, index });
        if self.drag.is_dragging() {
            self.set_status("Moving: ↑↓ to place, Enter to drop.", StatusKind::Info);
            Mode::Moving
        } else {
            Mode::Normal
        }
    }

    fn delete_item(&mut self, id: ItemId) {
        let index = self.program.position_of(id);
        match self.program.remove_by_id(id) {
            Ok(item) => {
                self.ui_state.remove(id);
                self.ui_state.prune(self.program.ids());
                if self.selected == Some(id) {
                    self.selected = index
                        .map(|i| i.min(self.program.len().saturating_sub(1)))
                        .and_then(|i| self.program.item_at(i))
                        .map(ProgramItem::id);
                }
                info!("deleted {item}");
                self.set_status(format!("Removed {}.", item.title()), StatusKind::Info);
            }
            Err(err) => self.set_status(err.to_string(), StatusKind::Error),
        }
    }

    fn insert_after_selection(&mut self, payload: ItemPayload) {
        let index = self
            .selected
            .and_then(|id| self.program.position_of(id))
            .map(|i| i + 1)
            .unwrap_or(self.program.len());
        match self.program.insert(ProgramItem::new(payload), index) {
            Ok(id) => self.selected = Some(id),
            Err(err) => self.set_status(err.to_string(), StatusKind::Error),
        }
    }

    fn add_next_library_song(&mut self) {
        if self.library.is_empty() {
            self.set_status("The song library is empty.", StatusKind::Error);
            return;
        }
        let song = self.library[self.next_song % self.library.len()].clone();
        self.next_song += 1;
        let title = song.title.clone();
        self.insert_after_selection(ItemPayload::Song(song));
        self.set_status(format!("Added {title}."), StatusKind::Info);
    }

    fn selected_item(&self) -> Option<&ProgramItem> {
        self.selected.and_then(|id| self.program.get(id))
    }

    fn move_selection(&mut self, offset: isize) {
        if self.program.is_empty() {
            self.selected = None;
            return;
        }
        let current = self
            .selected
            .and_then(|id| self.program.position_of(id))
            .unwrap_or(0) as isize;
        let max = self.program.len() as isize - 1;
        let next = (current + offset).clamp(0, max) as usize;
        self.selected = self.program.item_at(next).map(ProgramItem::id);
    }

    fn toggle_expanded(&mut self) {
        let Some(id) = self.selected else {
            return;
        };
        let expanded = self.ui_state.get(id).expanded;
        self.ui_state
            .set(id, ItemUiPatch::default().expanded(!expanded));
    }

    fn cycle_tab(&mut self) {
        let Some(item) = self.selected_item() else {
            return;
        };
        let (id, kind) = (item.id(), item.kind());
        let state = self.ui_state.get(id);
        let next = if state.expanded {
            state.tab_for(kind).next_for(kind)
        } else {
            state.tab_for(kind)
        };
        self.ui_state.set(
            id,
            ItemUiPatch::default().expanded(true).active_tab(next),
        );
    }

    /// The selected song and its view state, when the song's `tab` is showing.
    fn selected_song_on(&self, tab: DetailTab) -> Option<(ItemId, &SongRef)> {
        let item = self.selected_item()?;
        let ItemPayload::Song(song) = item.payload() else {
            return None;
        };
        let state = self.ui_state.get(item.id());
        (state.expanded && state.tab_for(item.kind()) == tab).then_some((item.id(), song))
    }

    fn cycle_arrangement(&mut self) {
        let Some((id, song)) = self.selected_song_on(DetailTab::Arrangement) else {
            return;
        };
        let state = self.ui_state.get(id);
        let Some(current) = resolved_arrangement(song, &state) else {
            return;
        };
        let position = song
            .arrangements
            .iter()
            .position(|arr| arr.name == current.name)
            .unwrap_or(0);
        let next = &song.arrangements[(position + 1) % song.arrangements.len()];
        let patch = ItemUiPatch::default()
            .selected_arrangement(next.name.clone())
            .selected_key(next.keys.first().cloned().unwrap_or_default());
        self.ui_state.set(id, patch);
    }

    fn cycle_key(&mut self) {
        let Some((id, song)) = self.selected_song_on(DetailTab::Arrangement) else {
            return;
        };
        let state = self.ui_state.get(id);
        let Some(arrangement) = resolved_arrangement(song, &state) else {
            return;
        };
        if arrangement.keys.is_empty() {
            return;
        }
        let current = resolved_key(arrangement, &state);
        let position = arrangement
            .keys
            .iter()
            .position(|key| Some(key.as_str()) == current)
            .unwrap_or(0);
        let next = arrangement.keys[(position + 1) % arrangement.keys.len()].clone();
        let patch = ItemUiPatch::default()
            .selected_arrangement(arrangement.name.clone())
            .selected_key(next);
        self.ui_state.set(id, patch);
    }

    fn toggle_files_view(&mut self) {
        let Some((id, _)) = self.selected_song_on(DetailTab::Files) else {
            return;
        };
        let view = self.ui_state.get(id).files_view.toggled();
        self.ui_state.set(id, ItemUiPatch::default().files_view(view));
    }

    fn notes_showing(&self) -> Option<ItemId> {
        let item = self.selected_item()?;
        let state = self.ui_state.get(item.id());
        (state.expanded && state.tab_for(item.kind()) == DetailTab::Notes).then_some(item.id())
    }

    fn cycle_note_type(&mut self) {
        let Some(id) = self.notes_showing() else {
            return;
        };
        let types = &self.config.note_types;
        if types.is_empty() {
            return;
        }
        let current = self.ui_state.get(id).active_note_type;
        let position = types.iter().position(|t| *t == current);
        let next = match position {
            Some(i) => types[(i + 1) % types.len()].clone(),
            None => types[0].clone(),
        };
        self.ui_state
            .set(id, ItemUiPatch::default().active_note_type(next));
    }

    fn open_note_editor(&mut self) -> Mode {
        let Some(id) = self.notes_showing() else {
            self.set_status("Open the Notes tab to add a note.", StatusKind::Error);
            return Mode::Normal;
        };
        let state = self.ui_state.get(id);
        let note_type = state.active_note_type.clone();
        self.ui_state.set(
            id,
            ItemUiPatch::default().adding_note_type(Some(note_type.clone())),
        );
        let existing = state.notes_by_type.get(&note_type);
        Mode::EditingNote(NoteForm::new(id, note_type, existing))
    }

    fn open_selected_link(&mut self) -> Result<()> {
        let link = match self.selected_item().map(ProgramItem::payload) {
            Some(ItemPayload::Song(song)) => song.link.trim().to_string(),
            _ => {
                self.set_status("Only songs have links.", StatusKind::Error);
                return Ok(());
            }
        };
        if link.is_empty() {
            self.set_status("This song has no link.", StatusKind::Error);
            return Ok(());
        }
        match open_link(&link) {
            Ok(()) => self.set_status(format!("Opened {link}"), StatusKind::Info),
            Err(err) => self.set_status(
                format!("Could not open link: {err}"),
                StatusKind::Error,
            ),
        }
        Ok(())
    }

    fn row_at(&self, column: u16, row: u16) -> Option<RowLayout> {
        self.rows
            .iter()
            .copied()
            .find(|layout| layout.area.contains((column, row).into()))
    }

    fn row_height(&self, id: ItemId) -> u16 {
        let height = if self.ui_state.get(id).expanded {
            self.config.expanded_row_height
        } else {
            self.config.collapsed_row_height
        };
        height.max(MIN_ROW_HEIGHT)
    }

    fn in_modal(&self) -> bool {
        !matches!(self.mode, Mode::Normal | Mode::Moving)
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(TITLE_HEIGHT.min(area.height)),
                Constraint::Min(0),
                Constraint::Length(footer_height),
            ])
            .split(area);

        self.draw_title(frame, chunks[0]);
        self.draw_program(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::AddingHeader(form) => draw_header_form(frame, area, form),
            Mode::AddingElement(form) => draw_element_form(frame, area, form),
            Mode::EditingNote(form) => draw_note_form(frame, area, form),
            Mode::ConfirmDelete(confirm) => draw_confirm_delete(frame, area, confirm),
            Mode::Normal | Mode::Moving => {}
        }
    }

    fn draw_title(&self, frame: &mut Frame, area: Rect) {
        let summary = format!(
            "  {} items · {}",
            self.program.len(),
            format_minutes(self.program.total_duration_minutes())
        );
        let mut spans = vec![
            Span::styled(
                self.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(summary, Style::default().fg(Color::Gray)),
        ];
        if let Some(session) = self.drag.session() {
            spans.push(Span::styled(
                format!(
                    "  moving {} → {}",
                    session.source_index() + 1,
                    session.current_hover_index() + 1
                ),
                Style::default().fg(Color::Cyan),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_program(&mut self, frame: &mut Frame, area: Rect) {
        self.rows.clear();

        if self.program.is_empty() {
            draw_empty_placeholder(frame, area);
            return;
        }

        // While dragging, show the order the drop would produce.
        let order: Vec<&ProgramItem> = match self.drag.session() {
            Some(session) => {
                let from = self
                    .program
                    .position_of(session.dragged_id())
                    .unwrap_or(session.source_index());
                self.program
                    .previewed_move(from, session.current_hover_index())
            }
            None => self.program.iter().collect(),
        };

        let focus = match self.drag.session() {
            Some(session) => session.current_hover_index(),
            None => self
                .selected
                .and_then(|id| order.iter().position(|item| item.id() == id))
                .unwrap_or(0),
        };
        let heights: Vec<u16> = order.iter().map(|item| self.row_height(item.id())).collect();
        let start = scroll_start(self.scroll, focus, &heights, area.height);

        let mut layouts = Vec::new();
        let mut y = area.y;
        let bottom = area.y.saturating_add(area.height);
        for (index, item) in order.iter().enumerate().skip(start) {
            // Rows are drawn whole; only a first row taller than the list
            // gets clipped.
            let full = heights[index];
            if y >= bottom || (index > start && full > bottom - y) {
                break;
            }
            let height = full.min(bottom - y);
            let row_area = Rect::new(area.x, y, area.width, height);
            let state = self.ui_state.get(item.id());
            let flags = RowFlags {
                selected: self.selected == Some(item.id()),
                dragged: self.drag.is_dragging_item(item.id()),
            };
            frame.render_widget(
                row_paragraph(item, &state, flags, &self.config.note_types),
                row_area,
            );
            layouts.push(RowLayout {
                id: item.id(),
                index,
                area: row_area,
                span: vertical_span(Rect::new(area.x, y, area.width, full)),
            });
            y += height;
        }

        self.scroll = start;
        self.rows = layouts;
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

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let pairs: &[(&str, &str)] = match &self.mode {
            Mode::Moving => &[
                ("[↑↓]", " Move   "),
                ("[Enter]", " Drop   "),
                ("[Esc]", " Cancel"),
            ],
            Mode::AddingHeader(_) | Mode::AddingElement(_) | Mode::EditingNote(_) => &[
                ("[Tab]", " Next field   "),
                ("[Enter]", " Save   "),
                ("[Esc]", " Cancel"),
            ],
            Mode::ConfirmDelete(_) => &[("[Y]", " Delete   "), ("[N]", " Keep")],
            Mode::Normal if self.drag.is_dragging() => &[
                ("[Drag]", " Reorder   "),
                ("[Release]", " Drop   "),
                ("[Esc]", " Cancel"),
            ],
            Mode::Normal => &[
                ("[↑↓]", " Select   "),
                ("[Space]", " Expand   "),
                ("[Tab]", " Tab   "),
                ("[m]", " Move   "),
                ("[h/e/s]", " Add header/element/song   "),
                ("[d]", " Delete   "),
                ("[q]", " Quit"),
            ],
        };
        let spans: Vec<Span<'static>> = pairs
            .iter()
            .flat_map(|(key, label)| {
                [
                    Span::styled(key.to_string(), key_style),
                    Span::raw(label.to_string()),
                ]
            })
            .collect();
        Line::from(spans)
    }
}

/// First row to draw so that `focus` stays on screen, moving as little as
/// possible from `current`.
fn scroll_start(current: usize, focus: usize, heights: &[u16], available: u16) -> usize {
    if heights.is_empty() {
        return 0;
    }
    let focus = focus.min(heights.len() - 1);
    let mut start = current.min(focus);
    loop {
        let used: u32 = heights[start..=focus].iter().map(|h| u32::from(*h)).sum();
        if used <= u32::from(available) || start == focus {
            break;
        }
        start += 1;
    }
    start
}

fn draw_empty_placeholder(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "This program is empty.",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Press h to add a header, e for an element, or s for a song.",
            Style::default().fg(Color::Gray),
        )),
    ];
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn form_hint(error: &Option<String>) -> Line<'static> {
    match error {
        Some(error) => Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(Span::styled(
            "Enter to save • Tab to switch • Esc to cancel",
            Style::default().fg(Color::Gray),
        )),
    }
}

fn draw_header_form(frame: &mut Frame, area: Rect, form: &HeaderForm) {
    let popup_area = centered_rect(60, 40, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default().title("Add Header").borders(Borders::ALL);
    frame.render_widget(block.clone(), popup_area);
    let inner = block.inner(popup_area);

    let lines = vec![
        form.build_line("Title", HeaderField::Title),
        form.build_line("Color", HeaderField::Color),
        Line::from(""),
        form_hint(&form.error),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

    let (prefix, value_len, row) = match form.active {
        HeaderField::Title => ("Title: ", form.value_len(HeaderField::Title), 0),
        HeaderField::Color => ("Color: ", form.value_len(HeaderField::Color), 1),
    };
    frame.set_cursor_position((
        inner.x + prefix.len() as u16 + value_len as u16,
        inner.y + row,
    ));
}

fn draw_element_form(frame: &mut Frame, area: Rect, form: &ElementForm) {
    let popup_area = centered_rect(70, 50, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default().title("Add Element").borders(Borders::ALL);
    frame.render_widget(block.clone(), popup_area);
    let inner = block.inner(popup_area);

    let mut lines: Vec<Line> = ElementField::ALL
        .iter()
        .map(|field| form.build_line(*field))
        .collect();
    lines.push(Line::from(""));
    lines.push(form_hint(&form.error));
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

    let row = ElementField::ALL
        .iter()
        .position(|field| *field == form.active)
        .unwrap_or(0) as u16;
    let prefix = form.active.label().len() as u16 + 2;
    frame.set_cursor_position((
        inner.x + prefix + form.value_len(form.active) as u16,
        inner.y + row,
    ));
}

fn draw_note_form(frame: &mut Frame, area: Rect, form: &NoteForm) {
    let popup_area = centered_rect(70, 30, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(format!("{} note", form.note_type))
        .borders(Borders::ALL);
    frame.render_widget(block.clone(), popup_area);
    let inner = block.inner(popup_area);

    let lines = vec![
        Line::from(form.text.clone()),
        Line::from(""),
        Line::from(Span::styled(
            "Enter to save • empty to clear • Esc to discard",
            Style::default().fg(Color::Gray),
        )),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
    frame.set_cursor_position((inner.x + form.text.chars().count() as u16, inner.y));
}

fn draw_confirm_delete(frame: &mut Frame, area: Rect, confirm: &ConfirmItemDelete) {
    let popup_area = centered_rect(60, 30, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title("Confirm Removal")
        .borders(Borders::ALL);
    frame.render_widget(block.clone(), popup_area);
    let inner = block.inner(popup_area);

    let lines = vec![
        Line::from(format!("Remove {} from the program?", confirm.label)),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use crate::models::{element, header, HeaderColor};

    fn app_with(titles: &[&str]) -> App {
        let program = ProgramSequence::from_items(
            titles
                .iter()
                .map(|title| ProgramItem::new(element(title, "", "", 5))),
        );
        App::new(AppConfig::default(), "Test Service", program, Vec::new())
    }

    fn draw(app: &mut App, terminal: &mut Terminal<TestBackend>) -> String {
        terminal.draw(|frame| app.draw(frame)).expect("draw");
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn terminal() -> Terminal<TestBackend> {
        Terminal::new(TestBackend::new(80, 30)).expect("test terminal")
    }

    fn mouse(kind: MouseEventKind, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column: 10,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn titles(app: &App) -> Vec<String> {
        app.program()
            .iter()
            .map(|item| item.title().to_string())
            .collect()
    }

    #[test]
    fn empty_program_shows_placeholder() {
        let mut app = app_with(&[]);
        let screen = draw(&mut app, &mut terminal());
        assert!(screen.contains("This program is empty."));
    }

    #[test]
    fn rows_render_per_kind() {
        let program = ProgramSequence::from_items([
            ProgramItem::new(header("Worship", HeaderColor::Blue)),
            ProgramItem::new(element("Sermon", "", "10:20", 30)),
        ]);
        let mut app = App::new(AppConfig::default(), "Sunday", program, Vec::new());
        let screen = draw(&mut app, &mut terminal());
        assert!(screen.contains("WORSHIP"));
        assert!(screen.contains("10:20"));
        assert!(screen.contains("30 min"));
    }

    #[test]
    fn mouse_drag_reorders_on_release_only() {
        let mut app = app_with(&["a", "b", "c"]);
        let mut term = terminal();
        // Title bar takes row 0; rows are 3 lines tall: a=1..3, b=4..6, c=7..9.
        draw(&mut app, &mut term);

        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 2))
            .expect("press");
        draw(&mut app, &mut term);
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 5))
            .expect("drag above midpoint");
        assert_eq!(
            app.drag().session().map(|s| s.current_hover_index()),
            Some(0)
        );
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 6))
            .expect("drag past midpoint");
        assert_eq!(
            app.drag().session().map(|s| s.current_hover_index()),
            Some(1)
        );
        assert_eq!(titles(&app), ["a", "b", "c"]);

        draw(&mut app, &mut term);
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 6))
            .expect("release");
        assert_eq!(titles(&app), ["b", "a", "c"]);
        assert!(!app.drag().is_dragging());
    }

    #[test]
    fn release_outside_the_list_cancels() {
        let mut app = app_with(&["a", "b"]);
        let mut term = terminal();
        draw(&mut app, &mut term);

        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 2))
            .expect("press");
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 6))
            .expect("drag");
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 28))
            .expect("release on footer");
        assert_eq!(titles(&app), ["a", "b"]);
        assert!(!app.drag().is_dragging());
    }

    #[test]
    fn opening_a_form_cancels_a_pointer_drag() {
        let mut app = app_with(&["a", "b", "c"]);
        let mut term = terminal();
        draw(&mut app, &mut term);

        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 2))
            .expect("press");
        draw(&mut app, &mut term);
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 6))
            .expect("drag past midpoint");
        assert!(app.drag().is_dragging());

        app.handle_key(KeyCode::Char('h')).expect("open header form");
        assert!(!app.drag().is_dragging());
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 6))
            .expect("release behind the form");
        app.handle_key(KeyCode::Esc).expect("close form");

        draw(&mut app, &mut term);
        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 8))
            .expect("click c");
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 8))
            .expect("release on c");
        assert_eq!(titles(&app), ["a", "b", "c"]);
        assert!(!app.drag().is_dragging());
    }

    #[test]
    fn losing_focus_cancels_a_pointer_drag() {
        let mut app = app_with(&["a", "b", "c"]);
        let mut term = terminal();
        draw(&mut app, &mut term);

        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 2))
            .expect("press");
        draw(&mut app, &mut term);
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 6))
            .expect("drag past midpoint");
        app.handle_focus_lost();

        assert!(app.drag().session().is_none());
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 6))
            .expect("late release");
        assert_eq!(titles(&app), ["a", "b", "c"]);
    }

    #[test]
    fn losing_focus_ends_a_keyboard_move() {
        let mut app = app_with(&["a", "b"]);
        app.handle_key(KeyCode::Char('m')).expect("pick up");
        app.handle_key(KeyCode::Down).expect("nudge");
        app.handle_focus_lost();
        app.handle_key(KeyCode::Enter).expect("toggle expand");
        assert_eq!(titles(&app), ["a", "b"]);
        assert!(!app.drag().is_dragging());
    }

    #[test]
    fn one_line_rows_still_reorder() {
        let config = AppConfig {
            collapsed_row_height: 1,
            ..AppConfig::default()
        };
        let program = ProgramSequence::from_items(
            ["a", "b", "c"]
                .iter()
                .map(|title| ProgramItem::new(element(title, "", "", 5))),
        );
        let mut app = App::new(config, "Test Service", program, Vec::new());
        let mut term = terminal();
        draw(&mut app, &mut term);
        assert!(app.rows.iter().all(|row| row.area.height == MIN_ROW_HEIGHT));

        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 2))
            .expect("press");
        app.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 6))
            .expect("drag past midpoint");
        draw(&mut app, &mut term);
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 6))
            .expect("release");
        assert_eq!(titles(&app), ["b", "a", "c"]);
    }

    #[test]
    fn rows_that_do_not_fit_are_not_drawn_clipped() {
        let names: Vec<String> = (0..9).map(|i| i.to_string()).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut app = app_with(&names);
        draw(&mut app, &mut terminal());

        // 26 list lines hold eight 3-line rows; the ninth is left off.
        assert_eq!(app.rows.len(), 8);
        for row in &app.rows {
            assert_eq!(row.area.height, 3);
            assert_eq!(row.span.height, 3.0);
        }
    }

    #[test]
    fn wheel_carries_a_drag_past_the_visible_rows() {
        let names: Vec<String> = (0..9).map(|i| i.to_string()).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let mut app = app_with(&names);
        let mut term = terminal();
        draw(&mut app, &mut term);

        app.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 2))
            .expect("press");
        for _ in 0..8 {
            app.handle_mouse(mouse(MouseEventKind::ScrollDown, 2))
                .expect("wheel");
        }
        assert_eq!(
            app.drag().session().map(|s| s.current_hover_index()),
            Some(8)
        );
        draw(&mut app, &mut term);
        app.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 2))
            .expect("release");
        assert_eq!(
            titles(&app),
            ["1", "2", "3", "4", "5", "6", "7", "8", "0"]
        );
    }

    #[test]
    fn oversized_element_is_refused_by_the_form() {
        let mut app = app_with(&["a"]);
        app.handle_key(KeyCode::Char('e')).expect("open element form");
        app.handle_key(KeyCode::Char('x')).expect("title");
        for _ in 0..3 {
            app.handle_key(KeyCode::Tab).expect("next field");
        }
        for ch in "4000000000".chars() {
            app.handle_key(KeyCode::Char(ch)).expect("minutes");
        }
        app.handle_key(KeyCode::Enter).expect("save");
        assert_eq!(titles(&app), ["a"]);
        app.handle_key(KeyCode::Esc).expect("close form");
        draw(&mut app, &mut terminal());
    }

    #[test]
    fn keyboard_move_drops_at_hover_index() {
        let mut app = app_with(&["a", "b", "c"]);
        app.handle_key(KeyCode::Char('m')).expect("pick up");
        app.handle_key(KeyCode::Down).expect("nudge");
        app.handle_key(KeyCode::Down).expect("nudge");
        assert_eq!(titles(&app), ["a", "b", "c"]);
        app.handle_key(KeyCode::Enter).expect("drop");
        assert_eq!(titles(&app), ["b", "c", "a"]);
        assert_eq!(
            app.selected_id(),
            app.program().item_at(2).map(ProgramItem::id)
        );
    }

    #[test]
    fn keyboard_move_can_be_cancelled() {
        let mut app = app_with(&["a", "b"]);
        app.handle_key(KeyCode::Char('m')).expect("pick up");
        app.handle_key(KeyCode::Down).expect("nudge");
        app.handle_key(KeyCode::Esc).expect("cancel");
        assert_eq!(titles(&app), ["a", "b"]);
        assert!(!app.drag().is_dragging());
    }

    #[test]
    fn expanded_state_follows_the_item() {
        let mut app = app_with(&["a", "b", "c"]);
        let id = app.selected_id().expect("first row selected");
        app.handle_key(KeyCode::Char(' ')).expect("expand");
        app.handle_key(KeyCode::Char('m')).expect("pick up");
        app.handle_key(KeyCode::Down).expect("nudge");
        app.handle_key(KeyCode::Enter).expect("drop");

        assert_eq!(app.program().position_of(id), Some(1));
        assert!(app.ui_state().get(id).expanded);
        let neighbour = app.program().item_at(0).map(ProgramItem::id).expect("row");
        assert!(!app.ui_state().get(neighbour).expanded);
    }

    #[test]
    fn delete_drops_item_and_its_state() {
        let mut app = app_with(&["a", "b"]);
        let id = app.selected_id().expect("selected");
        app.handle_key(KeyCode::Char(' ')).expect("expand");
        assert!(app.ui_state().contains(id));

        app.handle_key(KeyCode::Char('d')).expect("ask");
        app.handle_key(KeyCode::Char('y')).expect("confirm");
        assert_eq!(titles(&app), ["b"]);
        assert!(!app.ui_state().contains(id));
        assert_eq!(app.selected_id(), app.program().item_at(0).map(ProgramItem::id));
    }

    #[test]
    fn header_form_inserts_after_selection() {
        let mut app = app_with(&["a", "b"]);
        app.handle_key(KeyCode::Char('h')).expect("open form");
        for ch in "Word".chars() {
            app.handle_key(KeyCode::Char(ch)).expect("type");
        }
        app.handle_key(KeyCode::Enter).expect("save");
        assert_eq!(titles(&app), ["a", "Word", "b"]);
    }

    #[test]
    fn tab_expands_then_cycles_within_kind() {
        let mut app = app_with(&["a"]);
        let id = app.selected_id().expect("selected");
        app.handle_key(KeyCode::Tab).expect("expand");
        assert_eq!(app.ui_state().get(id).active_tab, DetailTab::Info);
        app.handle_key(KeyCode::Tab).expect("next tab");
        assert_eq!(app.ui_state().get(id).active_tab, DetailTab::Notes);
        app.handle_key(KeyCode::Tab).expect("wrap");
        assert_eq!(app.ui_state().get(id).active_tab, DetailTab::Info);
    }

    #[test]
    fn notes_are_saved_per_type() {
        let mut app = app_with(&["a"]);
        let id = app.selected_id().expect("selected");
        app.handle_key(KeyCode::Tab).expect("expand");
        app.handle_key(KeyCode::Tab).expect("notes tab");
        app.handle_key(KeyCode::Char('t')).expect("next note type");
        app.handle_key(KeyCode::Char('n')).expect("open editor");
        assert_eq!(
            app.ui_state().get(id).adding_note_type.as_deref(),
            Some("vocals")
        );
        for ch in "altos".chars() {
            app.handle_key(KeyCode::Char(ch)).expect("type");
        }
        app.handle_key(KeyCode::Enter).expect("save");

        let state = app.ui_state().get(id);
        assert_eq!(state.adding_note_type, None);
        assert_eq!(state.notes_by_type.get("vocals").map(String::as_str), Some("altos"));
    }

    #[test]
    fn scroll_keeps_focus_visible() {
        let heights = [3, 3, 3, 3, 3];
        assert_eq!(scroll_start(0, 4, &heights, 9), 2);
        assert_eq!(scroll_start(3, 1, &heights, 9), 1);
        assert_eq!(scroll_start(0, 1, &heights, 9), 0);
        assert_eq!(scroll_start(0, 0, &[], 9), 0);
    }
}
