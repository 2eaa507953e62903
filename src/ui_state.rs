//! Transient per-item view state, keyed by item identity.
//!
//! Nothing in here knows about positions. Reordering the program therefore
//! needs no bookkeeping: the state follows the id wherever the item goes.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Deserialize;

use crate::models::{ItemId, ItemKind};

/// Detail tabs shown under an expanded row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailTab {
    #[default]
    Info,
    Arrangement,
    Files,
    Notes,
}

impl DetailTab {
    /// Tabs that make sense for an item of `kind`, in display order.
    pub fn allowed_for(kind: ItemKind) -> &'static [DetailTab] {
        match kind {
            ItemKind::Song => &[
                DetailTab::Info,
                DetailTab::Arrangement,
                DetailTab::Files,
                DetailTab::Notes,
            ],
            ItemKind::Header | ItemKind::Element => &[DetailTab::Info, DetailTab::Notes],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DetailTab::Info => "Info",
            DetailTab::Arrangement => "Arrangement",
            DetailTab::Files => "Files",
            DetailTab::Notes => "Notes",
        }
    }

    /// The tab after `self` among those allowed for `kind`, wrapping around.
    /// A tab that is not allowed for `kind` steps to the first allowed one.
    pub fn next_for(self, kind: ItemKind) -> DetailTab {
        let tabs = Self::allowed_for(kind);
        match tabs.iter().position(|tab| *tab == self) {
            Some(index) => tabs[(index + 1) % tabs.len()],
            None => tabs[0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilesView {
    #[default]
    Grid,
    Table,
}

impl FilesView {
    pub fn toggled(self) -> Self {
        match self {
            FilesView::Grid => FilesView::Table,
            FilesView::Table => FilesView::Grid,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FilesView::Grid => "grid",
            FilesView::Table => "table",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemUiState {
    pub expanded: bool,
    pub active_tab: DetailTab,
    pub files_view: FilesView,
    /// Empty until the user picks one; renderers fall back to the first.
    pub selected_arrangement: String,
    pub selected_key: String,
    pub active_note_type: String,
    /// Note type whose editor is open, if any.
    pub adding_note_type: Option<String>,
    /// Saved notes per note type. Callers replace this map wholesale.
    pub notes_by_type: BTreeMap<String, String>,
}

impl Default for ItemUiState {
    fn default() -> Self {
        Self {
            expanded: false,
            active_tab: DetailTab::Info,
            files_view: FilesView::Grid,
            selected_arrangement: String::new(),
            selected_key: String::new(),
            active_note_type: "general".to_string(),
            adding_note_type: None,
            notes_by_type: BTreeMap::new(),
        }
    }
}

impl ItemUiState {
    /// The active tab, clamped to what `kind` supports.
    pub fn tab_for(&self, kind: ItemKind) -> DetailTab {
        if DetailTab::allowed_for(kind).contains(&self.active_tab) {
            self.active_tab
        } else {
            DetailTab::Info
        }
    }
}

/// Partial update for [`ItemUiState`]. `None` fields are left alone; the merge
/// is shallow, so `notes_by_type` replaces the whole map when present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemUiPatch {
    pub expanded: Option<bool>,
    pub active_tab: Option<DetailTab>,
    pub files_view: Option<FilesView>,
    pub selected_arrangement: Option<String>,
    pub selected_key: Option<String>,
    pub active_note_type: Option<String>,
    pub adding_note_type: Option<Option<String>>,
    pub notes_by_type: Option<BTreeMap<String, String>>,
}

impl ItemUiPatch {
    pub fn expanded(mut self, expanded: bool) -> Self {
        self.expanded = Some(expanded);
        self
    }

    pub fn active_tab(mut self, tab: DetailTab) -> Self {
        self.active_tab = Some(tab);
        self
    }

    pub fn files_view(mut self, view: FilesView) -> Self {
        self.files_view = Some(view);
        self
    }

    pub fn selected_arrangement(mut self, name: impl Into<String>) -> Self {
        self.selected_arrangement = Some(name.into());
        self
    }

    pub fn selected_key(mut self, key: impl Into<String>) -> Self {
        self.selected_key = Some(key.into());
        self
    }

    pub fn active_note_type(mut self, note_type: impl Into<String>) -> Self {
        self.active_note_type = Some(note_type.into());
        self
    }

    pub fn adding_note_type(mut self, note_type: Option<String>) -> Self {
        self.adding_note_type = Some(note_type);
        self
    }

    pub fn notes_by_type(mut self, notes: BTreeMap<String, String>) -> Self {
        self.notes_by_type = Some(notes);
        self
    }

    fn apply(self, state: &mut ItemUiState) {
        if let Some(expanded) = self.expanded {
            state.expanded = expanded;
        }
        if let Some(tab) = self.active_tab {
            state.active_tab = tab;
        }
        if let Some(view) = self.files_view {
            state.files_view = view;
        }
        if let Some(name) = self.selected_arrangement {
            state.selected_arrangement = name;
        }
        if let Some(key) = self.selected_key {
            state.selected_key = key;
        }
        if let Some(note_type) = self.active_note_type {
            state.active_note_type = note_type;
        }
        if let Some(adding) = self.adding_note_type {
            state.adding_note_type = adding;
        }
        if let Some(notes) = self.notes_by_type {
            state.notes_by_type = notes;
        }
    }
}

/// Map from item id to its [`ItemUiState`]. Entries are created on the first
/// `set` and dropped with `remove` or `prune`.
#[derive(Debug, Clone, Default)]
pub struct UiStateStore {
    defaults: ItemUiState,
    entries: HashMap<ItemId, ItemUiState>,
}

impl UiStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `defaults` for items that have no stored state yet.
    pub fn with_defaults(defaults: ItemUiState) -> Self {
        Self {
            defaults,
            entries: HashMap::new(),
        }
    }

    /// Stored state for `id`, or a copy of the defaults. Never inserts.
    pub fn get(&self, id: ItemId) -> ItemUiState {
        self.entries
            .get(&id)
            .cloned()
            .unwrap_or_else(|| self.defaults.clone())
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Merge `patch` into the state for `id`, creating it from the defaults
    /// first if needed.
    pub fn set(&mut self, id: ItemId, patch: ItemUiPatch) {
        let defaults = &self.defaults;
        let state = self
            .entries
            .entry(id)
            .or_insert_with(|| defaults.clone());
        patch.apply(state);
    }

    pub fn remove(&mut self, id: ItemId) -> Option<ItemUiState> {
        self.entries.remove(&id)
    }

    /// Drop entries whose id is not in `live`. Returns how many went away.
    pub fn prune(&mut self, live: impl IntoIterator<Item = ItemId>) -> usize {
        let live: HashSet<ItemId> = live.into_iter().collect();
        let before = self.entries.len();
        self.entries.retain(|id, _| live.contains(id));
        let pruned = before - self.entries.len();
        if pruned > 0 {
            log::debug!("pruned {pruned} stale item ui states");
        }
        pruned
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
