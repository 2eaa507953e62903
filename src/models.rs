//! Domain models for one event program. These types stay plain data holders so
//! the sequence, the UI state store and the drag controller can all reason
//! about items without knowing how the host paints them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Next identifier handed out by [`ItemId::fresh`]. Ids are never reused for
/// the lifetime of the process.
static NEXT_ITEM_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a program item, independent of where it sits in the
/// running order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(u64);

impl ItemId {
    /// Allocate an identifier no other item has been given.
    pub fn fresh() -> Self {
        ItemId(NEXT_ITEM_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Discriminant of [`ItemPayload`]. Renderers and tab rules dispatch on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Song,
    Header,
    Element,
}

impl ItemKind {
    pub fn label(self) -> &'static str {
        match self {
            ItemKind::Song => "Song",
            ItemKind::Header => "Header",
            ItemKind::Element => "Element",
        }
    }
}

/// One way a song can be performed, with the keys it is charted in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arrangement {
    pub name: String,
    pub keys: Vec<String>,
}

impl Arrangement {
    pub fn new(name: &str, keys: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keys: keys.iter().map(|key| key.to_string()).collect(),
        }
    }
}

/// Reference to a song from the library plus the metadata shown in the row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongRef {
    /// Library identifier. Several program items may point at the same song.
    pub song_id: i64,
    pub title: String,
    pub author: String,
    /// Optional URL to a chart or recording; kept as raw text.
    pub link: String,
    pub length_minutes: u32,
    pub arrangements: Vec<Arrangement>,
}

impl SongRef {
    /// `Title - Author`, omitting the hyphen when the author is blank.
    pub fn display_title(&self) -> String {
        if self.author.trim().is_empty() {
            self.title.clone()
        } else {
            format!("{} - {}", self.title, self.author)
        }
    }

    pub fn arrangement(&self, name: &str) -> Option<&Arrangement> {
        self.arrangements.iter().find(|arr| arr.name == name)
    }
}

/// Named colors a section header can be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderColor {
    #[default]
    Gray,
    Blue,
    Green,
    Yellow,
    Red,
    Magenta,
}

impl HeaderColor {
    pub const ALL: [HeaderColor; 6] = [
        HeaderColor::Gray,
        HeaderColor::Blue,
        HeaderColor::Green,
        HeaderColor::Yellow,
        HeaderColor::Red,
        HeaderColor::Magenta,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HeaderColor::Gray => "gray",
            HeaderColor::Blue => "blue",
            HeaderColor::Green => "green",
            HeaderColor::Yellow => "yellow",
            HeaderColor::Red => "red",
            HeaderColor::Magenta => "magenta",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn parse(raw: &str) -> Option<Self> {
        let needle = raw.trim().to_lowercase();
        Self::ALL.into_iter().find(|color| color.name() == needle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderInfo {
    pub title: String,
    pub color: HeaderColor,
}

/// Free-form program element (welcome, offering, sermon, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementInfo {
    pub title: String,
    pub description: String,
    /// Start time label such as `10:15`. Not parsed.
    pub time: String,
    pub duration_minutes: u32,
}

/// Kind-specific data carried by a program item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemPayload {
    Song(SongRef),
    Header(HeaderInfo),
    Element(ElementInfo),
}

impl ItemPayload {
    pub fn kind(&self) -> ItemKind {
        match self {
            ItemPayload::Song(_) => ItemKind::Song,
            ItemPayload::Header(_) => ItemKind::Header,
            ItemPayload::Element(_) => ItemKind::Element,
        }
    }
}

/// One row of an event's running order. Its position is not stored here; the
/// owning sequence is the only source of truth for order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramItem {
    id: ItemId,
    payload: ItemPayload,
}

impl ProgramItem {
    /// Create an item with a freshly allocated id.
    pub fn new(payload: ItemPayload) -> Self {
        Self {
            id: ItemId::fresh(),
            payload,
        }
    }

    /// Build an item under an id that is already in use, to exercise the
    /// sequence's duplicate handling.
    #[cfg(test)]
    pub(crate) fn with_id(id: ItemId, payload: ItemPayload) -> Self {
        Self { id, payload }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn kind(&self) -> ItemKind {
        self.payload.kind()
    }

    pub fn payload(&self) -> &ItemPayload {
        &self.payload
    }

    pub fn title(&self) -> &str {
        match &self.payload {
            ItemPayload::Song(song) => &song.title,
            ItemPayload::Header(header) => &header.title,
            ItemPayload::Element(element) => &element.title,
        }
    }

    /// Minutes this item occupies in the service. Headers take no time.
    pub fn duration_minutes(&self) -> u32 {
        match &self.payload {
            ItemPayload::Song(song) => song.length_minutes,
            ItemPayload::Header(_) => 0,
            ItemPayload::Element(element) => element.duration_minutes,
        }
    }

    /// Give the item a new identity. Only the sequence calls this, while
    /// inserting an item whose id is already taken.
    pub(crate) fn regenerate_id(&mut self) -> ItemId {
        self.id = ItemId::fresh();
        self.id
    }
}

impl fmt::Display for ProgramItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind().label(), self.title())
    }
}

/// Shorthand for building a header item.
pub fn header(title: &str, color: HeaderColor) -> ItemPayload {
    ItemPayload::Header(HeaderInfo {
        title: title.to_string(),
        color,
    })
}

/// Shorthand for building an element item.
pub fn element(title: &str, description: &str, time: &str, duration_minutes: u32) -> ItemPayload {
    ItemPayload::Element(ElementInfo {
        title: title.to_string(),
        description: description.to_string(),
        time: time.to_string(),
        duration_minutes,
    })
}
