//! The ordered running order of one event. Order lives only here: items do
//! not know their own index, and everything that needs to survive a reorder
//! is keyed by [`ItemId`].

use log::{debug, warn};

use crate::error::ProgramError;
use crate::models::{ItemId, ProgramItem};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramSequence {
    items: Vec<ProgramItem>,
}

impl ProgramSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sequence in the given order, running every item through
    /// [`ProgramSequence::insert`] so duplicate ids are caught.
    pub fn from_items(items: impl IntoIterator<Item = ProgramItem>) -> Self {
        let mut sequence = Self::new();
        for item in items {
            sequence.push(item);
        }
        sequence
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProgramItem> {
        self.items.iter()
    }

    pub fn ids(&self) -> Vec<ItemId> {
        self.items.iter().map(ProgramItem::id).collect()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.position_of(id).is_some()
    }

    pub fn position_of(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    pub fn get(&self, id: ItemId) -> Option<&ProgramItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn item_at(&self, index: usize) -> Option<&ProgramItem> {
        self.items.get(index)
    }

    /// Insert `item` so that it ends up at `index` (`index == len` appends).
    ///
    /// An id that is already present is a programmer error: debug builds
    /// panic, release builds give the newcomer a fresh id and log a warning.
    /// Returns the id the item was stored under.
    pub fn insert(&mut self, mut item: ProgramItem, index: usize) -> Result<ItemId, ProgramError> {
        if index > self.items.len() {
            return Err(ProgramError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }

        let requested = item.id();
        if self.contains(requested) {
            debug_assert!(false, "duplicate program item id {requested}");
            let replacement = item.regenerate_id();
            warn!("duplicate program item id {requested}; reassigned to {replacement}");
        }

        let id = item.id();
        self.items.insert(index, item);
        debug!("inserted program item {id} at {index}");
        Ok(id)
    }

    /// Append to the end of the program.
    pub fn push(&mut self, item: ProgramItem) -> ItemId {
        let len = self.items.len();
        match self.insert(item, len) {
            Ok(id) => id,
            // `len` is always a valid insertion point.
            Err(_) => unreachable!("appending at len cannot be out of range"),
        }
    }

    pub fn remove_by_id(&mut self, id: ItemId) -> Result<ProgramItem, ProgramError> {
        let index = self
            .position_of(id)
            .ok_or(ProgramError::UnknownItem(id))?;
        debug!("removed program item {id} from {index}");
        Ok(self.items.remove(index))
    }

    /// Move the item at `from` so it ends up at `to`, shifting the items in
    /// between by one. Returns `Ok(false)` when `from == to` and nothing
    /// changed. Out-of-range indexes are rejected without touching the order.
    pub fn move_range(&mut self, from: usize, to: usize) -> Result<bool, ProgramError> {
        let len = self.items.len();
        for index in [from, to] {
            if index >= len {
                warn!("rejected move {from} -> {to} in program of {len} items");
                return Err(ProgramError::IndexOutOfRange { index, len });
            }
        }
        if from == to {
            return Ok(false);
        }

        let item = self.items.remove(from);
        self.items.insert(to, item);
        Ok(true)
    }

    /// The order the program would have after `move_range(from, to)`, without
    /// applying it. Out-of-range indexes yield the current order.
    pub fn previewed_move(&self, from: usize, to: usize) -> Vec<&ProgramItem> {
        let mut order: Vec<&ProgramItem> = self.items.iter().collect();
        if from < order.len() && to < order.len() && from != to {
            let item = order.remove(from);
            order.insert(to, item);
        }
        order
    }

    /// Running time of the whole program. Saturates instead of overflowing.
    pub fn total_duration_minutes(&self) -> u32 {
        self.items
            .iter()
            .map(ProgramItem::duration_minutes)
            .fold(0, u32::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{element, header, HeaderColor, ItemPayload};

    fn titled(title: &str) -> ItemPayload {
        header(title, HeaderColor::Gray)
    }

    fn sequence_of(titles: &[&str]) -> ProgramSequence {
        ProgramSequence::from_items(titles.iter().map(|t| ProgramItem::new(titled(t))))
    }

    fn titles(sequence: &ProgramSequence) -> Vec<&str> {
        sequence.iter().map(ProgramItem::title).collect()
    }

    #[test]
    fn move_forward_shifts_items_between() {
        let mut sequence = sequence_of(&["a", "b", "c", "d"]);
        assert_eq!(sequence.move_range(0, 2), Ok(true));
        assert_eq!(titles(&sequence), ["b", "c", "a", "d"]);
    }

    #[test]
    fn move_backward_shifts_items_between() {
        let mut sequence = sequence_of(&["a", "b", "c", "d"]);
        assert_eq!(sequence.move_range(3, 1), Ok(true));
        assert_eq!(titles(&sequence), ["a", "d", "b", "c"]);
    }

    #[test]
    fn move_to_same_index_is_a_no_op() {
        let mut sequence = sequence_of(&["a", "b", "c"]);
        let before = sequence.clone();
        assert_eq!(sequence.move_range(1, 1), Ok(false));
        assert_eq!(sequence, before);
    }

    #[test]
    fn out_of_range_moves_are_rejected_untouched() {
        let mut sequence = sequence_of(&["a", "b"]);
        let before = sequence.clone();
        assert_eq!(
            sequence.move_range(0, 2),
            Err(ProgramError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert_eq!(
            sequence.move_range(5, 0),
            Err(ProgramError::IndexOutOfRange { index: 5, len: 2 })
        );
        assert_eq!(sequence, before);
    }

    #[test]
    fn moving_in_an_empty_program_is_rejected() {
        let mut sequence = ProgramSequence::new();
        assert!(sequence.move_range(0, 0).is_err());
    }

    #[test]
    fn insert_respects_index_bounds() {
        let mut sequence = sequence_of(&["a", "c"]);
        sequence
            .insert(ProgramItem::new(titled("b")), 1)
            .expect("insert in range");
        assert_eq!(titles(&sequence), ["a", "b", "c"]);
        assert!(sequence.insert(ProgramItem::new(titled("z")), 9).is_err());
        assert_eq!(sequence.len(), 3);
    }

    #[test]
    fn remove_by_id_returns_the_item() {
        let mut sequence = sequence_of(&["a", "b"]);
        let id = sequence.ids()[0];
        let removed = sequence.remove_by_id(id).expect("item exists");
        assert_eq!(removed.title(), "a");
        assert_eq!(
            sequence.remove_by_id(id),
            Err(ProgramError::UnknownItem(id))
        );
    }

    #[test]
    fn ids_are_stable_across_moves() {
        let mut sequence = sequence_of(&["a", "b", "c"]);
        let id_of_a = sequence.ids()[0];
        sequence.move_range(0, 2).expect("valid move");
        assert_eq!(sequence.position_of(id_of_a), Some(2));
        assert_eq!(sequence.get(id_of_a).map(ProgramItem::title), Some("a"));
    }

    #[test]
    fn previewed_move_leaves_sequence_alone() {
        let sequence = sequence_of(&["a", "b", "c"]);
        let preview: Vec<&str> = sequence
            .previewed_move(2, 0)
            .into_iter()
            .map(ProgramItem::title)
            .collect();
        assert_eq!(preview, ["c", "a", "b"]);
        assert_eq!(titles(&sequence), ["a", "b", "c"]);
    }

    #[test]
    fn total_duration_skips_headers() {
        let mut sequence = sequence_of(&["Welcome"]);
        sequence.push(ProgramItem::new(element("Sermon", "", "10:30", 25)));
        sequence.push(ProgramItem::new(element("Offering", "", "11:00", 5)));
        assert_eq!(sequence.total_duration_minutes(), 30);
    }

    #[test]
    fn total_duration_saturates() {
        let sequence = ProgramSequence::from_items([
            ProgramItem::new(element("Vigil", "", "", 4_000_000_000)),
            ProgramItem::new(element("Vigil", "", "", 4_000_000_000)),
        ]);
        assert_eq!(sequence.total_duration_minutes(), u32::MAX);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "duplicate program item id")]
    fn duplicate_id_fails_fast_in_debug_builds() {
        let id = ItemId::fresh();
        let mut sequence = ProgramSequence::new();
        sequence.push(ProgramItem::with_id(id, titled("a")));
        sequence.push(ProgramItem::with_id(id, titled("b")));
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn duplicate_id_is_regenerated_in_release_builds() {
        let id = ItemId::fresh();
        let mut sequence = ProgramSequence::new();
        sequence.push(ProgramItem::with_id(id, titled("a")));
        let second = sequence.push(ProgramItem::with_id(id, titled("b")));
        assert_ne!(second, id);
        assert_eq!(sequence.len(), 2);
    }
}
