use thiserror::Error;

use crate::models::ItemId;

/// Failures reported by [`crate::program::ProgramSequence`]. Every variant
/// leaves the sequence exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramError {
    #[error("index {index} is out of range for a program of {len} items")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("no program item with id {0}")]
    UnknownItem(ItemId),
}
