//! Drag interaction controller for reorderable program lists.
//!
//! Pointer and keyboard input arrive as [`DragEvent`]s. The controller folds
//! them into a [`DragState`] through [`transition`], which is a pure function:
//! the in-progress [`DragSession`] is replaced, never mutated behind the
//! caller's back. Hovering only ever moves the session's hover index; the
//! program itself is untouched until the gesture is dropped, at which point a
//! single [`Reorder`] is emitted for the host to apply.
//!
//! Pointer hovers are gated on the hovered row's vertical midpoint. Moving
//! down, the hover index only advances once the pointer is below the middle of
//! the hovered row; moving up, once it is above. Without that gate the dragged
//! row and its neighbour trade places on every motion event, because each swap
//! changes which row sits under the pointer.
//!
//! Nothing here depends on a rendering library. Coordinates are plain `f32`s
//! in whatever unit the host lays rows out in.

use log::{debug, info, trace};

use crate::models::ItemId;
use crate::program::ProgramSequence;

/// Vertical extent of a rendered row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalSpan {
    pub top: f32,
    pub height: f32,
}

impl VerticalSpan {
    pub fn new(top: f32, height: f32) -> Self {
        Self { top, height }
    }

    pub fn midpoint(&self) -> f32 {
        self.top + self.height / 2.0
    }

    pub fn contains(&self, y: f32) -> bool {
        y >= self.top && y < self.top + self.height
    }
}

/// The gesture in progress. Only exists between drag start and drop/cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    dragged_id: ItemId,
    source_index: usize,
    current_hover_index: usize,
}

impl DragSession {
    pub fn dragged_id(&self) -> ItemId {
        self.dragged_id
    }

    pub fn source_index(&self) -> usize {
        self.source_index
    }

    pub fn current_hover_index(&self) -> usize {
        self.current_hover_index
    }

    fn hovering(self, index: usize) -> Self {
        Self {
            current_hover_index: index,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(DragSession),
}

/// Input to the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragEvent {
    /// Pick up the item `id`, currently shown at `index`.
    Start { id: ItemId, index: usize },
    /// Pointer is over the row showing `target` at display position `index`.
    /// `bounds` is `None` when the row has not been laid out yet.
    Hover {
        target: ItemId,
        index: usize,
        pointer_y: f32,
        bounds: Option<VerticalSpan>,
    },
    /// Keyboard step of the hover index by `delta` rows. Discrete input, so
    /// no midpoint gate applies.
    Nudge(isize),
    /// Gesture released. `target` is the row under the pointer, or `None`
    /// when released outside any valid drop target.
    Drop { target: Option<ItemId> },
    /// Aborted by the user or the input system (escape, lost capture).
    Cancel,
}

/// A completed move for the host to apply with
/// [`ProgramSequence::move_range`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reorder {
    pub id: ItemId,
    pub from: usize,
    pub to: usize,
}

/// Fold one event into the drag state.
///
/// Returns the next state plus the reorder to apply, which is only ever
/// `Some` for a `Drop` that ends a session whose hover index differs from the
/// dragged item's position. Events that make no sense in the current state
/// are ignored; references to items that have left `program` cancel the
/// gesture.
pub fn transition(
    state: DragState,
    event: DragEvent,
    program: &ProgramSequence,
) -> (DragState, Option<Reorder>) {
    let session = match state {
        DragState::Idle => return (start(event, program), None),
        DragState::Dragging(session) => session,
    };

    if !program.contains(session.dragged_id) {
        debug!(
            "dragged item {} left the program; cancelling drag",
            session.dragged_id
        );
        return (DragState::Idle, None);
    }

    match event {
        DragEvent::Start { id, .. } => {
            debug!(
                "ignoring drag start for {id}: {} is already being dragged",
                session.dragged_id
            );
            (state, None)
        }
        DragEvent::Hover {
            target,
            index,
            pointer_y,
            bounds,
        } => {
            if !program.contains(target) {
                debug!("hover over removed item {target}; cancelling drag");
                return (DragState::Idle, None);
            }
            let next = hover(session, index, pointer_y, bounds, program.len());
            (DragState::Dragging(next), None)
        }
        DragEvent::Nudge(delta) => {
            let next = nudge(session, delta, program.len());
            (DragState::Dragging(next), None)
        }
        DragEvent::Drop { target } => (DragState::Idle, finish(session, target, program)),
        DragEvent::Cancel => {
            debug!("drag of {} cancelled", session.dragged_id);
            (DragState::Idle, None)
        }
    }
}

fn start(event: DragEvent, program: &ProgramSequence) -> DragState {
    let DragEvent::Start { id, index } = event else {
        return DragState::Idle;
    };
    let Some(position) = program.position_of(id) else {
        debug!("ignoring drag start for unknown item {id}");
        return DragState::Idle;
    };
    if position != index {
        debug!("drag start for {id} reported index {index}, using {position}");
    }
    debug!("drag started for {id} at {position}");
    DragState::Dragging(DragSession {
        dragged_id: id,
        source_index: position,
        current_hover_index: position,
    })
}

fn hover(
    session: DragSession,
    index: usize,
    pointer_y: f32,
    bounds: Option<VerticalSpan>,
    len: usize,
) -> DragSession {
    let current = session.current_hover_index;
    if index >= len || index == current {
        return session;
    }
    let Some(bounds) = bounds else {
        trace!("hover over {index} without bounds; waiting for layout");
        return session;
    };

    let midpoint = bounds.midpoint();
    let crossed = if index > current {
        pointer_y > midpoint
    } else {
        pointer_y < midpoint
    };
    if !crossed {
        return session;
    }

    trace!("hover crossed midpoint of row {index}: {current} -> {index}");
    session.hovering(index)
}

fn nudge(session: DragSession, delta: isize, len: usize) -> DragSession {
    if len == 0 {
        return session;
    }
    let max = (len - 1) as isize;
    let next = (session.current_hover_index as isize + delta).clamp(0, max);
    session.hovering(next as usize)
}

fn finish(
    session: DragSession,
    target: Option<ItemId>,
    program: &ProgramSequence,
) -> Option<Reorder> {
    let Some(target) = target else {
        debug!("drag of {} dropped outside the list", session.dragged_id);
        return None;
    };
    if !program.contains(target) {
        debug!("drop on removed item {target}; cancelling drag");
        return None;
    }

    let from = program.position_of(session.dragged_id)?;
    let to = session.current_hover_index;
    if to >= program.len() {
        debug!("hover index {to} no longer fits the program; cancelling drag");
        return None;
    }
    if from == to {
        debug!("drag of {} dropped in place", session.dragged_id);
        return None;
    }

    info!("reorder {}: {from} -> {to}", session.dragged_id);
    Some(Reorder {
        id: session.dragged_id,
        from,
        to,
    })
}

/// Owns the drag state for one list and runs events through [`transition`].
#[derive(Debug, Clone, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn session(&self) -> Option<&DragSession> {
        match &self.state {
            DragState::Idle => None,
            DragState::Dragging(session) => Some(session),
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn is_dragging_item(&self, id: ItemId) -> bool {
        self.session()
            .is_some_and(|session| session.dragged_id == id)
    }

    /// Feed `event`; returns the reorder to apply when a drag completes.
    pub fn handle(&mut self, event: DragEvent, program: &ProgramSequence) -> Option<Reorder> {
        let (next, reorder) = transition(self.state, event, program);
        self.state = next;
        reorder
    }

    pub fn cancel(&mut self) {
        if let DragState::Dragging(session) = self.state {
            debug!("drag of {} reset", session.dragged_id);
        }
        self.state = DragState::Idle;
    }
}
