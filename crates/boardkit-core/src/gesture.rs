//! Gesture coordination: at most one pointer gesture owns the board at a
//! time.
//!
//! Beginning a gesture hands out a token; mutating gesture APIs demand it
//! back on finish/cancel. Tokens are not cloneable, so a finished gesture
//! cannot be replayed, and a second `try_begin` while one is live fails
//! instead of interleaving.

use log::debug;

/// The pointer gestures that contend for ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    /// Dragging the selection by its bounds.
    BoundsDrag,
    /// Dragging a resize handle.
    ResizeHandle,
    /// Rubber-band selection.
    Marquee,
    /// Freehand drawing.
    Pen,
    /// Camera pan.
    Pan,
}

/// Proof of gesture ownership. Surrender it to finish or cancel.
#[derive(Debug)]
pub struct GestureToken {
    id: u64,
    kind: GestureKind,
}

impl GestureToken {
    pub fn kind(&self) -> GestureKind {
        self.kind
    }
}

/// Hands out exclusive gesture tokens.
#[derive(Debug, Default)]
pub struct GestureCoordinator {
    active: Option<(u64, GestureKind)>,
    next_id: u64,
}

impl GestureCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a gesture if none is active. Returns None (and leaves the
    /// current gesture untouched) when one is already live.
    pub fn try_begin(&mut self, kind: GestureKind) -> Option<GestureToken> {
        if let Some((_, active)) = self.active {
            debug!("gesture {kind:?} rejected: {active:?} is active");
            return None;
        }
        self.next_id += 1;
        let id = self.next_id;
        self.active = Some((id, kind));
        Some(GestureToken { id, kind })
    }

    /// The kind of the live gesture, if any.
    pub fn active(&self) -> Option<GestureKind> {
        self.active.map(|(_, kind)| kind)
    }

    /// True when the token belongs to the live gesture.
    pub fn owns(&self, token: &GestureToken) -> bool {
        self.active.map(|(id, _)| id) == Some(token.id)
    }

    /// Release ownership. Returns false for a stale token (e.g. after an
    /// abort), in which case nothing changes.
    pub fn release(&mut self, token: GestureToken) -> bool {
        if self.owns(&token) {
            self.active = None;
            true
        } else {
            debug!("stale gesture token {:?} ignored", token.kind);
            false
        }
    }

    /// Force-clear the live gesture, e.g. on pointer capture loss. Any
    /// outstanding token becomes stale.
    pub fn abort(&mut self) {
        self.active = None;
    }
}
