//! Snapshot-based undo/redo.
//!
//! Entries hold a full copy of the element map and z-order. Snapshots are
//! pushed once per committed mutation (gesture completion for drags), never
//! per intermediate frame.

use crate::store::StoreSnapshot;
use serde::{Deserialize, Serialize};

/// Maximum number of undo states to keep.
pub const MAX_UNDO_HISTORY: usize = 50;

/// A recorded document state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Full element snapshot.
    pub snapshot: StoreSnapshot,
    /// Milliseconds since the Unix epoch at push time.
    pub timestamp_ms: u64,
    /// Human-readable description of the mutation this entry precedes.
    pub description: String,
}

fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Undo/redo stacks over full document snapshots.
#[derive(Debug, Clone, Default)]
pub struct HistoryManager {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
}

impl HistoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push the pre-mutation state (call before making changes).
    /// Clears the redo stack and bounds the undo depth.
    pub fn push(&mut self, snapshot: StoreSnapshot, description: impl Into<String>) {
        self.undo_stack.push(HistoryEntry {
            snapshot,
            timestamp_ms: now_ms(),
            description: description.into(),
        });
        self.redo_stack.clear();

        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    /// Pop the last undo state, pushing `current` onto the redo stack.
    /// Returns the snapshot to restore, or None if nothing to undo.
    pub fn undo(&mut self, current: StoreSnapshot) -> Option<StoreSnapshot> {
        let entry = self.undo_stack.pop()?;
        self.redo_stack.push(HistoryEntry {
            snapshot: current,
            timestamp_ms: now_ms(),
            description: entry.description.clone(),
        });
        Some(entry.snapshot)
    }

    /// Pop the last redo state, pushing `current` onto the undo stack.
    pub fn redo(&mut self, current: StoreSnapshot) -> Option<StoreSnapshot> {
        let entry = self.redo_stack.pop()?;
        self.undo_stack.push(HistoryEntry {
            snapshot: current,
            timestamp_ms: now_ms(),
            description: entry.description.clone(),
        });
        Some(entry.snapshot)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Description of the mutation that undo would revert, if any.
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.last().map(|e| e.description.as_str())
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
