//! FILENAME: core/forms/src/cursor.rs
//! PURPOSE: Ordered snapshot of a table's row identifiers plus a position.
//! CONTEXT: The snapshot is taken at reload time in the engine's natural
//! order and goes stale as soon as anything writes to the table; the form
//! controller reloads after every commit and delete.

use persistence::{Gateway, RowId, StorageError};

use crate::error::FormError;

/// What happens to an out-of-range position on reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reposition {
    /// Back to the first row.
    Start,
    /// Onto the last row. Used after a delete so the form shows the row
    /// that took the deleted one's place, or the new last row.
    ClampToEnd,
}

/// Result of a relative move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Moved,
    /// The requested position was outside the sequence; the cursor stopped
    /// at the nearest end.
    Clamped,
}

#[derive(Debug, Clone)]
pub struct RecordCursor {
    table: String,
    ids: Vec<RowId>,
    position: usize,
}

impl RecordCursor {
    pub fn new(table: impl Into<String>) -> Self {
        RecordCursor {
            table: table.into(),
            ids: Vec::new(),
            position: 0,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn reload(&mut self, gateway: &Gateway, reposition: Reposition) -> Result<(), StorageError> {
        self.ids = gateway.ids_where(&self.table, None)?;
        self.reposition(reposition);
        log::debug!(
            target: "CURSOR",
            "{}: {} row(s), position {}",
            self.table,
            self.ids.len(),
            self.position
        );
        Ok(())
    }

    fn reposition(&mut self, policy: Reposition) {
        if self.position < self.ids.len() {
            return;
        }
        self.position = match policy {
            Reposition::Start => 0,
            Reposition::ClampToEnd => self.ids.len().saturating_sub(1),
        };
    }

    pub fn current(&self) -> Result<RowId, FormError> {
        self.ids
            .get(self.position)
            .copied()
            .ok_or_else(|| FormError::NoRecords {
                table: self.table.clone(),
            })
    }

    pub fn advance(&mut self, delta: isize) -> Step {
        if self.ids.is_empty() {
            return Step::Clamped;
        }
        let last = (self.ids.len() - 1) as isize;
        let target = self.position as isize + delta;
        self.position = target.clamp(0, last) as usize;
        if target < 0 || target > last {
            Step::Clamped
        } else {
            Step::Moved
        }
    }

    /// Move onto `id`. False (position unchanged) when it is not in the snapshot.
    pub fn jump_to(&mut self, id: RowId) -> bool {
        match self.ids.iter().position(|x| *x == id) {
            Some(idx) => {
                self.position = idx;
                true
            }
            None => false,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[RowId] {
        &self.ids
    }
}
