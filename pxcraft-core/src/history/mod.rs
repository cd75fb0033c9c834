//! # History
//!
//! Every canvas operation leaves an [`EditRecord`] behind: the snapshot before, the snapshot
//! after, and the transform between them. Undoing is publishing the old snapshot again, there is
//! no inverse operation to run.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::state::{document::Document, transform::Matrix};

/// Records kept when nothing else is configured.
pub const DEFAULT_LIMIT: usize = 64;

#[derive(Clone, Debug)]
pub struct EditRecord {
    name: String,
    before: Arc<Document>,
    after: Arc<Document>,
    matrix: Matrix,
}
impl EditRecord {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        before: Arc<Document>,
        after: Arc<Document>,
        matrix: Matrix,
    ) -> Self {
        Self {
            name: name.into(),
            before,
            after,
            matrix,
        }
    }
    /// Human readable, as shown in an undo menu.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
    #[must_use]
    pub fn before(&self) -> &Arc<Document> {
        &self.before
    }
    #[must_use]
    pub fn after(&self) -> &Arc<Document> {
        &self.after
    }
    /// Maps image space of `before` onto image space of `after`.
    #[must_use]
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }
}

#[derive(PartialEq, Eq, Debug)]
pub enum DoUndo<'r, T> {
    Do(&'r T),
    Undo(&'r T),
}
impl<'r> DoUndo<'r, EditRecord> {
    #[must_use]
    pub fn record(&self) -> &'r EditRecord {
        match self {
            Self::Do(r) | Self::Undo(r) => r,
        }
    }
    /// The snapshot that is current once this step is applied.
    #[must_use]
    pub fn target(&self) -> &'r Arc<Document> {
        match self {
            Self::Do(r) => r.after(),
            Self::Undo(r) => r.before(),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryError {
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
}

/// Undo and redo stacks of [`EditRecord`]s.
#[derive(Debug)]
pub struct History {
    /// Oldest first.
    undo: VecDeque<EditRecord>,
    /// Most recently undone last.
    redo: Vec<EditRecord>,
    limit: usize,
}
impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_LIMIT)
    }
}
impl History {
    /// Keeps at most `limit` undoable records, and never fewer than one.
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }
    /// Record a fresh edit. Anything undone so far can no longer be redone.
    pub fn push(&mut self, record: EditRecord) {
        self.redo.clear();
        self.undo.push_back(record);
        while self.undo.len() > self.limit {
            if let Some(dropped) = self.undo.pop_front() {
                log::trace!("history full, forgetting {:?}", dropped.name());
            }
        }
    }
    /// Step back one edit, returning the record that was undone.
    pub fn undo(&mut self) -> Result<DoUndo<'_, EditRecord>, HistoryError> {
        let record = self.undo.pop_back().ok_or(HistoryError::NothingToUndo)?;
        self.redo.push(record);
        self.redo
            .last()
            .map(DoUndo::Undo)
            .ok_or(HistoryError::NothingToUndo)
    }
    /// Step forward one undone edit, returning the record that was redone.
    pub fn redo(&mut self) -> Result<DoUndo<'_, EditRecord>, HistoryError> {
        let record = self.redo.pop().ok_or(HistoryError::NothingToRedo)?;
        self.undo.push_back(record);
        self.undo
            .back()
            .map(DoUndo::Do)
            .ok_or(HistoryError::NothingToRedo)
    }
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }
    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }
    /// Next record to be undone.
    #[must_use]
    pub fn peek_undo(&self) -> Option<&EditRecord> {
        self.undo.back()
    }
    /// Undoable records, oldest first.
    pub fn undo_records(&self) -> impl Iterator<Item = &EditRecord> {
        self.undo.iter()
    }
}
