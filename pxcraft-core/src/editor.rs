//! # Editor
//!
//! Holds the active document of one view along with its history, and the seams a front end
//! implements to follow along: a [`View`] showing the document and a [`Messages`] sink for status
//! lines and errors.

use std::sync::Arc;

use crate::history::{History, HistoryError};
use crate::state::{document::Document, layer::DEFAULT_THUMBNAIL_EDGE};

/// Whatever is displaying the active document.
pub trait View: Send {
    /// Show `document` in place of the current one.
    fn replace_document(&mut self, document: Arc<Document>);
    fn repaint(&mut self) {}
    /// The canvas changed size, scroll extents and such need recalculating.
    fn revalidate(&mut self) {}
}

/// A view that shows nothing.
#[derive(Default, Debug, Clone, Copy)]
pub struct NullView;
impl View for NullView {
    fn replace_document(&mut self, _: Arc<Document>) {}
}

/// User facing reports.
pub trait Messages: Send + Sync {
    /// A short line describing something that just happened.
    fn show_status(&self, message: &str);
    fn show_error(&self, title: &str, error: &dyn std::error::Error);
}

/// Reports into the `log` facade.
#[derive(Default, Debug, Clone, Copy)]
pub struct LogMessages;
impl Messages for LogMessages {
    fn show_status(&self, message: &str) {
        log::info!("{message}");
    }
    fn show_error(&self, title: &str, error: &dyn std::error::Error) {
        let mut text = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            text.push_str(": ");
            text.push_str(&cause.to_string());
            source = cause.source();
        }
        log::error!("{title}: {text}");
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EditorConfig {
    pub history_limit: usize,
    /// Longest edge of layer icons.
    pub thumbnail_edge: u32,
}
impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: crate::history::DEFAULT_LIMIT,
            thumbnail_edge: DEFAULT_THUMBNAIL_EDGE,
        }
    }
}

pub struct Editor {
    document: Arc<Document>,
    history: History,
    view: Box<dyn View>,
    messages: Arc<dyn Messages>,
    selection_actions_enabled: bool,
    thumbnail_edge: u32,
}
impl Editor {
    /// Start editing `document`, publishing it to `view` right away.
    pub fn new(
        mut document: Document,
        mut view: Box<dyn View>,
        messages: Arc<dyn Messages>,
        config: EditorConfig,
    ) -> Self {
        document.update_icon_images(config.thumbnail_edge);
        let document = Arc::new(document);
        view.replace_document(document.clone());
        Self {
            selection_actions_enabled: document.has_selection(),
            document,
            history: History::new(config.history_limit),
            view,
            messages,
            thumbnail_edge: config.thumbnail_edge,
        }
    }
    /// The published snapshot.
    #[must_use]
    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }
    pub(crate) fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }
    #[must_use]
    pub fn messages(&self) -> &Arc<dyn Messages> {
        &self.messages
    }
    /// Whether actions acting on the selection (crop to selection, deselect, ...) apply.
    #[must_use]
    pub fn selection_actions_enabled(&self) -> bool {
        self.selection_actions_enabled
    }
    #[must_use]
    pub fn thumbnail_edge(&self) -> u32 {
        self.thumbnail_edge
    }
    /// Make `document` the active snapshot and tell the view.
    pub(crate) fn publish(&mut self, document: Arc<Document>) {
        let resized = document.canvas() != self.document.canvas();
        self.view.replace_document(document.clone());
        self.selection_actions_enabled = document.has_selection();
        self.document = document;
        self.view.repaint();
        if resized {
            self.view.revalidate();
        }
    }
    /// Go back to the snapshot before the latest edit.
    pub fn undo(&mut self) -> Result<Arc<Document>, HistoryError> {
        let (target, name) = {
            let step = self.history.undo()?;
            (step.target().clone(), step.record().name().to_owned())
        };
        self.publish(target.clone());
        self.messages.show_status(&format!("Undo {name}"));
        Ok(target)
    }
    /// Reapply the most recently undone edit.
    pub fn redo(&mut self) -> Result<Arc<Document>, HistoryError> {
        let (target, name) = {
            let step = self.history.redo()?;
            (step.target().clone(), step.record().name().to_owned())
        };
        self.publish(target.clone());
        self.messages.show_status(&format!("Redo {name}"));
        Ok(target)
    }
}
