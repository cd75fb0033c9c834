//! # State
//!
//! The document model. A [`document::Document`] is a snapshot: once published it is shared
//! behind an `Arc` and never changed, edits produce a new one.

pub mod canvas;
pub mod document;
pub mod guides;
pub mod layer;
pub mod selection;
pub mod transform;
