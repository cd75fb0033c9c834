//! Core of pxcraft: the layered document model, canvas-affecting operations with their
//! undo history, and the `.pxc` project codec. Nothing in here knows about windows or widgets;
//! a front end plugs in through [`editor::View`] and [`editor::Messages`].

pub mod blend;
pub mod canvas_ops;
pub mod editor;
pub mod history;
pub mod id;
pub mod io;
pub mod raster;
pub mod state;
pub mod util;

pub use id::Id;
pub use state::document::{Document, DocumentID};
