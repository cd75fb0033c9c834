//! # Canvas operations
//!
//! Operations that move the image space of a whole document at once: resizing, cropping,
//! enlarging, flipping and rotating. Each is a small [`CanvasOp`] strategy describing the
//! geometry, and [`process`] carries any of them through the document the same way: copy,
//! transform every layer and mask, install the new canvas, rebuild guides and icons, record the
//! edit and publish.

pub mod crop;
pub mod enlarge;
pub mod flip;
pub mod resize;
pub mod rotate;
pub mod visitor;

pub use crop::Crop;
pub use enlarge::EnlargeCanvas;
pub use flip::{Flip, FlipDirection};
pub use resize::Resize;
pub use rotate::{QuarterTurn, Rotate};

use std::sync::Arc;

use crate::editor::Editor;
use crate::history::EditRecord;
use crate::raster::{Filter, RasterError};
use crate::state::{
    canvas::{Canvas, InvalidDimensions},
    document::Document,
    guides::Guides,
    layer::Content,
    transform::{CanvasTransform, Matrix},
};

#[derive(thiserror::Error, Debug)]
pub enum CanvasOpError {
    #[error(transparent)]
    InvalidDimensions(#[from] InvalidDimensions),
    #[error("crop area at {x},{y} of {width}x{height} doesn't fit the {canvas} canvas")]
    CropOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        canvas: Canvas,
    },
    #[error("couldn't transform layer {layer:?}")]
    Layer {
        layer: String,
        #[source]
        source: RasterError,
    },
}

/// The geometry of one canvas operation.
///
/// Everything here is a pure function of the canvas, no document state is touched.
pub trait CanvasOp: Send + Sync {
    /// Canvas after the operation, or why there can't be one.
    fn new_canvas(&self, old: Canvas) -> Result<Canvas, CanvasOpError>;
    /// Maps image space on `old` to image space on `new`.
    fn canvas_transform(&self, old: Canvas, new: Canvas) -> Matrix;
    fn affects_canvas_size(&self) -> bool;
    /// Name of the edit in the history.
    fn edit_name(&self) -> String;
    fn status_message(&self, old: Canvas, new: Canvas) -> String;
    /// Resampling used for content that gets scaled.
    fn filter(&self) -> Filter {
        Filter::Nearest
    }
    fn transform_content(
        &self,
        content: &mut dyn Content,
        transform: &CanvasTransform,
    ) -> Result<(), RasterError> {
        content.transform(transform)
    }
    /// Guides for the new canvas, from the guides of the old one.
    fn guides_for(
        &self,
        old: &Guides,
        _old_canvas: Canvas,
        transform: &CanvasTransform,
    ) -> Guides {
        old.transformed(&transform.matrix, &transform.canvas)
    }
}

/// Apply `op` to the editor's document.
///
/// The published document is never touched: a copy is transformed and, only once every step
/// has succeeded, recorded in the history and published in its place. On error the editor is
/// left exactly as it was.
pub async fn process<Op: CanvasOp + ?Sized>(
    op: &Op,
    editor: &mut Editor,
) -> Result<Arc<Document>, CanvasOpError> {
    let old = editor.document().clone();
    let old_canvas = old.canvas();
    let mut new = old.create_copy();

    let canvas = op.new_canvas(old_canvas)?;
    let transform = CanvasTransform {
        matrix: op.canvas_transform(old_canvas, canvas),
        canvas,
        filter: op.filter(),
    };
    log::debug!(
        "{}: {old_canvas} -> {canvas}, {:?}",
        op.edit_name(),
        transform.matrix
    );

    new.image_coords_changed(&transform);
    visitor::transform_layers_with(&mut new, &transform, |content, transform| {
        op.transform_content(content, transform)
    })?;
    if op.affects_canvas_size() {
        new.set_canvas(canvas);
    }
    new.guides = old
        .guides
        .as_ref()
        .map(|guides| op.guides_for(guides, old_canvas, &transform));
    // Icons are cut from canvas sized content, so strictly after the canvas is in place.
    new.update_icon_images(editor.thumbnail_edge());

    let new = Arc::new(new);
    editor.history_mut().push(EditRecord::new(
        op.edit_name(),
        old,
        new.clone(),
        transform.matrix,
    ));
    editor.publish(new.clone());
    editor
        .messages()
        .show_status(&op.status_message(old_canvas, new.canvas()));
    Ok(new)
}
