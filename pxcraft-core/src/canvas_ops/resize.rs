use super::{CanvasOp, CanvasOpError};
use crate::raster::Filter;
use crate::state::{canvas::Canvas, transform::Matrix};

/// Scale the whole image to a new size.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Resize {
    pub width: u32,
    pub height: u32,
    pub filter: Filter,
}
impl Resize {
    /// Resize to `width`, keeping the aspect ratio of `canvas`.
    #[must_use]
    pub fn to_width(canvas: Canvas, width: u32, filter: Filter) -> Self {
        let [old_w, old_h] = canvas.size();
        let height = (f64::from(width) * old_h / old_w).round().max(1.0) as u32;
        Self {
            width,
            height,
            filter,
        }
    }
}
impl CanvasOp for Resize {
    fn new_canvas(&self, _old: Canvas) -> Result<Canvas, CanvasOpError> {
        Ok(Canvas::new(self.width, self.height)?)
    }
    fn canvas_transform(&self, old: Canvas, new: Canvas) -> Matrix {
        let [old_w, old_h] = old.size();
        let [new_w, new_h] = new.size();
        Matrix::scale(new_w / old_w, new_h / old_h)
    }
    fn affects_canvas_size(&self) -> bool {
        true
    }
    fn edit_name(&self) -> String {
        "Resize".to_owned()
    }
    fn status_message(&self, _old: Canvas, new: Canvas) -> String {
        format!("Image resized to {new}")
    }
    fn filter(&self) -> Filter {
        self.filter
    }
}
