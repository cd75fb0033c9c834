use super::{CanvasOp, CanvasOpError};
use crate::state::{canvas::Canvas, selection::Selection, transform::Matrix};

/// Cut the canvas down to a rectangle within it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Crop {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}
impl Crop {
    /// Crop to the whole pixels touched by `selection`, within `canvas`.
    #[must_use]
    pub fn to_selection(selection: &Selection, canvas: Canvas) -> Option<Self> {
        let [x, y, width, height] = selection.rect();
        let [canvas_w, canvas_h] = canvas.size();
        let left = x.floor().clamp(0.0, canvas_w);
        let top = y.floor().clamp(0.0, canvas_h);
        let right = (x + width).ceil().clamp(0.0, canvas_w);
        let bottom = (y + height).ceil().clamp(0.0, canvas_h);
        (right > left && bottom > top).then(|| Self {
            x: left as u32,
            y: top as u32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        })
    }
}
impl CanvasOp for Crop {
    fn new_canvas(&self, old: Canvas) -> Result<Canvas, CanvasOpError> {
        let new = Canvas::new(self.width, self.height)?;
        let fits = |start: u32, len: u32, max: u32| {
            u64::from(start) + u64::from(len) <= u64::from(max)
        };
        if fits(self.x, self.width, old.width()) && fits(self.y, self.height, old.height()) {
            Ok(new)
        } else {
            Err(CanvasOpError::CropOutOfBounds {
                x: self.x,
                y: self.y,
                width: self.width,
                height: self.height,
                canvas: old,
            })
        }
    }
    fn canvas_transform(&self, _old: Canvas, _new: Canvas) -> Matrix {
        Matrix::translation(-f64::from(self.x), -f64::from(self.y))
    }
    fn affects_canvas_size(&self) -> bool {
        true
    }
    fn edit_name(&self) -> String {
        "Crop".to_owned()
    }
    fn status_message(&self, _old: Canvas, new: Canvas) -> String {
        format!("Image cropped to {new}")
    }
}
