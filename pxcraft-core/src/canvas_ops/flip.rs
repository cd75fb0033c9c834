use super::{CanvasOp, CanvasOpError};
use crate::state::{canvas::Canvas, transform::Matrix};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(ascii_case_insensitive)]
pub enum FlipDirection {
    /// Mirror left to right.
    #[strum(to_string = "horizontal", serialize = "h")]
    Horizontal,
    /// Mirror top to bottom.
    #[strum(to_string = "vertical", serialize = "v")]
    Vertical,
}

/// Mirror the whole image.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Flip {
    pub direction: FlipDirection,
}
impl CanvasOp for Flip {
    fn new_canvas(&self, old: Canvas) -> Result<Canvas, CanvasOpError> {
        Ok(old)
    }
    fn canvas_transform(&self, old: Canvas, _new: Canvas) -> Matrix {
        let [width, height] = old.size();
        match self.direction {
            FlipDirection::Horizontal => Matrix::flip_horizontal(width),
            FlipDirection::Vertical => Matrix::flip_vertical(height),
        }
    }
    fn affects_canvas_size(&self) -> bool {
        false
    }
    fn edit_name(&self) -> String {
        match self.direction {
            FlipDirection::Horizontal => "Flip Horizontal",
            FlipDirection::Vertical => "Flip Vertical",
        }
        .to_owned()
    }
    fn status_message(&self, _old: Canvas, _new: Canvas) -> String {
        format!("Image flipped {}ly", self.direction)
    }
}

#[cfg(test)]
mod test {
    use super::{Flip, FlipDirection};
    use crate::canvas_ops::CanvasOp;
    use crate::state::canvas::Canvas;

    #[test]
    fn keeps_canvas() {
        let old = Canvas::new(30, 20).unwrap();
        let op = Flip {
            direction: FlipDirection::Vertical,
        };
        let new = op.new_canvas(old).unwrap();
        assert_eq!(new, old);
        assert!(!op.affects_canvas_size());
        assert_eq!(op.canvas_transform(old, new).apply([5.0, 0.0]), [5.0, 20.0]);
        assert_eq!(op.status_message(old, new), "Image flipped vertically");
    }
    #[test]
    fn parse() {
        assert_eq!("H".parse(), Ok(FlipDirection::Horizontal));
        assert_eq!("vertical".parse(), Ok(FlipDirection::Vertical));
    }
}
