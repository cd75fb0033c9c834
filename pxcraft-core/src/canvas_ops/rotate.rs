use super::{CanvasOp, CanvasOpError};
use crate::state::{canvas::Canvas, transform::Matrix};

/// Clockwise rotation by a whole number of quarter turns.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
pub enum QuarterTurn {
    #[strum(to_string = "90°", serialize = "90")]
    Cw90,
    #[strum(to_string = "180°", serialize = "180")]
    Cw180,
    #[strum(to_string = "270°", serialize = "270")]
    Cw270,
}
impl QuarterTurn {
    #[must_use]
    pub fn turns(self) -> u8 {
        match self {
            Self::Cw90 => 1,
            Self::Cw180 => 2,
            Self::Cw270 => 3,
        }
    }
    /// Width and height trade places.
    #[must_use]
    pub fn swaps_axes(self) -> bool {
        self.turns() % 2 == 1
    }
}

/// Rotate the whole image, canvas included.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Rotate {
    pub angle: QuarterTurn,
}
impl CanvasOp for Rotate {
    fn new_canvas(&self, old: Canvas) -> Result<Canvas, CanvasOpError> {
        if self.angle.swaps_axes() {
            Ok(Canvas::new(old.height(), old.width())?)
        } else {
            Ok(old)
        }
    }
    fn canvas_transform(&self, old: Canvas, _new: Canvas) -> Matrix {
        let [width, height] = old.size();
        Matrix::quarter_turns(self.angle.turns(), width, height)
    }
    fn affects_canvas_size(&self) -> bool {
        self.angle.swaps_axes()
    }
    fn edit_name(&self) -> String {
        format!("Rotate {}", self.angle)
    }
    fn status_message(&self, _old: Canvas, _new: Canvas) -> String {
        format!("Image rotated {} clockwise", self.angle)
    }
}
