use super::{CanvasOp, CanvasOpError};
use crate::state::{canvas::Canvas, transform::Matrix};

/// Add margins around the canvas. Negative margins cut into it instead.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct EnlargeCanvas {
    pub north: i32,
    pub east: i32,
    pub south: i32,
    pub west: i32,
}
impl CanvasOp for EnlargeCanvas {
    fn new_canvas(&self, old: Canvas) -> Result<Canvas, CanvasOpError> {
        let width = i64::from(old.width()) + i64::from(self.west) + i64::from(self.east);
        let height = i64::from(old.height()) + i64::from(self.north) + i64::from(self.south);
        Ok(Canvas::new(width, height)?)
    }
    fn canvas_transform(&self, _old: Canvas, _new: Canvas) -> Matrix {
        Matrix::translation(f64::from(self.west), f64::from(self.north))
    }
    fn affects_canvas_size(&self) -> bool {
        true
    }
    fn edit_name(&self) -> String {
        "Enlarge Canvas".to_owned()
    }
    fn status_message(&self, old: Canvas, new: Canvas) -> String {
        format!("Canvas enlarged from {old} to {new}")
    }
}

#[cfg(test)]
mod test {
    use super::EnlargeCanvas;
    use crate::canvas_ops::CanvasOp;
    use crate::state::canvas::Canvas;

    #[test]
    fn margins() {
        let old = Canvas::new(100, 100).unwrap();
        let op = EnlargeCanvas {
            north: 10,
            east: 25,
            south: 10,
            west: 25,
        };
        let new = op.new_canvas(old).unwrap();
        assert_eq!(new, Canvas::new(150, 120).unwrap());
        assert_eq!(op.canvas_transform(old, new).apply([50.0, 0.0]), [75.0, 10.0]);
    }
    #[test]
    fn shrinking() {
        let old = Canvas::new(100, 100).unwrap();
        let op = EnlargeCanvas {
            west: -40,
            east: -40,
            ..Default::default()
        };
        assert_eq!(op.new_canvas(old).unwrap(), Canvas::new(20, 100).unwrap());
        let too_far = EnlargeCanvas {
            west: -100,
            ..Default::default()
        };
        assert!(too_far.new_canvas(old).is_err());
    }
}
