use crate::raster::Filter;
use crate::state::canvas::Canvas;

/// An arbitrary affine transform between image spaces, in pixels. 0,0 is top left, +X Right, +Y down.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Matrix {
    /// Column-major matrix elements: x axis, y axis, translation.
    pub elements: [[f64; 2]; 3],
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Self = Self {
        elements: [[1.0, 0.0], [0.0, 1.0], [0.0, 0.0]],
    };
    #[must_use]
    pub fn translation(x: f64, y: f64) -> Self {
        Self {
            elements: [[1.0, 0.0], [0.0, 1.0], [x, y]],
        }
    }
    #[must_use]
    pub fn scale(x: f64, y: f64) -> Self {
        Self {
            elements: [[x, 0.0], [0.0, y], [0.0, 0.0]],
        }
    }
    /// Mirror across the vertical center line of a space `width` wide.
    #[must_use]
    pub fn flip_horizontal(width: f64) -> Self {
        Self {
            elements: [[-1.0, 0.0], [0.0, 1.0], [width, 0.0]],
        }
    }
    /// Mirror across the horizontal center line of a space `height` tall.
    #[must_use]
    pub fn flip_vertical(height: f64) -> Self {
        Self {
            elements: [[1.0, 0.0], [0.0, -1.0], [0.0, height]],
        }
    }
    /// Rotate a `width` x `height` space clockwise by `turns` quarter turns, such that the
    /// result again has its top left corner at the origin.
    #[must_use]
    pub fn quarter_turns(turns: u8, width: f64, height: f64) -> Self {
        match turns % 4 {
            0 => Self::IDENTITY,
            // (x, y) -> (h - y, x)
            1 => Self {
                elements: [[0.0, 1.0], [-1.0, 0.0], [height, 0.0]],
            },
            // (x, y) -> (w - x, h - y)
            2 => Self {
                elements: [[-1.0, 0.0], [0.0, -1.0], [width, height]],
            },
            // (x, y) -> (y, w - x)
            _ => Self {
                elements: [[0.0, -1.0], [1.0, 0.0], [0.0, width]],
            },
        }
    }
    /// A transform which applies `self`, and then `next`.
    #[must_use]
    pub fn then(&self, next: &Self) -> Self {
        let [[a, b], [c, d], [tx, ty]] = self.elements;
        let [[na, nb], [nc, nd], [ntx, nty]] = next.elements;
        Self {
            elements: [
                [na * a + nc * b, nb * a + nd * b],
                [na * c + nc * d, nb * c + nd * d],
                [na * tx + nc * ty + ntx, nb * tx + nd * ty + nty],
            ],
        }
    }
    #[must_use]
    pub fn apply(&self, [x, y]: [f64; 2]) -> [f64; 2] {
        let [[a, b], [c, d], [tx, ty]] = self.elements;
        [a * x + c * y + tx, b * x + d * y + ty]
    }
    /// The reverse mapping, or `None` if this transform collapses space.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        let [[a, b], [c, d], [tx, ty]] = self.elements;
        let det = a * d - b * c;
        if !det.is_finite() || det.abs() < f64::EPSILON {
            return None;
        }
        let (ia, ib, ic, id) = (d / det, -b / det, -c / det, a / det);
        Some(Self {
            elements: [
                [ia, ib],
                [ic, id],
                [-(ia * tx + ic * ty), -(ib * tx + id * ty)],
            ],
        })
    }
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
    /// Axes map onto themselves (possibly scaled or mirrored), no shear or rotation.
    #[must_use]
    pub fn is_axis_aligned(&self) -> bool {
        let [[_, b], [c, _], _] = self.elements;
        b == 0.0 && c == 0.0
    }
    /// Axes map onto each other, as in a 90 or 270 degree rotation.
    #[must_use]
    pub fn swaps_axes(&self) -> bool {
        let [[a, _], [_, d], _] = self.elements;
        a == 0.0 && d == 0.0
    }
    /// If this is nothing but a positive scale about the origin, the per-axis factors.
    #[must_use]
    pub fn as_scale(&self) -> Option<[f64; 2]> {
        let [[a, _], [_, d], [tx, ty]] = self.elements;
        (self.is_axis_aligned() && a > 0.0 && d > 0.0 && tx == 0.0 && ty == 0.0).then_some([a, d])
    }
}

impl From<[[f64; 2]; 3]> for Matrix {
    fn from(elements: [[f64; 2]; 3]) -> Self {
        Self { elements }
    }
}

impl From<Matrix> for [[f64; 2]; 3] {
    fn from(value: Matrix) -> Self {
        value.elements
    }
}

/// Everything a piece of content needs to follow a canvas operation: where old image space
/// lands, how big the resulting canvas is, and how to resample when scaling.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CanvasTransform {
    pub matrix: Matrix,
    pub canvas: Canvas,
    pub filter: Filter,
}
impl CanvasTransform {
    /// Leaves every pixel of a `canvas` sized document where it is.
    #[must_use]
    pub fn identity(canvas: Canvas) -> Self {
        Self {
            matrix: Matrix::IDENTITY,
            canvas,
            filter: Filter::Nearest,
        }
    }
}

#[cfg(test)]
mod test {
    use super::Matrix;

    fn close(a: [f64; 2], b: [f64; 2]) -> bool {
        (a[0] - b[0]).abs() < 1e-9 && (a[1] - b[1]).abs() < 1e-9
    }

    #[test]
    fn then_applies_in_order() {
        let scale_then_move = Matrix::scale(2.0, 3.0).then(&Matrix::translation(10.0, 20.0));
        assert!(close(scale_then_move.apply([1.0, 1.0]), [12.0, 23.0]));
        let move_then_scale = Matrix::translation(10.0, 20.0).then(&Matrix::scale(2.0, 3.0));
        assert!(close(move_then_scale.apply([1.0, 1.0]), [22.0, 63.0]));
    }
    #[test]
    fn inverse_round_trips() {
        let m = Matrix::quarter_turns(1, 40.0, 30.0).then(&Matrix::scale(0.5, 2.0));
        let inv = m.inverse().unwrap();
        for p in [[0.0, 0.0], [3.5, 7.25], [40.0, 30.0]] {
            assert!(close(inv.apply(m.apply(p)), p));
        }
        assert!(Matrix::scale(0.0, 1.0).inverse().is_none());
    }
    #[test]
    fn quarter_turn_corners() {
        // A 40 wide, 30 tall space becomes 30 wide, 40 tall.
        let cw = Matrix::quarter_turns(1, 40.0, 30.0);
        assert!(close(cw.apply([0.0, 0.0]), [30.0, 0.0]));
        assert!(close(cw.apply([40.0, 30.0]), [0.0, 40.0]));
        let half = Matrix::quarter_turns(2, 40.0, 30.0);
        assert!(close(half.apply([0.0, 0.0]), [40.0, 30.0]));
        let ccw = Matrix::quarter_turns(3, 40.0, 30.0);
        assert!(close(ccw.apply([0.0, 0.0]), [0.0, 40.0]));
        assert!(close(ccw.apply([40.0, 30.0]), [30.0, 0.0]));
        assert!(Matrix::quarter_turns(4, 40.0, 30.0).is_identity());
    }
    #[test]
    fn classification() {
        assert_eq!(Matrix::scale(2.0, 0.5).as_scale(), Some([2.0, 0.5]));
        assert_eq!(Matrix::translation(1.0, 0.0).as_scale(), None);
        assert_eq!(Matrix::flip_horizontal(10.0).as_scale(), None);
        assert!(Matrix::flip_vertical(10.0).is_axis_aligned());
        assert!(Matrix::quarter_turns(1, 1.0, 1.0).swaps_axes());
        assert!(!Matrix::quarter_turns(2, 1.0, 1.0).swaps_axes());
    }
}
