use super::{canvas::Canvas, transform::Matrix};

/// Axis-aligned selected area, in image pixels.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Selection {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}
impl Selection {
    /// `None` for an empty or non-finite rectangle.
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Option<Self> {
        let finite = [x, y, width, height].iter().all(|v| v.is_finite());
        (finite && width > 0.0 && height > 0.0).then_some(Self {
            x,
            y,
            width,
            height,
        })
    }
    /// `[x, y, width, height]`
    #[must_use]
    pub fn rect(&self) -> [f64; 4] {
        [self.x, self.y, self.width, self.height]
    }
    /// Bounding box of the corners carried through `matrix`, clipped to `canvas`.
    /// `None` if nothing of it remains on the canvas.
    #[must_use]
    pub fn transformed(&self, matrix: &Matrix, canvas: &Canvas) -> Option<Self> {
        let corners = [
            [self.x, self.y],
            [self.x + self.width, self.y],
            [self.x, self.y + self.height],
            [self.x + self.width, self.y + self.height],
        ]
        .map(|corner| matrix.apply(corner));
        let [width, height] = canvas.size();
        let (mut min, mut max) = ([f64::INFINITY; 2], [f64::NEG_INFINITY; 2]);
        for [x, y] in corners {
            min = [min[0].min(x), min[1].min(y)];
            max = [max[0].max(x), max[1].max(y)];
        }
        let left = min[0].max(0.0);
        let top = min[1].max(0.0);
        let right = max[0].min(width);
        let bottom = max[1].min(height);
        Self::new(left, top, right - left, bottom - top)
    }
}
