use super::{canvas::Canvas, transform::Matrix};

/// User placed alignment lines, in absolute canvas pixels.
///
/// Positions are tied to the canvas they were placed on, so a canvas operation rebuilds them
/// through [`Guides::transformed`] rather than copying them over.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Guides {
    /// Y positions of lines running left to right.
    horizontals: Vec<f64>,
    /// X positions of lines running top to bottom.
    verticals: Vec<f64>,
}
impl Guides {
    /// Non-finite positions are discarded.
    #[must_use]
    pub fn new(horizontals: Vec<f64>, verticals: Vec<f64>) -> Self {
        let mut guides = Self {
            horizontals,
            verticals,
        };
        guides.horizontals.retain(|p| p.is_finite());
        guides.verticals.retain(|p| p.is_finite());
        guides
    }
    #[must_use]
    pub fn horizontals(&self) -> &[f64] {
        &self.horizontals
    }
    #[must_use]
    pub fn verticals(&self) -> &[f64] {
        &self.verticals
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.horizontals.is_empty() && self.verticals.is_empty()
    }
    /// Carry every line through `matrix` onto `canvas`.
    ///
    /// A quarter turn turns horizontal lines vertical and vice versa. Lines landing outside the
    /// new canvas are dropped, as are all lines under a transform that doesn't keep them
    /// axis-aligned.
    #[must_use]
    pub fn transformed(&self, matrix: &Matrix, canvas: &Canvas) -> Self {
        let [width, height] = canvas.size();
        let mut out = Self::default();
        if matrix.is_axis_aligned() {
            out.verticals = self
                .verticals
                .iter()
                .map(|&x| matrix.apply([x, 0.0])[0])
                .collect();
            out.horizontals = self
                .horizontals
                .iter()
                .map(|&y| matrix.apply([0.0, y])[1])
                .collect();
        } else if matrix.swaps_axes() {
            out.horizontals = self
                .verticals
                .iter()
                .map(|&x| matrix.apply([x, 0.0])[1])
                .collect();
            out.verticals = self
                .horizontals
                .iter()
                .map(|&y| matrix.apply([0.0, y])[0])
                .collect();
        } else {
            log::debug!("dropping guides under a non axis-aligned transform");
        }
        out.verticals.retain(|x| (0.0..=width).contains(x));
        out.horizontals.retain(|y| (0.0..=height).contains(y));
        out
    }
}
