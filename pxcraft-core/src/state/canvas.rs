/// The pixel frame of a document, independent of any single layer's content.
///
/// Always at least 1x1 and never larger than the project format can store per axis.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Canvas {
    width: u32,
    height: u32,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid dimensions {width}x{height}, both must be within 1..={}", i32::MAX)]
pub struct InvalidDimensions {
    pub width: i64,
    pub height: i64,
}

impl Canvas {
    /// Wide integer inputs so that computed sizes (for example a canvas shrunk by negative
    /// margins) are checked here instead of wrapping at the call site.
    pub fn new(width: impl Into<i64>, height: impl Into<i64>) -> Result<Self, InvalidDimensions> {
        let (width, height) = (width.into(), height.into());
        let valid = 1..=i64::from(i32::MAX);
        match (u32::try_from(width), u32::try_from(height)) {
            (Ok(w), Ok(h)) if valid.contains(&width) && valid.contains(&height) => Ok(Self {
                width: w,
                height: h,
            }),
            _ => Err(InvalidDimensions { width, height }),
        }
    }
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }
    /// Size as `[width, height]` floats, for geometry.
    #[must_use]
    pub fn size(&self) -> [f64; 2] {
        [f64::from(self.width), f64::from(self.height)]
    }
    #[must_use]
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl std::fmt::Display for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[cfg(test)]
mod test {
    use super::{Canvas, InvalidDimensions};

    #[test]
    fn valid() {
        let canvas = Canvas::new(100, 20).unwrap();
        assert_eq!((canvas.width(), canvas.height()), (100, 20));
        assert_eq!(canvas.to_string(), "100x20");
        assert!(Canvas::new(1, 1).is_ok());
        assert!(Canvas::new(i32::MAX, 1).is_ok());
    }
    #[test]
    fn degenerate() {
        assert_eq!(
            Canvas::new(0, 10),
            Err(InvalidDimensions {
                width: 0,
                height: 10
            })
        );
        assert!(Canvas::new(10, -5).is_err());
        assert!(Canvas::new(i64::from(i32::MAX) + 1, 1).is_err());
    }
}
