//! # Rasters
//!
//! Pixel content of layers and masks. Every raster in a document is canvas sized.
//!
//! Pixel buffers are reference counted. Cloning a raster (and so snapshotting a document) shares
//! them, and the only ways to get at them mutably go through [`Arc::make_mut`], which copies a shared
//! buffer first. An old snapshot held by the undo history can therefore never observe a later edit.

use std::sync::Arc;

use az::CheckedAs;
use rayon::prelude::*;

use crate::state::{
    canvas::{Canvas, InvalidDimensions},
    transform::Matrix,
};

/// Largest raster we agree to allocate, in pixels. 1GiB of ARGB.
pub const MAX_PIXELS: u64 = 1 << 28;

/// Resampling filter used when content is scaled.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Debug,
    Hash,
    Default,
    strum::EnumIter,
    strum::EnumString,
    strum::Display,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Filter {
    Nearest,
    #[default]
    Triangle,
    CatmullRom,
    Lanczos3,
}
impl Filter {
    fn image_filter(self) -> image::imageops::FilterType {
        use image::imageops::FilterType;
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Triangle => FilterType::Triangle,
            Self::CatmullRom => FilterType::CatmullRom,
            Self::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum PixelFormat {
    /// One packed `0xAARRGGBB` word per pixel.
    Argb,
    /// One byte of intensity per pixel.
    Gray,
}
impl PixelFormat {
    pub const ARGB_TAG: i32 = 2;
    pub const GRAY_TAG: i32 = 10;
    /// Tag identifying this format in a project file's pixel block.
    #[must_use]
    pub fn tag(self) -> i32 {
        match self {
            Self::Argb => Self::ARGB_TAG,
            Self::Gray => Self::GRAY_TAG,
        }
    }
    #[must_use]
    pub fn from_tag(tag: i32) -> Option<Self> {
        match tag {
            Self::ARGB_TAG => Some(Self::Argb),
            Self::GRAY_TAG => Some(Self::Gray),
            _ => None,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    #[error(transparent)]
    Dimensions(#[from] InvalidDimensions),
    #[error("{width}x{height} exceeds the limit of {} pixels", MAX_PIXELS)]
    TooLarge { width: u32, height: u32 },
    #[error("pixel buffer holds {actual} values, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("transform is not invertible")]
    Singular,
}

#[derive(Clone, PartialEq, Eq)]
enum Pixels {
    Argb(Arc<Vec<u32>>),
    Gray(Arc<Vec<u8>>),
}

#[derive(Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Pixels,
}

/// Number of pixels in a `width` x `height` raster, if we're willing to hold one.
fn checked_len(width: u32, height: u32) -> Result<usize, RasterError> {
    Canvas::new(width, height)?;
    let count = u64::from(width) * u64::from(height);
    if count > MAX_PIXELS {
        return Err(RasterError::TooLarge { width, height });
    }
    count
        .checked_as()
        .ok_or(RasterError::TooLarge { width, height })
}

fn argb_to_rgba(argb: u32) -> [u8; 4] {
    let [a, r, g, b] = argb.to_be_bytes();
    [r, g, b, a]
}
fn rgba_to_argb([r, g, b, a]: [u8; 4]) -> u32 {
    u32::from_be_bytes([a, r, g, b])
}

impl Raster {
    pub fn new_argb(width: u32, height: u32, fill: u32) -> Result<Self, RasterError> {
        let len = checked_len(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: Pixels::Argb(Arc::new(vec![fill; len])),
        })
    }
    pub fn new_gray(width: u32, height: u32, fill: u8) -> Result<Self, RasterError> {
        let len = checked_len(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: Pixels::Gray(Arc::new(vec![fill; len])),
        })
    }
    /// Wrap row-major ARGB pixels.
    pub fn from_argb(width: u32, height: u32, pixels: Vec<u32>) -> Result<Self, RasterError> {
        let expected = checked_len(width, height)?;
        if pixels.len() != expected {
            return Err(RasterError::LengthMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels: Pixels::Argb(Arc::new(pixels)),
        })
    }
    /// Wrap row-major gray pixels.
    pub fn from_gray(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, RasterError> {
        let expected = checked_len(width, height)?;
        if pixels.len() != expected {
            return Err(RasterError::LengthMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels: Pixels::Gray(Arc::new(pixels)),
        })
    }
    pub fn from_rgba_image(image: &image::RgbaImage) -> Result<Self, RasterError> {
        let pixels = image.pixels().map(|p| rgba_to_argb(p.0)).collect();
        Self::from_argb(image.width(), image.height(), pixels)
    }
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }
    #[must_use]
    pub fn format(&self) -> PixelFormat {
        match self.pixels {
            Pixels::Argb(_) => PixelFormat::Argb,
            Pixels::Gray(_) => PixelFormat::Gray,
        }
    }
    #[must_use]
    pub fn pixel_count(&self) -> usize {
        match &self.pixels {
            Pixels::Argb(data) => data.len(),
            Pixels::Gray(data) => data.len(),
        }
    }
    #[must_use]
    pub fn argb(&self) -> Option<&[u32]> {
        match &self.pixels {
            Pixels::Argb(data) => Some(data),
            Pixels::Gray(_) => None,
        }
    }
    #[must_use]
    pub fn gray(&self) -> Option<&[u8]> {
        match &self.pixels {
            Pixels::Gray(data) => Some(data),
            Pixels::Argb(_) => None,
        }
    }
    /// Mutable ARGB pixels, unsharing the buffer first if any snapshot still holds it.
    pub fn argb_mut(&mut self) -> Option<&mut [u32]> {
        match &mut self.pixels {
            Pixels::Argb(data) => Some(Arc::make_mut(data).as_mut_slice()),
            Pixels::Gray(_) => None,
        }
    }
    /// Mutable gray pixels, unsharing the buffer first if any snapshot still holds it.
    pub fn gray_mut(&mut self) -> Option<&mut [u8]> {
        match &mut self.pixels {
            Pixels::Gray(data) => Some(Arc::make_mut(data).as_mut_slice()),
            Pixels::Argb(_) => None,
        }
    }
    /// The pixel at `x, y` as ARGB. Gray pixels read as opaque gray.
    #[must_use]
    pub fn argb_at(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y as usize * self.width as usize + x as usize;
        match &self.pixels {
            Pixels::Argb(data) => data.get(idx).copied(),
            Pixels::Gray(data) => data
                .get(idx)
                .map(|&v| u32::from_be_bytes([0xFF, v, v, v])),
        }
    }
    /// True if both rasters are backed by the very same pixel buffer.
    #[must_use]
    pub fn shares_pixels_with(&self, other: &Self) -> bool {
        match (&self.pixels, &other.pixels) {
            (Pixels::Argb(a), Pixels::Argb(b)) => Arc::ptr_eq(a, b),
            (Pixels::Gray(a), Pixels::Gray(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
    #[must_use]
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        image::RgbaImage::from_fn(self.width, self.height, |x, y| {
            image::Rgba(argb_to_rgba(self.argb_at(x, y).unwrap_or(0)))
        })
    }
    /// The gray pixels as an image, `None` for color rasters.
    #[must_use]
    pub fn to_gray_image(&self) -> Option<image::GrayImage> {
        let data = self.gray()?;
        let width = self.width as usize;
        Some(image::GrayImage::from_fn(self.width, self.height, |x, y| {
            image::Luma([data[y as usize * width + x as usize]])
        }))
    }
    /// Scale to exactly `width` x `height`.
    pub fn resized(&self, width: u32, height: u32, filter: Filter) -> Result<Self, RasterError> {
        checked_len(width, height)?;
        let filter = filter.image_filter();
        match self.to_gray_image() {
            Some(gray) => {
                let out = image::imageops::resize(&gray, width, height, filter);
                Self::from_gray(width, height, out.into_raw())
            }
            None => {
                let out = image::imageops::resize(&self.to_rgba_image(), width, height, filter);
                Self::from_rgba_image(&out)
            }
        }
    }
    /// Map this raster through `matrix` onto a fresh `width` x `height` raster.
    ///
    /// Area with no source pixels is transparent for ARGB and white for gray, so a mask grown
    /// this way reveals its layer there.
    ///
    /// The identity on an unchanged size shares the pixels as-is. Pure scales resample with
    /// `filter`. Everything else samples the nearest source pixel, which is exact for integer
    /// translations, flips and quarter turns.
    pub fn transformed(
        &self,
        matrix: &Matrix,
        width: u32,
        height: u32,
        filter: Filter,
    ) -> Result<Self, RasterError> {
        if matrix.is_identity() && width == self.width && height == self.height {
            return Ok(self.clone());
        }
        if let Some([sx, sy]) = matrix.as_scale() {
            let scaled_w = (f64::from(self.width) * sx).round();
            let scaled_h = (f64::from(self.height) * sy).round();
            if scaled_w == f64::from(width) && scaled_h == f64::from(height) {
                return self.resized(width, height, filter);
            }
        }
        let inverse = matrix.inverse().ok_or(RasterError::Singular)?;
        self.resampled_nearest(&inverse, width, height)
    }
    fn resampled_nearest(
        &self,
        inverse: &Matrix,
        width: u32,
        height: u32,
    ) -> Result<Self, RasterError> {
        let len = checked_len(width, height)?;
        let (src_w, src_h) = (f64::from(self.width), f64::from(self.height));
        let stride = self.width as usize;
        // Sample at pixel centers.
        let source_index = |x: usize, y: usize| -> Option<usize> {
            let [sx, sy] = inverse.apply([x as f64 + 0.5, y as f64 + 0.5]);
            let (sx, sy) = (sx.floor(), sy.floor());
            if (0.0..src_w).contains(&sx) && (0.0..src_h).contains(&sy) {
                Some(sy as usize * stride + sx as usize)
            } else {
                None
            }
        };
        let pixels = match &self.pixels {
            Pixels::Argb(src) => Pixels::Argb(Arc::new(map_rows(src, width, len, 0, source_index))),
            Pixels::Gray(src) => {
                Pixels::Gray(Arc::new(map_rows(src, width, len, u8::MAX, source_index)))
            }
        };
        Ok(Self {
            width,
            height,
            pixels,
        })
    }
    /// A copy scaled to fit within `max_edge` on its longest side, for layer icons.
    #[must_use]
    pub fn thumbnail(&self, max_edge: u32) -> image::RgbaImage {
        let max_edge = max_edge.max(1);
        let rgba = self.to_rgba_image();
        let longest = self.width.max(self.height);
        if longest <= max_edge {
            return rgba;
        }
        let scale = f64::from(max_edge) / f64::from(longest);
        let fit = |len: u32| ((f64::from(len) * scale).round() as u32).clamp(1, max_edge);
        image::imageops::thumbnail(&rgba, fit(self.width), fit(self.height))
    }
}

/// Build a `len` long row-major buffer `width` wide, taking each pixel from `src` at the index
/// `source_index` names, or `background` where it names none. Rows are filled in parallel.
fn map_rows<T, F>(src: &[T], width: u32, len: usize, background: T, source_index: F) -> Vec<T>
where
    T: Copy + Send + Sync,
    F: Fn(usize, usize) -> Option<usize> + Sync,
{
    let mut out = vec![background; len];
    out.par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.iter_mut().enumerate() {
                if let Some(value) = source_index(x, y).and_then(|idx| src.get(idx)) {
                    *px = *value;
                }
            }
        });
    out
}

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::{Filter, PixelFormat, Raster, RasterError};
    use crate::state::transform::Matrix;

    /// 4x3 raster where every pixel is distinct.
    fn numbered() -> Raster {
        Raster::from_argb(4, 3, (0..12).map(|i| 0xFF00_0000 | i).collect()).unwrap()
    }

    #[test]
    fn rejects_bad_buffers() {
        assert!(matches!(
            Raster::from_argb(2, 2, vec![0; 3]),
            Err(RasterError::LengthMismatch {
                expected: 4,
                actual: 3
            })
        ));
        assert!(matches!(
            Raster::new_gray(0, 4, 0),
            Err(RasterError::Dimensions(_))
        ));
        assert!(matches!(
            Raster::new_argb(1 << 15, 1 << 14, 0),
            Err(RasterError::TooLarge { .. })
        ));
    }
    #[test]
    fn identity_shares_pixels() {
        let raster = numbered();
        let same = raster
            .transformed(&Matrix::IDENTITY, 4, 3, Filter::Lanczos3)
            .unwrap();
        assert_eq!(same, raster);
        assert!(same.shares_pixels_with(&raster));
    }
    #[test]
    fn copy_on_write() {
        let original = numbered();
        let mut copy = original.clone();
        copy.argb_mut().unwrap()[0] = 0;
        assert!(!copy.shares_pixels_with(&original));
        assert_eq!(original.argb_at(0, 0), Some(0xFF00_0000));
        assert_eq!(copy.argb_at(0, 0), Some(0));
    }
    #[test]
    fn gray_copy_on_write() {
        let original = Raster::new_gray(3, 2, 200).unwrap();
        let mut copy = original.clone();
        assert!(copy.argb_mut().is_none());
        copy.gray_mut().unwrap()[5] = 7;
        assert!(!copy.shares_pixels_with(&original));
        assert_eq!(original.gray().unwrap(), &[200; 6]);
        assert_eq!(copy.gray().unwrap()[5], 7);
    }
    #[test]
    fn translation_is_exact() {
        let raster = numbered();
        // Move content one right, one down, onto a bigger raster.
        let moved = raster
            .transformed(&Matrix::translation(1.0, 1.0), 6, 5, Filter::Triangle)
            .unwrap();
        assert_eq!(moved.argb_at(0, 0), Some(0));
        assert_eq!(moved.argb_at(1, 1), raster.argb_at(0, 0));
        assert_eq!(moved.argb_at(4, 3), raster.argb_at(3, 2));
        assert_eq!(moved.argb_at(5, 4), Some(0));
        // And back out again, as a crop.
        let cropped = moved
            .transformed(&Matrix::translation(-1.0, -1.0), 4, 3, Filter::Triangle)
            .unwrap();
        assert_eq!(cropped, raster);
    }
    #[test]
    fn quarter_turn_is_exact() {
        let raster = numbered();
        let turned = raster
            .transformed(&Matrix::quarter_turns(1, 4.0, 3.0), 3, 4, Filter::Triangle)
            .unwrap();
        // Top left lands top right, bottom left lands top left.
        assert_eq!(turned.argb_at(2, 0), raster.argb_at(0, 0));
        assert_eq!(turned.argb_at(0, 0), raster.argb_at(0, 2));
        assert_eq!(turned.argb_at(0, 3), raster.argb_at(3, 2));
        let back = turned
            .transformed(&Matrix::quarter_turns(3, 3.0, 4.0), 4, 3, Filter::Triangle)
            .unwrap();
        assert_eq!(back, raster);
    }
    #[test]
    fn flip_is_exact() {
        let raster = numbered();
        let flipped = raster
            .transformed(&Matrix::flip_horizontal(4.0), 4, 3, Filter::Triangle)
            .unwrap();
        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(flipped.argb_at(x, y), raster.argb_at(3 - x, y));
            }
        }
    }
    #[test]
    fn gray_background_is_white() {
        let mask = Raster::new_gray(2, 2, 0).unwrap();
        let grown = mask
            .transformed(&Matrix::translation(1.0, 0.0), 3, 2, Filter::Nearest)
            .unwrap();
        assert_eq!(grown.format(), PixelFormat::Gray);
        assert_eq!(grown.gray().unwrap(), &[255, 0, 0, 255, 0, 0]);
    }
    #[test]
    fn scale_resizes() {
        let raster = Raster::new_argb(10, 4, 0xFF11_2233).unwrap();
        let scaled = raster
            .transformed(&Matrix::scale(2.0, 0.5), 20, 2, Filter::Triangle)
            .unwrap();
        assert_eq!((scaled.width(), scaled.height()), (20, 2));
        // Uniform content stays uniform whatever the filter.
        assert!(scaled.argb().unwrap().iter().all(|&p| p == 0xFF11_2233));
    }
    #[test]
    fn thumbnail_fits() {
        let raster = Raster::new_gray(200, 50, 128).unwrap();
        let thumb = raster.thumbnail(64);
        assert_eq!(thumb.dimensions(), (64, 16));
        let small = Raster::new_gray(10, 5, 128).unwrap().thumbnail(64);
        assert_eq!(small.dimensions(), (10, 5));
    }
    #[test]
    fn filter_names() {
        assert_eq!("lanczos3".parse(), Ok(Filter::Lanczos3));
        assert_eq!("Catmull_Rom".parse(), Ok(Filter::CatmullRom));
        assert_eq!(Filter::CatmullRom.to_string(), "catmull_rom");
        assert!("bicubic".parse::<Filter>().is_err());
    }
}
