//! Writing a document graph, each entity writing its own fields in a fixed order.
//! Everything is big-endian.

use std::io::{Error as IOError, ErrorKind as IOErrorKind, Result as IOResult, Write};

use az::CheckedCast;
use image::ImageEncoder;

use super::tracking::{SubtaskTracker, Tracker};
use super::{layer_tags, WRITE_UNITS};
use crate::raster::{PixelFormat, Raster};
use crate::state::{
    document::Document,
    guides::Guides,
    layer::{Adjustment, Layer, LayerKind, LayerMask, TextContent},
    selection::Selection,
    transform::Matrix,
};

/// Progress is reported per image in this many steps.
const IMAGE_STEPS: usize = 20;

pub(super) struct Encoder<'t, W> {
    writer: W,
    progress: &'t dyn Tracker,
    /// Share of [`WRITE_UNITS`] each image accounts for.
    image_share: f64,
}
impl<'t, W: Write> Encoder<'t, W> {
    pub fn new(writer: W, progress: &'t dyn Tracker, images: usize) -> Self {
        let image_share = if images == 0 {
            0.0
        } else {
            WRITE_UNITS as f64 / images as f64
        };
        Self {
            writer,
            progress,
            image_share,
        }
    }
    pub fn into_inner(self) -> W {
        self.writer
    }
    fn u8(&mut self, value: u8) -> IOResult<()> {
        self.writer.write_all(&[value])
    }
    fn bool(&mut self, value: bool) -> IOResult<()> {
        self.u8(value.into())
    }
    fn i32(&mut self, value: i32) -> IOResult<()> {
        self.writer.write_all(&value.to_be_bytes())
    }
    fn u32(&mut self, value: u32) -> IOResult<()> {
        self.writer.write_all(&value.to_be_bytes())
    }
    /// Sizes and counts are stored as `i32`.
    fn len(&mut self, len: impl CheckedCast<i32>) -> IOResult<()> {
        let len = len
            .checked_cast()
            .ok_or_else(|| IOError::other("length doesn't fit the project format"))?;
        self.i32(len)
    }
    fn f32(&mut self, value: f32) -> IOResult<()> {
        self.writer.write_all(&value.to_bits().to_be_bytes())
    }
    fn f64(&mut self, value: f64) -> IOResult<()> {
        self.writer.write_all(&value.to_bits().to_be_bytes())
    }
    fn string(&mut self, value: &str) -> IOResult<()> {
        self.len(value.len())?;
        self.writer.write_all(value.as_bytes())
    }
    fn matrix(&mut self, matrix: &Matrix) -> IOResult<()> {
        for value in matrix.elements.iter().flatten() {
            self.f64(*value)?;
        }
        Ok(())
    }
    /// Fails before writing anything if a raster doesn't match the canvas, as it couldn't be
    /// read back.
    pub fn document(&mut self, document: &Document) -> IOResult<()> {
        document
            .check_sizes()
            .map_err(|err| IOError::new(IOErrorKind::InvalidInput, err))?;
        let canvas = document.canvas();
        self.string(&document.name)?;
        self.len(canvas.width())?;
        self.len(canvas.height())?;
        self.len(document.layers().len())?;
        for layer in document.layers() {
            self.layer(layer)?;
        }
        self.len(document.active_layer_index())?;
        self.bool(document.guides.is_some())?;
        if let Some(guides) = &document.guides {
            self.guides(guides)?;
        }
        self.bool(document.selection.is_some())?;
        if let Some(selection) = &document.selection {
            self.selection(selection)?;
        }
        Ok(())
    }
    fn layer(&mut self, layer: &Layer) -> IOResult<()> {
        let tag = match &layer.kind {
            LayerKind::Image(_) => layer_tags::IMAGE,
            LayerKind::Text(_) => layer_tags::TEXT,
            LayerKind::Adjustment(_) => layer_tags::ADJUSTMENT,
        };
        self.u8(tag)?;
        self.string(&layer.name)?;
        self.bool(layer.visible)?;
        self.f32(layer.blend.opacity.get())?;
        self.u8(layer.blend.mode.code())?;
        match &layer.kind {
            LayerKind::Image(image) => self.pixels(&image.raster)?,
            LayerKind::Text(text) => self.text(text)?,
            LayerKind::Adjustment(adjustment) => self.adjustment(*adjustment)?,
        }
        self.bool(layer.mask.is_some())?;
        if let Some(mask) = &layer.mask {
            self.mask(mask)?;
        }
        Ok(())
    }
    fn text(&mut self, text: &TextContent) -> IOResult<()> {
        self.string(&text.text)?;
        self.f32(text.size)?;
        self.u32(text.color)?;
        self.matrix(&text.placement)
    }
    fn adjustment(&mut self, adjustment: Adjustment) -> IOResult<()> {
        match adjustment {
            Adjustment::Invert => self.u8(layer_tags::INVERT),
            Adjustment::Desaturate => self.u8(layer_tags::DESATURATE),
            Adjustment::Brightness(amount) => {
                self.u8(layer_tags::BRIGHTNESS)?;
                self.f32(amount)
            }
        }
    }
    fn mask(&mut self, mask: &LayerMask) -> IOResult<()> {
        self.bool(mask.enabled)?;
        self.bool(mask.linked)?;
        self.pixels(mask.raster())
    }
    fn guides(&mut self, guides: &Guides) -> IOResult<()> {
        for lines in [guides.horizontals(), guides.verticals()] {
            self.len(lines.len())?;
            for position in lines {
                self.f64(*position)?;
            }
        }
        Ok(())
    }
    fn selection(&mut self, selection: &Selection) -> IOResult<()> {
        for value in selection.rect() {
            self.f64(value)?;
        }
        Ok(())
    }
    /// `[width][height][format tag]`, then the pixels.
    fn pixels(&mut self, raster: &Raster) -> IOResult<()> {
        let format = raster.format();
        self.len(raster.width())?;
        self.len(raster.height())?;
        self.i32(format.tag())?;
        let progress = SubtaskTracker::new(self.progress, self.image_share, IMAGE_STEPS as u64);
        match format {
            PixelFormat::Argb => {
                let pixels = raster.argb().unwrap_or_default();
                let chunk_len = pixels.len().div_ceil(IMAGE_STEPS).max(1);
                let mut bytes = Vec::with_capacity(chunk_len * 4);
                for chunk in pixels.chunks(chunk_len) {
                    bytes.clear();
                    bytes.extend(chunk.iter().flat_map(|px| px.to_be_bytes()));
                    self.writer.write_all(&bytes)?;
                    progress.units_done(1);
                }
            }
            PixelFormat::Gray => {
                let mut png = Vec::new();
                image::codecs::png::PngEncoder::new(&mut png)
                    .write_image(
                        raster.gray().unwrap_or_default(),
                        raster.width(),
                        raster.height(),
                        image::ExtendedColorType::L8,
                    )
                    .map_err(IOError::other)?;
                self.len(png.len())?;
                self.writer.write_all(&png)?;
            }
        }
        progress.finish();
        Ok(())
    }
}
