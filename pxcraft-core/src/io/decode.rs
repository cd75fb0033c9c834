//! Reading a document graph back, mirroring [`super::encode`]. Every length and count read from
//! the stream is checked before anything is allocated for it.

use std::io::{Error as IOError, ErrorKind as IOErrorKind, Read};

use az::CheckedAs;

use super::layer_tags;
use crate::blend::{Blend, BlendMode};
use crate::raster::{PixelFormat, Raster, RasterError, MAX_PIXELS};
use crate::state::{
    canvas::{Canvas, InvalidDimensions},
    document::{Document, SizeMismatch},
    guides::Guides,
    layer::{Adjustment, ImageContent, Layer, LayerKind, LayerMask, TextContent},
    selection::Selection,
    transform::Matrix,
};
use crate::util::{Opacity, OpacityError};

/// Longest string accepted, in bytes.
pub const MAX_STRING_LEN: usize = 1 << 20;
pub const MAX_LAYERS: usize = 1 << 16;
/// Pixels read per chunk, to avoid trusting a size before the data shows up.
const CHUNK_PIXELS: usize = 1 << 16;

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error(transparent)]
    Io(#[from] IOError),
    #[error("unknown layer kind {0}")]
    UnknownLayerKind(u8),
    #[error("unknown blend mode {0}")]
    UnknownBlendMode(u8),
    #[error("unknown pixel format {0}")]
    UnknownPixelFormat(i32),
    #[error("unknown adjustment {0}")]
    UnknownAdjustment(u8),
    #[error("expected a boolean, found {0}")]
    InvalidBool(u8),
    #[error("string of {0} bytes is too long")]
    StringTooLong(usize),
    #[error("string is not UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("{0} layers is too many")]
    TooManyLayers(usize),
    #[error("negative length {0}")]
    NegativeLength(i32),
    #[error(transparent)]
    Dimensions(#[from] InvalidDimensions),
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error(transparent)]
    Opacity(#[from] OpacityError),
    #[error(transparent)]
    LayerSize(#[from] SizeMismatch),
    #[error("embedded image")]
    Image(#[from] image::ImageError),
    #[error("embedded image is {found:?}, expected {expected:?}")]
    ImageMismatch {
        expected: (u32, u32),
        found: (u32, u32),
    },
    #[error("layer mask isn't grayscale")]
    MaskNotGray,
    #[error("active layer {index} out of {count}")]
    ActiveLayerOutOfRange { index: i32, count: usize },
}

pub(super) struct Decoder<R> {
    reader: R,
}
impl<R: Read> Decoder<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
    fn array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut bytes = [0; N];
        self.reader.read_exact(&mut bytes)?;
        Ok(bytes)
    }
    fn u8(&mut self) -> Result<u8, DecodeError> {
        let [value] = self.array()?;
        Ok(value)
    }
    fn bool(&mut self) -> Result<bool, DecodeError> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DecodeError::InvalidBool(other)),
        }
    }
    fn i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_be_bytes(self.array()?))
    }
    fn u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_be_bytes(self.array()?))
    }
    fn f32(&mut self) -> Result<f32, DecodeError> {
        Ok(f32::from_bits(self.u32()?))
    }
    fn f64(&mut self) -> Result<f64, DecodeError> {
        Ok(f64::from_bits(u64::from_be_bytes(self.array()?)))
    }
    fn len(&mut self) -> Result<usize, DecodeError> {
        let len = self.i32()?;
        len.checked_as().ok_or(DecodeError::NegativeLength(len))
    }
    fn string(&mut self) -> Result<String, DecodeError> {
        let len = self.len()?;
        if len > MAX_STRING_LEN {
            return Err(DecodeError::StringTooLong(len));
        }
        let mut bytes = vec![0; len];
        self.reader.read_exact(&mut bytes)?;
        Ok(String::from_utf8(bytes)?)
    }
    fn matrix(&mut self) -> Result<Matrix, DecodeError> {
        let mut elements = [[0.0; 2]; 3];
        for value in elements.iter_mut().flatten() {
            *value = self.f64()?;
        }
        Ok(Matrix::from(elements))
    }
    pub fn document(&mut self) -> Result<Document, DecodeError> {
        let name = self.string()?;
        let width = self.i32()?;
        let height = self.i32()?;
        let canvas = Canvas::new(width, height)?;
        let count = self.len()?;
        if count > MAX_LAYERS {
            return Err(DecodeError::TooManyLayers(count));
        }
        let mut document = Document::new(name, canvas);
        for _ in 0..count {
            let layer = self.layer()?;
            document.push_layer(layer)?;
        }
        let active = self.i32()?;
        let in_range = active
            .checked_as::<usize>()
            .is_some_and(|index| document.set_active_layer(index));
        if !in_range && !(count == 0 && active == 0) {
            return Err(DecodeError::ActiveLayerOutOfRange {
                index: active,
                count,
            });
        }
        if self.bool()? {
            document.guides = Some(self.guides()?);
        }
        if self.bool()? {
            let [x, y, width, height] = [self.f64()?, self.f64()?, self.f64()?, self.f64()?];
            document.selection = Selection::new(x, y, width, height);
            if document.selection.is_none() {
                log::warn!("ignoring empty selection {x},{y} {width}x{height}");
            }
        }
        Ok(document)
    }
    fn layer(&mut self) -> Result<Layer, DecodeError> {
        let tag = self.u8()?;
        let name = self.string()?;
        let visible = self.bool()?;
        let opacity = Opacity::new(self.f32()?)?;
        let code = self.u8()?;
        let mode = BlendMode::from_code(code).ok_or(DecodeError::UnknownBlendMode(code))?;
        let kind = match tag {
            layer_tags::IMAGE => LayerKind::Image(ImageContent {
                raster: self.pixels()?,
            }),
            layer_tags::TEXT => LayerKind::Text(self.text()?),
            layer_tags::ADJUSTMENT => LayerKind::Adjustment(self.adjustment()?),
            other => return Err(DecodeError::UnknownLayerKind(other)),
        };
        let mut layer = Layer::new(name, kind);
        layer.visible = visible;
        layer.blend = Blend::new(mode, opacity);
        if self.bool()? {
            layer.mask = Some(self.mask()?);
        }
        Ok(layer)
    }
    fn text(&mut self) -> Result<TextContent, DecodeError> {
        Ok(TextContent {
            text: self.string()?,
            size: self.f32()?,
            color: self.u32()?,
            placement: self.matrix()?,
        })
    }
    fn adjustment(&mut self) -> Result<Adjustment, DecodeError> {
        match self.u8()? {
            layer_tags::INVERT => Ok(Adjustment::Invert),
            layer_tags::DESATURATE => Ok(Adjustment::Desaturate),
            layer_tags::BRIGHTNESS => Ok(Adjustment::Brightness(self.f32()?)),
            other => Err(DecodeError::UnknownAdjustment(other)),
        }
    }
    fn mask(&mut self) -> Result<LayerMask, DecodeError> {
        let enabled = self.bool()?;
        let linked = self.bool()?;
        let mut mask = LayerMask::new(self.pixels()?).ok_or(DecodeError::MaskNotGray)?;
        mask.enabled = enabled;
        mask.linked = linked;
        Ok(mask)
    }
    fn guides(&mut self) -> Result<Guides, DecodeError> {
        let mut lines = [Vec::new(), Vec::new()];
        for positions in &mut lines {
            let count = self.len()?;
            // Grows as positions arrive, a bogus count runs into the end of the stream first.
            for _ in 0..count {
                positions.push(self.f64()?);
            }
        }
        let [horizontals, verticals] = lines;
        Ok(Guides::new(horizontals, verticals))
    }
    fn pixels(&mut self) -> Result<Raster, DecodeError> {
        let width = self.i32()?;
        let height = self.i32()?;
        let tag = self.i32()?;
        let canvas = Canvas::new(width, height)?;
        let (width, height) = (canvas.width(), canvas.height());
        if canvas.pixel_count() > MAX_PIXELS {
            return Err(RasterError::TooLarge { width, height }.into());
        }
        let format = PixelFormat::from_tag(tag).ok_or(DecodeError::UnknownPixelFormat(tag))?;
        let len = usize::try_from(canvas.pixel_count())
            .map_err(|_| RasterError::TooLarge { width, height })?;
        match format {
            PixelFormat::Argb => {
                let mut pixels = Vec::new();
                let mut bytes = vec![0; CHUNK_PIXELS.min(len) * 4];
                while pixels.len() < len {
                    let chunk = &mut bytes[..(len - pixels.len()).min(CHUNK_PIXELS) * 4];
                    self.reader.read_exact(chunk)?;
                    pixels.extend(
                        chunk
                            .chunks_exact(4)
                            .map(|px| u32::from_be_bytes([px[0], px[1], px[2], px[3]])),
                    );
                }
                Ok(Raster::from_argb(width, height, pixels)?)
            }
            PixelFormat::Gray => {
                let png_len = self.len()?;
                let mut png = Vec::new();
                (&mut self.reader)
                    .take(png_len as u64)
                    .read_to_end(&mut png)?;
                if png.len() != png_len {
                    return Err(IOError::new(
                        IOErrorKind::UnexpectedEof,
                        "embedded image cut short",
                    )
                    .into());
                }
                let image =
                    image::load_from_memory_with_format(&png, image::ImageFormat::Png)?.into_luma8();
                if image.dimensions() != (width, height) {
                    return Err(DecodeError::ImageMismatch {
                        expected: (width, height),
                        found: image.dimensions(),
                    });
                }
                Ok(Raster::from_gray(width, height, image.into_raw())?)
            }
        }
    }
}
