//! # Layers
//!
//! Layers come in a closed set of kinds. Some of them hold content that lives in image space
//! and must follow a canvas operation, which is exposed by [`LayerKind::content_mut`]. Masks
//! always hold content.

use super::transform::{CanvasTransform, Matrix};
use crate::blend::Blend;
use crate::raster::{PixelFormat, Raster, RasterError};

pub type LayerID = crate::Id<Layer>;

/// Longest edge of generated layer icons, unless configured otherwise.
pub const DEFAULT_THUMBNAIL_EDGE: u32 = 64;

/// Something positioned in image space.
pub trait Content: Send {
    /// Follow a canvas operation, landing on `transform.canvas`.
    fn transform(&mut self, transform: &CanvasTransform) -> Result<(), RasterError>;
    /// Backing pixels, if this content is a raster.
    fn raster(&self) -> Option<&Raster> {
        None
    }
}

/// Canvas sized pixel content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageContent {
    pub raster: Raster,
}
impl Content for ImageContent {
    fn transform(&mut self, transform: &CanvasTransform) -> Result<(), RasterError> {
        let canvas = &transform.canvas;
        self.raster = self.raster.transformed(
            &transform.matrix,
            canvas.width(),
            canvas.height(),
            transform.filter,
        )?;
        Ok(())
    }
    fn raster(&self) -> Option<&Raster> {
        Some(&self.raster)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TextContent {
    pub text: String,
    /// Font size in pixels, before `placement`.
    pub size: f32,
    /// ARGB
    pub color: u32,
    /// Maps text space into image space.
    pub placement: Matrix,
}
impl Content for TextContent {
    fn transform(&mut self, transform: &CanvasTransform) -> Result<(), RasterError> {
        // Vector content, nothing to resample.
        self.placement = self.placement.then(&transform.matrix);
        Ok(())
    }
}

/// A non-destructive filter over everything beneath it. Has no position of its own.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Adjustment {
    Invert,
    Desaturate,
    /// Added to each channel, in `-1.0..=1.0`.
    Brightness(f32),
}

#[derive(Clone, Debug, PartialEq)]
pub enum LayerKind {
    Image(ImageContent),
    Text(TextContent),
    Adjustment(Adjustment),
}
impl LayerKind {
    /// The content a canvas operation must carry along, if this kind has any.
    pub fn content_mut(&mut self) -> Option<&mut dyn Content> {
        match self {
            Self::Image(image) => Some(image),
            Self::Text(text) => Some(text),
            Self::Adjustment(_) => None,
        }
    }
    #[must_use]
    pub fn raster(&self) -> Option<&Raster> {
        match self {
            Self::Image(image) => Some(&image.raster),
            Self::Text(_) | Self::Adjustment(_) => None,
        }
    }
}

/// Per-pixel visibility for its layer. White shows, black hides.
#[derive(Clone, Debug)]
pub struct LayerMask {
    raster: Raster,
    pub enabled: bool,
    /// Moves along with the layer's content when the layer is moved on its own.
    pub linked: bool,
    thumbnail: Option<image::RgbaImage>,
}
impl LayerMask {
    /// Wrap a gray raster, `None` for any other pixel format.
    #[must_use]
    pub fn new(raster: Raster) -> Option<Self> {
        (raster.format() == PixelFormat::Gray).then_some(Self {
            raster,
            enabled: true,
            linked: true,
            thumbnail: None,
        })
    }
    /// A mask hiding nothing.
    pub fn revealing(width: u32, height: u32) -> Result<Self, RasterError> {
        Ok(Self {
            raster: Raster::new_gray(width, height, u8::MAX)?,
            enabled: true,
            linked: true,
            thumbnail: None,
        })
    }
    #[must_use]
    pub fn raster(&self) -> &Raster {
        &self.raster
    }
    /// Mutable gray pixels. Clears the icon, see [`Layer::update_thumbnails`].
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        self.thumbnail = None;
        // Invariant: masks are always gray.
        self.raster.gray_mut().unwrap_or_default()
    }
    #[must_use]
    pub fn thumbnail(&self) -> Option<&image::RgbaImage> {
        self.thumbnail.as_ref()
    }
}
impl Content for LayerMask {
    fn transform(&mut self, transform: &CanvasTransform) -> Result<(), RasterError> {
        let canvas = &transform.canvas;
        self.raster = self.raster.transformed(
            &transform.matrix,
            canvas.width(),
            canvas.height(),
            transform.filter,
        )?;
        self.thumbnail = None;
        Ok(())
    }
    fn raster(&self) -> Option<&Raster> {
        Some(&self.raster)
    }
}
// Equal masks have equal pixels and flags, cached icons don't matter.
impl PartialEq for LayerMask {
    fn eq(&self, other: &Self) -> bool {
        self.enabled == other.enabled && self.linked == other.linked && self.raster == other.raster
    }
}

#[derive(Clone, Debug)]
pub struct Layer {
    id: LayerID,
    pub name: String,
    pub visible: bool,
    pub blend: Blend,
    pub kind: LayerKind,
    pub mask: Option<LayerMask>,
    thumbnail: Option<image::RgbaImage>,
}
impl Layer {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id: LayerID::default(),
            name: name.into(),
            visible: true,
            blend: Blend::default(),
            kind,
            mask: None,
            thumbnail: None,
        }
    }
    #[must_use]
    pub fn image(name: impl Into<String>, raster: Raster) -> Self {
        Self::new(name, LayerKind::Image(ImageContent { raster }))
    }
    /// Stable across snapshots of the same document.
    #[must_use]
    pub fn id(&self) -> LayerID {
        self.id
    }
    #[must_use]
    pub fn thumbnail(&self) -> Option<&image::RgbaImage> {
        self.thumbnail.as_ref()
    }
    /// Image pixels, or `None` for kinds without them. Clears the icon.
    pub fn pixels_mut(&mut self) -> Option<&mut [u32]> {
        self.thumbnail = None;
        match &mut self.kind {
            LayerKind::Image(image) => image.raster.argb_mut(),
            LayerKind::Text(_) | LayerKind::Adjustment(_) => None,
        }
    }
    /// Regenerate the icons of this layer and its mask from their canvas sized rasters.
    pub fn update_thumbnails(&mut self, max_edge: u32) {
        self.thumbnail = self.kind.raster().map(|raster| raster.thumbnail(max_edge));
        if let Some(mask) = &mut self.mask {
            mask.thumbnail = Some(mask.raster.thumbnail(max_edge));
        }
    }
    /// Rasters held by this layer, including its mask.
    pub(crate) fn rasters(&self) -> impl Iterator<Item = &Raster> {
        self.kind
            .raster()
            .into_iter()
            .chain(self.mask.as_ref().map(LayerMask::raster))
    }
}
// Identity and icons aside, two layers are the same if they'd look the same.
impl PartialEq for Layer {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.visible == other.visible
            && self.blend == other.blend
            && self.kind == other.kind
            && self.mask == other.mask
    }
}
