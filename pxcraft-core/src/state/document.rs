use super::{
    canvas::Canvas, guides::Guides, layer::Layer, selection::Selection,
    transform::CanvasTransform,
};

pub type DocumentID = crate::Id<Document>;

/// Image content of a layer doesn't cover the canvas exactly.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("layer content is {width}x{height}, canvas is {canvas}")]
pub struct SizeMismatch {
    pub canvas: Canvas,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug)]
pub struct Document {
    id: DocumentID,
    /// Name of the document, inferred from its path or generated.
    pub name: String,
    /// The path from which the file was loaded or saved, or None if never saved.
    /// Not stored in the file, since files get moved around.
    pub path: Option<std::path::PathBuf>,
    canvas: Canvas,
    /// Bottom to top.
    layers: Vec<Layer>,
    active_layer: usize,
    pub guides: Option<Guides>,
    pub selection: Option<Selection>,
}
impl Document {
    #[must_use]
    pub fn new(name: impl Into<String>, canvas: Canvas) -> Self {
        Self {
            id: DocumentID::default(),
            name: name.into(),
            path: None,
            canvas,
            layers: Vec::new(),
            active_layer: 0,
            guides: None,
            selection: None,
        }
    }
    #[must_use]
    pub fn id(&self) -> DocumentID {
        self.id
    }
    #[must_use]
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }
    /// Canvas operations own the job of keeping rasters canvas sized.
    pub(crate) fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }
    pub(crate) fn set_canvas(&mut self, canvas: Canvas) {
        self.canvas = canvas;
    }
    /// Mutable access to one layer.
    ///
    /// Nothing stops a raster of the wrong size being swapped in here, see [`Self::check_sizes`].
    pub fn layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
        self.layers.get_mut(index)
    }
    fn check_layer(&self, layer: &Layer) -> Result<(), SizeMismatch> {
        match layer
            .rasters()
            .find(|r| r.width() != self.canvas.width() || r.height() != self.canvas.height())
        {
            Some(raster) => Err(SizeMismatch {
                canvas: self.canvas,
                width: raster.width(),
                height: raster.height(),
            }),
            None => Ok(()),
        }
    }
    /// Check that every layer and mask raster covers the canvas exactly.
    pub fn check_sizes(&self) -> Result<(), SizeMismatch> {
        self.layers
            .iter()
            .try_for_each(|layer| self.check_layer(layer))
    }
    /// Add `layer` on top and make it active. Its rasters must match the canvas.
    pub fn push_layer(&mut self, layer: Layer) -> Result<(), SizeMismatch> {
        self.check_layer(&layer)?;
        self.layers.push(layer);
        self.active_layer = self.layers.len() - 1;
        Ok(())
    }
    #[must_use]
    pub fn active_layer_index(&self) -> usize {
        self.active_layer
    }
    #[must_use]
    pub fn active_layer(&self) -> Option<&Layer> {
        self.layers.get(self.active_layer)
    }
    /// Returns false, leaving the active layer alone, if `index` is out of range.
    pub fn set_active_layer(&mut self, index: usize) -> bool {
        if index < self.layers.len() {
            self.active_layer = index;
            true
        } else {
            false
        }
    }
    /// An independent copy with a fresh ID. Pixel buffers are shared until either side writes.
    #[must_use]
    pub fn create_copy(&self) -> Self {
        Self {
            id: DocumentID::default(),
            ..self.clone()
        }
    }
    /// Number of rasters stored in a project file for this document, masks included.
    #[must_use]
    pub fn count_images(&self) -> usize {
        self.layers.iter().map(|layer| layer.rasters().count()).sum()
    }
    #[must_use]
    pub fn has_selection(&self) -> bool {
        self.selection.is_some()
    }
    /// Note that image coordinates are about to move under `transform`.
    /// Pixels are untouched, this only carries coordinate bookkeeping like the selection along.
    pub fn image_coords_changed(&mut self, transform: &CanvasTransform) {
        self.selection = self
            .selection
            .and_then(|sel| sel.transformed(&transform.matrix, &transform.canvas));
    }
    /// Regenerate every layer and mask icon from the current canvas sized content.
    pub fn update_icon_images(&mut self, max_edge: u32) {
        for layer in &mut self.layers {
            layer.update_thumbnails(max_edge);
        }
    }
}

// Snapshots of the same content compare equal, whatever their identity or where they live.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.canvas == other.canvas
            && self.layers == other.layers
            && self.active_layer == other.active_layer
            && self.guides == other.guides
            && self.selection == other.selection
    }
}

#[cfg(test)]
mod test {
    use super::Document;
    use crate::raster::Raster;
    use crate::state::{
        canvas::Canvas,
        layer::{Adjustment, Layer, LayerKind, LayerMask},
    };

    fn doc() -> Document {
        Document::new("Untitled", Canvas::new(10, 8).unwrap())
    }

    #[test]
    fn push_checks_size() {
        let mut doc = doc();
        assert!(doc
            .push_layer(Layer::image("ok", Raster::new_argb(10, 8, 0).unwrap()))
            .is_ok());
        let err = doc
            .push_layer(Layer::image("bad", Raster::new_argb(8, 10, 0).unwrap()))
            .unwrap_err();
        assert_eq!((err.width, err.height), (8, 10));
        let mut masked = Layer::new("adj", LayerKind::Adjustment(Adjustment::Invert));
        masked.mask = Some(LayerMask::revealing(3, 3).unwrap());
        assert!(doc.push_layer(masked).is_err());
        assert_eq!(doc.layers().len(), 1);
    }
    #[test]
    fn swapped_rasters_are_caught() {
        let mut doc = doc();
        doc.push_layer(Layer::image("a", Raster::new_argb(10, 8, 0).unwrap()))
            .unwrap();
        assert!(doc.check_sizes().is_ok());
        doc.layer_mut(0).unwrap().mask = Some(LayerMask::revealing(3, 3).unwrap());
        let err = doc.check_sizes().unwrap_err();
        assert_eq!((err.width, err.height), (3, 3));
    }
    #[test]
    fn counts_masks() {
        let mut doc = doc();
        let mut layer = Layer::image("a", Raster::new_argb(10, 8, 0).unwrap());
        layer.mask = Some(LayerMask::revealing(10, 8).unwrap());
        doc.push_layer(layer).unwrap();
        doc.push_layer(Layer::new(
            "b",
            LayerKind::Adjustment(Adjustment::Brightness(0.5)),
        ))
        .unwrap();
        assert_eq!(doc.count_images(), 2);
        assert_eq!(doc.active_layer_index(), 1);
    }
    #[test]
    fn copy_is_independent() {
        let mut doc = doc();
        doc.push_layer(Layer::image("a", Raster::new_argb(10, 8, 7).unwrap()))
            .unwrap();
        let mut copy = doc.create_copy();
        assert_ne!(copy.id(), doc.id());
        assert_eq!(copy, doc);
        copy.layer_mut(0).unwrap().pixels_mut().unwrap()[3] = 0;
        assert_ne!(copy, doc);
        assert_eq!(
            doc.layers()[0].kind.raster().unwrap().argb_at(3, 0),
            Some(7)
        );
    }
    #[test]
    fn active_layer_bounds() {
        let mut doc = doc();
        assert!(doc.active_layer().is_none());
        assert!(!doc.set_active_layer(0));
    }
}
