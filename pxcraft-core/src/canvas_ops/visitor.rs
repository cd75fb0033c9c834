//! Carry every piece of content in a document through a canvas transform.

use rayon::prelude::*;

use super::CanvasOpError;
use crate::raster::RasterError;
use crate::state::{
    document::Document,
    layer::{Content, Layer},
    transform::CanvasTransform,
};

/// Transform the content and mask of every layer, hidden ones included.
pub fn transform_layers(
    document: &mut Document,
    transform: &CanvasTransform,
) -> Result<(), CanvasOpError> {
    transform_layers_with(document, transform, |content, transform| {
        content.transform(transform)
    })
}

/// Like [`transform_layers`], with `f` doing the work for each piece of content.
///
/// Layers are independent, so they're visited in parallel. Layer order is untouched.
/// The first failure is reported, naming its layer.
pub fn transform_layers_with<F>(
    document: &mut Document,
    transform: &CanvasTransform,
    f: F,
) -> Result<(), CanvasOpError>
where
    F: Fn(&mut dyn Content, &CanvasTransform) -> Result<(), RasterError> + Sync,
{
    document
        .layers_mut()
        .par_iter_mut()
        .try_for_each(|layer| {
            let Layer {
                name, kind, mask, ..
            } = layer;
            kind.content_mut()
                .map_or(Ok(()), |content| f(content, transform))
                .and_then(|()| {
                    mask.as_mut()
                        .map_or(Ok(()), |mask| f(mask as &mut dyn Content, transform))
                })
                .map_err(|source| CanvasOpError::Layer {
                    layer: name.clone(),
                    source,
                })
        })
}
