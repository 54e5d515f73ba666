//! Document parsing and rasterization
//!
//! Hands the (possibly decompressed) buffer to the resvg engine, negotiates
//! output dimensions with the host's size callback, and renders into an RGBA
//! pixmap. The whole document is rendered in one shot at the negotiated
//! size; there is no progressive or partial rasterization.

use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg;
use tracing::debug;

use crate::pixbuf::Pixbuf;
use crate::session::SizeFn;
use crate::LoadError;

/// Options for a decode operation.
///
/// `dpi` resolves physical units (`cm`, `in`, ...) in the document.
/// `fallback_size` is used as the intrinsic size when the document declares
/// no usable width/height/viewBox; the host always needs a concrete raster
/// size to negotiate from.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub dpi: f32,
    pub fallback_size: (u32, u32),
}

impl LoadOptions {
    pub fn new() -> Self {
        Self {
            dpi: 96.0,
            fallback_size: (100, 100),
        }
    }

    /// Set the dots-per-inch used to resolve physical lengths.
    pub fn with_dpi(mut self, dpi: f32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Set the intrinsic size assumed for documents with no declared size.
    pub fn with_fallback_size(mut self, width: u32, height: u32) -> Self {
        self.fallback_size = (width, height);
        self
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::new()
    }
}

fn engine_options(options: &LoadOptions) -> usvg::Options<'static> {
    let mut opt = usvg::Options::default();
    opt.dpi = options.dpi;
    let (w, h) = options.fallback_size;
    if let Some(size) = usvg::Size::from_wh(w as f32, h as f32) {
        opt.default_size = size;
    }
    opt
}

/// Parse `data` as an SVG document, negotiate output dimensions, and render.
///
/// The document's intrinsic size is rounded up to integer pixels and passed
/// by mutable reference to the size callback, which may rewrite both
/// dimensions; rendering happens at whatever dimensions result. Parse
/// failures map to [`LoadError::Document`]; a zero-sized or unallocatable
/// raster maps to [`LoadError::Bitmap`].
pub(crate) fn parse_and_render<U>(
    data: &[u8],
    options: &LoadOptions,
    size_fn: Option<&mut SizeFn<U>>,
    user: &mut U,
) -> Result<Pixbuf, LoadError> {
    let opt = engine_options(options);
    let tree =
        usvg::Tree::from_data(data, &opt).map_err(|e| LoadError::Document(e.to_string()))?;

    let intrinsic = tree.size();
    // Round up so fractional coverage is not chopped off.
    let mut width = intrinsic.width().ceil() as u32;
    let mut height = intrinsic.height().ceil() as u32;

    if let Some(negotiate) = size_fn {
        negotiate(&mut width, &mut height, user);
        debug!(
            intrinsic_width = intrinsic.width(),
            intrinsic_height = intrinsic.height(),
            width,
            height,
            "negotiated output size"
        );
    }

    if width == 0 || height == 0 {
        return Err(LoadError::Bitmap);
    }

    let mut pixmap = Pixmap::new(width, height).ok_or(LoadError::Bitmap)?;
    let transform = Transform::from_scale(
        width as f32 / intrinsic.width(),
        height as f32 / intrinsic.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    debug!(width, height, "rasterized document");

    Ok(Pixbuf::from_pixmap(pixmap))
}
