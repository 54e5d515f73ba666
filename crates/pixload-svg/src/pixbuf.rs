//! Raster output handle and two-phase delivery
//!
//! A [`Pixbuf`] owns the pixel storage produced by the rasterizer: 8-bit
//! RGBA with straight (non-premultiplied) alpha, plus width, height, and row
//! stride. The handle is delivered to the host through the optional
//! "prepared" and "updated" callbacks and then handed over by value; storage
//! is freed exactly once, either by an explicit [`Pixbuf::release`] or by
//! `Drop`.

use resvg::tiny_skia::Pixmap;
use tracing::debug;

use crate::session::{PreparedFn, UpdatedFn};

/// A rectangular region of a delivered image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// The full region of an image, anchored at the origin.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// A decoded raster image with caller-owned pixel storage.
pub struct Pixbuf {
    width: u32,
    height: u32,
    stride: usize,
    // RGBA8, straight alpha, row-major. None once released.
    data: Option<Vec<u8>>,
}

impl Pixbuf {
    /// Wrap a freshly rendered pixmap, converting its premultiplied pixels
    /// to straight alpha.
    pub(crate) fn from_pixmap(pixmap: Pixmap) -> Self {
        let width = pixmap.width();
        let height = pixmap.height();

        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for px in pixmap.pixels() {
            let c = px.demultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }

        Self {
            width,
            height,
            stride: width as usize * 4,
            data: Some(data),
        }
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row stride in bytes. May exceed `width * 4`; callers must address
    /// rows through this value, never assume packed rows.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The whole pixel buffer (RGBA8, straight alpha).
    pub fn pixels(&self) -> &[u8] {
        self.data.as_deref().unwrap_or(&[])
    }

    /// One row of pixels, `width * 4` bytes starting at `y * stride`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    pub fn row(&self, y: u32) -> &[u8] {
        assert!(y < self.height, "row {} out of range 0..{}", y, self.height);
        let start = y as usize * self.stride;
        &self.pixels()[start..start + self.width as usize * 4]
    }

    /// Explicitly free the pixel storage.
    ///
    /// This is the host's "done with the image" signal. Dropping the handle
    /// has the same effect; either way the storage is freed exactly once.
    pub fn release(mut self) {
        self.free();
    }

    fn free(&mut self) {
        if let Some(data) = self.data.take() {
            debug!(
                width = self.width,
                height = self.height,
                bytes = data.len(),
                "released pixel storage"
            );
        }
    }
}

impl Drop for Pixbuf {
    fn drop(&mut self) {
        self.free();
    }
}

impl std::fmt::Debug for Pixbuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pixbuf")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .finish_non_exhaustive()
    }
}

/// Fire the two-phase delivery callbacks for a finished image.
///
/// "Prepared" signals that the image exists and its dimensions are final;
/// "updated" signals that the full region holds valid pixel data. This
/// decoder always delivers the image fully formed, so the updated region is
/// always `(0, 0, width, height)` and each callback fires at most once.
/// Absent callbacks are skipped.
pub(crate) fn deliver<U>(
    image: &Pixbuf,
    prepared: Option<&mut PreparedFn<U>>,
    updated: Option<&mut UpdatedFn<U>>,
    user: &mut U,
) {
    if let Some(f) = prepared {
        f(image, user);
    }
    if let Some(f) = updated {
        f(image, Region::full(image.width, image.height), user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resvg::tiny_skia::Color;

    fn solid_pixmap(width: u32, height: u32, color: Color) -> Pixmap {
        let mut pixmap = Pixmap::new(width, height).unwrap();
        pixmap.fill(color);
        pixmap
    }

    #[test]
    fn test_from_pixmap_dimensions_and_stride() {
        let image = Pixbuf::from_pixmap(solid_pixmap(3, 2, Color::TRANSPARENT));
        assert_eq!(image.width(), 3);
        assert_eq!(image.height(), 2);
        assert!(image.stride() >= 3 * 4);
        assert_eq!(image.pixels().len(), image.stride() * 2);
    }

    #[test]
    fn test_from_pixmap_demultiplies_alpha() {
        // 50% opaque red: premultiplied storage holds r ~ 128, straight
        // storage must restore r ~ 255.
        let color = Color::from_rgba(1.0, 0.0, 0.0, 0.5).unwrap();
        let image = Pixbuf::from_pixmap(solid_pixmap(1, 1, color));
        let px = image.row(0);
        assert!(px[0] >= 250, "red channel not demultiplied: {}", px[0]);
        assert_eq!(px[1], 0);
        assert_eq!(px[2], 0);
        assert!((126..=129).contains(&px[3]), "alpha off: {}", px[3]);
    }

    #[test]
    fn test_row_addresses_through_stride() {
        let mut pixmap = Pixmap::new(2, 2).unwrap();
        pixmap.fill(Color::from_rgba(0.0, 1.0, 0.0, 1.0).unwrap());
        let image = Pixbuf::from_pixmap(pixmap);
        let row = image.row(1);
        assert_eq!(row.len(), 2 * 4);
        assert_eq!(&row[..4], &[0, 255, 0, 255]);
    }

    #[test]
    fn test_deliver_order_and_region() {
        let image = Pixbuf::from_pixmap(solid_pixmap(5, 7, Color::TRANSPARENT));
        let mut events: Vec<String> = Vec::new();

        let mut prepared: PreparedFn<Vec<String>> =
            Box::new(|img, log: &mut Vec<String>| log.push(format!("prepared {}x{}", img.width(), img.height())));
        let mut updated: UpdatedFn<Vec<String>> = Box::new(|_, region, log: &mut Vec<String>| {
            log.push(format!("updated {:?}", region));
        });

        deliver(&image, Some(&mut prepared), Some(&mut updated), &mut events);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], "prepared 5x7");
        assert_eq!(events[1], format!("updated {:?}", Region::full(5, 7)));
    }

    #[test]
    fn test_deliver_with_no_callbacks_is_a_no_op() {
        let image = Pixbuf::from_pixmap(solid_pixmap(1, 1, Color::TRANSPARENT));
        deliver::<()>(&image, None, None, &mut ());
    }

    #[test]
    fn test_release_then_drop_frees_once() {
        let image = Pixbuf::from_pixmap(solid_pixmap(4, 4, Color::TRANSPARENT));
        // release consumes the handle; the Drop that runs inside sees the
        // storage already taken.
        image.release();
    }
}
