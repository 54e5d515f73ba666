//! # PixLoad SVG
//!
//! Incremental SVG decoder module for the PixLoad image-loading framework.
//!
//! This crate handles:
//! - Streamed accumulation of raw SVG bytes fed in arbitrary chunks
//! - Transparent decompression of gzip-wrapped input (`.svgz`)
//! - Parsing and rasterization through the resvg vector-graphics engine
//! - Size negotiation with the host before rendering
//! - Two-phase "prepared" / "updated" delivery of the finished raster
//!
//! The host framework owns format sniffing, MIME/extension tables, and module
//! dispatch. This crate owns the per-load state machine: a [`LoadSession`] is
//! created once per decode, fed zero or more chunks with
//! [`LoadSession::append`], and finalized exactly once with
//! [`LoadSession::end`], which runs decompress -> parse -> rasterize ->
//! deliver and tears the session down on every outcome.
//!
//! ```
//! use pixload_svg::{LoadOptions, LoadSession};
//!
//! let mut session = LoadSession::begin(())
//!     .with_options(LoadOptions::new())
//!     .on_prepared(|image, _| println!("{}x{}", image.width(), image.height()));
//! session.append(br#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"/>"#).unwrap();
//! let image = session.end().unwrap();
//! assert_eq!((image.width(), image.height()), (4, 4));
//! ```

use thiserror::Error;

pub mod inflate;
pub mod pixbuf;
pub mod render;
pub mod session;

pub use pixbuf::{Pixbuf, Region};
pub use render::LoadOptions;
pub use session::{LoadSession, PreparedFn, SizeFn, UpdatedFn};

/// Errors that can occur while decoding an SVG load.
///
/// All of these are session-level: the session is torn down and no image is
/// delivered. Allocation failure during parsing or rasterization is *not*
/// represented here; it follows Rust's infallible-allocation abort, matching
/// the fail-fast policy for out-of-memory during vector rendering.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Out of memory while buffering input")]
    OutOfMemory,

    #[error("Failed to decompress gzip stream: {0}")]
    Decompress(String),

    #[error("Failed loading document: {0}")]
    Document(String),

    #[error("Invalid bitmap")]
    Bitmap,
}

/// Result type for load operations
pub type LoadResult<T> = Result<T, LoadError>;

/// Decode a complete SVG (or gzip-wrapped SVG) buffer in one shot.
///
/// Convenience wrapper around [`LoadSession`] for callers that already hold
/// the whole input and do not need size negotiation or delivery callbacks.
pub fn decode(bytes: &[u8], options: LoadOptions) -> LoadResult<Pixbuf> {
    let mut session = LoadSession::begin(()).with_options(options);
    session.append(bytes)?;
    session.end()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_one_shot() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="6"/>"#;
        let image = decode(svg, LoadOptions::new()).unwrap();
        assert_eq!(image.width(), 8);
        assert_eq!(image.height(), 6);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode(b"definitely not markup", LoadOptions::new()).unwrap_err();
        assert!(matches!(err, LoadError::Document(_)));
    }

    #[test]
    fn test_error_wording_is_stable() {
        // The host surfaces these strings to users; keep them verbatim.
        assert!(LoadError::Document("x".into())
            .to_string()
            .starts_with("Failed loading document"));
        assert_eq!(LoadError::Bitmap.to_string(), "Invalid bitmap");
    }
}
