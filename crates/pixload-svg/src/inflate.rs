//! Transparent gzip decompression
//!
//! SVG input may arrive gzip-wrapped (`.svgz`). The accumulated buffer is
//! sniffed for the gzip magic prefix; if present, the whole stream is
//! decompressed into a fresh scratch buffer before parsing. Anything else is
//! passed through untouched. The rest of the pipeline never observes
//! partially decompressed data.

use std::borrow::Cow;
use std::io::Read;

use flate2::read::GzDecoder;
use tracing::debug;

use crate::LoadError;

/// Gzip stream magic prefix.
pub const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Check whether a buffer starts with the gzip magic bytes.
pub fn is_gzip(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == GZIP_MAGIC[0] && data[1] == GZIP_MAGIC[1]
}

/// Decompress `data` if it is gzip-wrapped, otherwise pass it through.
///
/// Returns `Cow::Borrowed` for plain input and `Cow::Owned` holding the fully
/// materialized decompressed bytes for gzip input. Any framing or stream
/// error maps to [`LoadError::Decompress`]; the partial scratch buffer is
/// dropped before the error propagates.
pub fn maybe_decompress(data: &[u8]) -> Result<Cow<'_, [u8]>, LoadError> {
    if !is_gzip(data) {
        return Ok(Cow::Borrowed(data));
    }

    let mut decoder = GzDecoder::new(data);
    let mut scratch = Vec::new();
    decoder
        .read_to_end(&mut scratch)
        .map_err(|e| LoadError::Decompress(e.to_string()))?;

    debug!(
        compressed = data.len(),
        decompressed = scratch.len(),
        "inflated gzip-wrapped input"
    );

    Ok(Cow::Owned(scratch))
}
