//! Per-load session state machine
//!
//! A [`LoadSession`] spans one decode operation: created by [`begin`], fed
//! sequential chunks by [`append`], and consumed exactly once by [`end`],
//! which runs decompress -> parse -> rasterize -> deliver. End-of-stream is
//! a hard boundary: the buffer is never parsed while still growing. The
//! session is torn down on every exit path from `end`; consuming `self`
//! makes reuse of a finished session a compile error.
//!
//! [`begin`]: LoadSession::begin
//! [`append`]: LoadSession::append
//! [`end`]: LoadSession::end

use tracing::debug;

use crate::pixbuf::{self, Pixbuf, Region};
use crate::render::{self, LoadOptions};
use crate::{inflate, LoadError};

/// Size-negotiation callback: receives the document's intrinsic dimensions
/// and may rewrite them to request different output dimensions.
pub type SizeFn<U> = Box<dyn FnMut(&mut u32, &mut u32, &mut U)>;

/// Fired once when the image exists and its dimensions are final.
pub type PreparedFn<U> = Box<dyn FnMut(&Pixbuf, &mut U)>;

/// Fired once when the full image region holds valid pixel data.
pub type UpdatedFn<U> = Box<dyn FnMut(&Pixbuf, Region, &mut U)>;

/// The state for one incremental SVG decode.
///
/// `U` is an opaque caller context, owned by the session and passed `&mut`
/// to every callback. Distinct sessions share no mutable state and may run
/// on distinct threads; a single session is used by exactly one logical
/// `begin -> append* -> end` sequence.
pub struct LoadSession<U> {
    buf: Vec<u8>,
    options: LoadOptions,
    size_fn: Option<SizeFn<U>>,
    prepared_fn: Option<PreparedFn<U>>,
    updated_fn: Option<UpdatedFn<U>>,
    user: U,
}

impl<U> LoadSession<U> {
    /// Start a new load session around a caller context value.
    pub fn begin(user: U) -> Self {
        Self {
            buf: Vec::new(),
            options: LoadOptions::new(),
            size_fn: None,
            prepared_fn: None,
            updated_fn: None,
            user,
        }
    }

    /// Set decode options.
    pub fn with_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    /// Install the size-negotiation callback.
    pub fn on_size(mut self, f: impl FnMut(&mut u32, &mut u32, &mut U) + 'static) -> Self {
        self.size_fn = Some(Box::new(f));
        self
    }

    /// Install the "prepared" callback.
    pub fn on_prepared(mut self, f: impl FnMut(&Pixbuf, &mut U) + 'static) -> Self {
        self.prepared_fn = Some(Box::new(f));
        self
    }

    /// Install the "updated" callback.
    pub fn on_updated(mut self, f: impl FnMut(&Pixbuf, Region, &mut U) + 'static) -> Self {
        self.updated_fn = Some(Box::new(f));
        self
    }

    /// Append one chunk of raw (possibly gzip-compressed) input.
    ///
    /// Never inspects content; the buffer only grows. May be called any
    /// number of times, including zero, before [`end`](Self::end). Fails
    /// only when the buffer cannot grow, which the host may treat as reason
    /// to abort the session.
    pub fn append(&mut self, chunk: &[u8]) -> Result<(), LoadError> {
        self.buf
            .try_reserve(chunk.len())
            .map_err(|_| LoadError::OutOfMemory)?;
        self.buf.extend_from_slice(chunk);
        Ok(())
    }

    /// Number of raw bytes buffered so far.
    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }

    /// Caller context access during streaming.
    pub fn user(&self) -> &U {
        &self.user
    }

    /// Mutable caller context access during streaming.
    pub fn user_mut(&mut self) -> &mut U {
        &mut self.user
    }

    /// Signal end-of-stream and run the decode pipeline.
    ///
    /// Consumes the session: the accumulated buffer and any decompression
    /// scratch are released on every outcome. On success the prepared and
    /// updated callbacks have each fired once and the finished [`Pixbuf`] is
    /// returned to the caller; on failure no callbacks fire and no image is
    /// delivered.
    pub fn end(mut self) -> Result<Pixbuf, LoadError> {
        debug!(buffered = self.buf.len(), "end of stream");

        let data = inflate::maybe_decompress(&self.buf)?;
        let image = render::parse_and_render(
            &data,
            &self.options,
            self.size_fn.as_mut(),
            &mut self.user,
        )?;
        // The rasterizer has consumed the input; drop any scratch before
        // handing the image out.
        drop(data);

        pixbuf::deliver(
            &image,
            self.prepared_fn.as_mut(),
            self.updated_fn.as_mut(),
            &mut self.user,
        );

        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SVG: &[u8] = br#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"></svg>"#;

    #[test]
    fn test_append_grows_buffer_monotonically() {
        let mut session = LoadSession::begin(());
        assert_eq!(session.buffered_len(), 0);
        session.append(b"<svg").unwrap();
        assert_eq!(session.buffered_len(), 4);
        session.append(b"").unwrap();
        assert_eq!(session.buffered_len(), 4);
        session.append(b"/>").unwrap();
        assert_eq!(session.buffered_len(), 6);
    }

    #[test]
    fn test_end_without_append_fails_loading_document() {
        let err = LoadSession::begin(()).end().unwrap_err();
        assert!(matches!(err, LoadError::Document(_)));
    }

    #[test]
    fn test_user_context_reaches_every_callback() {
        // The context lives in the session, so snapshot it from the updated
        // callback, which fires last.
        let observed = std::rc::Rc::new(std::cell::Cell::new((0u32, 0u32)));
        let seen = observed.clone();

        let mut session = LoadSession::begin((0u32, 0u32))
            .on_size(|_, _, c: &mut (u32, u32)| c.0 += 1)
            .on_prepared(|_, c: &mut (u32, u32)| c.1 += 1)
            .on_updated(move |_, _, c: &mut (u32, u32)| seen.set(*c));
        session.append(SVG).unwrap();
        session.end().unwrap();

        assert_eq!(observed.get(), (1, 1));
    }

    #[test]
    fn test_user_accessors_during_streaming() {
        let mut session = LoadSession::begin(String::from("ctx"));
        assert_eq!(session.user(), "ctx");
        session.user_mut().push('!');
        assert_eq!(session.user(), "ctx!");
    }
}
