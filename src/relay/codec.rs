//! Bounded line-segment codec for relay streams.
//!
//! The wire unit is a segment: bytes up to and including a terminating
//! newline or null byte, at most [`MAX_SEGMENT_BYTES`] long. A line longer
//! than the bound is not an error; it is cut at the boundary and the
//! remainder carries over into the following segment.
//!
//! Use [`SegmentCodec`] as the codec parameter for
//! [`tokio_util::codec::FramedRead`] over any source endpoint.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;

use crate::{AppError, Result};

/// Maximum segment length in bytes, terminator included.
pub const MAX_SEGMENT_BYTES: usize = 1023;

/// Decoder yielding bounded, terminator-delimited byte segments.
///
/// # Decoder
///
/// A segment ends at the first `\n` or `\0` within the bound, or at the
/// bound itself when no terminator was seen. At EOF any buffered remainder
/// is yielded as a final unterminated segment. I/O errors are mapped to
/// [`AppError::Io`].
#[derive(Debug, Default)]
pub struct SegmentCodec;

impl SegmentCodec {
    /// Create a new `SegmentCodec`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for SegmentCodec {
    type Item = Bytes;
    type Error = AppError;

    /// Decode the next segment from `src`.
    ///
    /// Returns `Ok(None)` when `src` holds no terminator yet and is still
    /// under the bound (buffering).
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        let window = src.len().min(MAX_SEGMENT_BYTES);

        if let Some(pos) = src[..window]
            .iter()
            .position(|&byte| byte == b'\n' || byte == b'\0')
        {
            // Terminator included in the segment.
            return Ok(Some(src.split_to(pos + 1).freeze()));
        }

        if src.len() >= MAX_SEGMENT_BYTES {
            // Over-long line: cut at the boundary, remainder carries over.
            return Ok(Some(src.split_to(MAX_SEGMENT_BYTES).freeze()));
        }

        Ok(None)
    }

    /// Decode the final segment when the stream reaches EOF.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if let Some(segment) = self.decode(src)? {
            return Ok(Some(segment));
        }
        if src.is_empty() {
            Ok(None)
        } else {
            Ok(Some(src.split().freeze()))
        }
    }
}
