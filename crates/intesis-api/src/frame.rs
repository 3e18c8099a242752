//! Frame splitter for the TCP control stream.
//!
//! The server concatenates JSON objects with no delimiter, occasionally
//! prefixes junk bytes, and pads short reads with NULs. Messages are
//! recovered with a brace-balance scan: a frame ends the instant the
//! count of `{` equals the count of `}`. A plain "split on `}}`" is not
//! enough — payloads nest.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;

use crate::error::Error;

/// Splits a raw byte stream into discrete JSON message frames.
///
/// Used through [`tokio_util::codec::FramedRead`]; one codec instance per
/// connection. On end-of-stream any unterminated remainder is emitted as
/// a best-effort final frame rather than held forever.
#[derive(Debug, Default)]
pub struct FrameCodec {
    _private: (),
}

impl FrameCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for FrameCodec {
    type Item = Bytes;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, Error> {
        // Discard anything before the first opening brace.
        let Some(start) = src.iter().position(|&b| b == b'{') else {
            src.clear();
            return Ok(None);
        };
        if start > 0 {
            src.advance(start);
        }

        let mut depth: usize = 0;
        for (i, &b) in src.iter().enumerate() {
            match b {
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(Some(src.split_to(i + 1).freeze()));
                    }
                }
                _ => {}
            }
        }

        // No balanced frame yet; wait for more bytes.
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>, Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }

        // Best effort: emit the unterminated tail, trimming the NUL
        // padding the device appends to short physical reads.
        let end = src
            .iter()
            .rposition(|&b| b != 0)
            .map_or(0, |last| last + 1);
        src.truncate(end);
        if src.is_empty() {
            return Ok(None);
        }
        Ok(Some(src.split().freeze()))
    }
}

// ── Tests ────────────────────────────────────────────────────────────
