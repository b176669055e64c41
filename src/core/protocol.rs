// src/core/protocol.rs

//! Implements the newline-delimited text framing used on the wire, as a
//! `tokio_util::codec` `Encoder`/`Decoder` pair.

use crate::core::ChatError;
use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

/// Default protocol-level limit on the length of a single line, in bytes.
/// Prevents a peer that never sends a terminator from growing the read
/// buffer without bound.
pub const DEFAULT_MAX_LINE_LEN: usize = 8 * 1024;

/// A codec for `\n`-terminated UTF-8 text frames.
///
/// One read from the stream may carry several complete lines, or a fraction
/// of one; the decoder splits on every terminator and buffers partial lines
/// across reads. A single trailing `\r` is stripped, so both `\n` and
/// `\r\n` peers are accepted. Outbound frames are written as `<content>\n`.
#[derive(Debug)]
pub struct LineCodec {
    max_line_len: usize,
    /// Offset into the buffer already scanned for a terminator, so repeated
    /// partial reads do not rescan from the start.
    next_index: usize,
}

impl LineCodec {
    pub fn new(max_line_len: usize) -> Self {
        Self {
            max_line_len,
            next_index: 0,
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINE_LEN)
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ChatError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(pos) = src[self.next_index..].iter().position(|&b| b == b'\n') {
            let newline_index = self.next_index + pos;
            let mut line = src.split_to(newline_index + 1);
            self.next_index = 0;

            // Drop the terminator and an optional preceding `\r`.
            line.truncate(line.len() - 1);
            if line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }
            if line.len() > self.max_line_len {
                return Err(ChatError::LineTooLong(self.max_line_len));
            }
            Ok(Some(String::from_utf8(line.to_vec())?))
        } else {
            if src.len() > self.max_line_len {
                return Err(ChatError::LineTooLong(self.max_line_len));
            }
            self.next_index = src.len();
            Ok(None)
        }
    }

    /// Flushes a trailing unterminated line when the peer closes mid-frame.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(line) => Ok(Some(line)),
            None if src.is_empty() => Ok(None),
            None => {
                let line = src.split_to(src.len());
                self.next_index = 0;
                Ok(Some(String::from_utf8(line.to_vec())?))
            }
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = ChatError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(item.len() + 1);
        dst.extend_from_slice(item.as_bytes());
        dst.extend_from_slice(b"\n");
        Ok(())
    }
}
