use bytes::{Bytes, BytesMut};
use memchr::memchr;
use tokio_util::codec::Decoder;
use tracing::trace;

/// A decoder that cuts frames ended by a chosen terminator byte.
///
/// Each produced frame contains every byte up to and including the
/// terminator, so a frame is never empty and always ends with the
/// terminator. Bytes after the last terminator are left in the source
/// buffer for a later call to complete.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TerminatedDecoder {
    /// The byte that ends a frame.
    pub terminator: u8,
}

impl TerminatedDecoder {
    /// Creates a `TerminatedDecoder` with the specified terminator.
    pub const fn new(terminator: u8) -> Self {
        TerminatedDecoder { terminator }
    }

    /// Returns the terminator byte used to end frames.
    pub const fn terminator(&self) -> u8 {
        self.terminator
    }
}

impl Decoder for TerminatedDecoder {
    type Item = Bytes;
    type Error = std::io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Bytes>, Self::Error> {
        match memchr(self.terminator, buf) {
            None => Ok(None),
            Some(terminator_idx) => {
                // Cut through the terminator so the frame keeps it.
                let frame = buf.split_to(terminator_idx + 1).freeze();
                trace!(
                    message = "Decoding the frame.",
                    bytes_processed = frame.len()
                );
                Ok(Some(frame))
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Bytes>, Self::Error> {
        // An unterminated tail is not a command. It stays buffered so the
        // caller can decide whether to drop it or feed more bytes.
        self.decode(buf)
    }
}
