//! Write-side framing: arbitrary byte pushes in, complete commands out.

use bytes::{Bytes, BytesMut};
use codecs::NewlineTerminatedDecoder;
use tokio_util::codec::Decoder;

/// Accumulates pushed bytes and cuts a complete entry for every terminator
/// seen. Bytes after the last terminator stay buffered across pushes, so a
/// command split over several writes is reassembled before it is stored.
#[derive(Debug, Default)]
pub struct Framer {
    buffer: BytesMut,
    decoder: NewlineTerminatedDecoder,
}

impl Framer {
    /// Creates an empty framer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `bytes` to the accumulator and cuts one entry per terminator
    /// found, in input order. Entries include their trailing terminator.
    pub fn push(&mut self, bytes: &[u8]) -> std::io::Result<Vec<Bytes>> {
        self.buffer.extend_from_slice(bytes);
        let mut entries = Vec::new();
        while let Some(entry) = self.decoder.decode(&mut self.buffer)? {
            entries.push(entry);
        }
        Ok(entries)
    }

    /// Number of buffered bytes still waiting for a terminator.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}
