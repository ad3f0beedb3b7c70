use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;

use super::TerminatedDecoder;

/// A codec that cuts newline-ended command frames, newline included.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct NewlineTerminatedDecoder(TerminatedDecoder);

impl NewlineTerminatedDecoder {
    /// Creates a new `NewlineTerminatedDecoder`.
    pub const fn new() -> Self {
        Self(TerminatedDecoder::new(b'\n'))
    }
}

impl Default for NewlineTerminatedDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for NewlineTerminatedDecoder {
    type Item = Bytes;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.0.decode(src)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        self.0.decode_eof(src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_bytes_with_newlines() {
        let mut input = BytesMut::from("foo\nbar\nbaz");
        let mut decoder = NewlineTerminatedDecoder::new();

        assert_eq!(decoder.decode(&mut input).unwrap().unwrap(), "foo\n");
        assert_eq!(decoder.decode(&mut input).unwrap().unwrap(), "bar\n");
        assert_eq!(decoder.decode(&mut input).unwrap(), None);
        assert_eq!(&input[..], b"baz");
    }

    #[test]
    fn decode_bytes_split_across_feeds() {
        let mut input = BytesMut::from("ab");
        let mut decoder = NewlineTerminatedDecoder::new();

        assert_eq!(decoder.decode(&mut input).unwrap(), None);
        input.extend_from_slice(b"cd\n");
        assert_eq!(decoder.decode(&mut input).unwrap().unwrap(), "abcd\n");
        assert!(input.is_empty());
    }

    #[test]
    fn decode_empty_input() {
        let mut input = BytesMut::new();
        let mut decoder = NewlineTerminatedDecoder::new();

        assert_eq!(decoder.decode(&mut input).unwrap(), None);
        assert_eq!(decoder.decode_eof(&mut input).unwrap(), None);
    }
}
