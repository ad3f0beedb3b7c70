//! A collection of framing methods that cut a raw byte stream into
//! terminator-ended command frames.
//!
//! Unlike a generic line codec, the decoders here keep the trailing
//! terminator byte as part of each frame: a command is defined as all bytes
//! up to *and including* its terminator. Bytes after the last terminator
//! stay buffered until a later feed completes them.

#![deny(missing_docs)]

mod newline_terminated;
mod terminated;

pub use newline_terminated::NewlineTerminatedDecoder;
pub use terminated::TerminatedDecoder;
