//! Ringline: a bounded, append-only log of newline-delimited write
//! commands, exposed two ways at once.
//!
//! The [`device`] module stores up to the last [`ring::MAX_COMMANDS`]
//! complete commands and lets openers traverse their concatenated bytes
//! as one virtual stream, with seek and a seek-to-command control
//! operation. The [`server`] module multiplexes TCP clients onto the
//! same device: received bytes are framed into commands, and every
//! completed command echoes the whole current log back to the sender.

#![deny(missing_docs)]

pub mod app;
pub mod cli;
pub mod config;
pub mod daemon;
pub mod device;
pub mod ring;
pub mod server;
pub mod signal;
pub mod test_util;
pub mod timestamp;
pub mod trace;
