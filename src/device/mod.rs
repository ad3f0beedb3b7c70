//! The command-log device: one bounded ring of complete commands plus a
//! write framer, exposed through per-opener handles with byte cursors.
//!
//! Every operation takes the device mutex, and none holds it across an
//! await point. Drains read an atomic snapshot of the log under a single
//! lock acquisition so concurrent writers can never interleave inside a
//! reply.

mod framer;
mod mirror;

use std::{
    io::SeekFrom,
    sync::{Arc, Mutex, MutexGuard},
};

use bytes::Bytes;
use snafu::{ResultExt, Snafu, ensure};
use tracing::{debug, trace};

pub use self::{framer::Framer, mirror::FileMirror};
use crate::ring::CommandRing;

/// Error from a device operation.
#[derive(Debug, Snafu)]
pub enum DeviceError {
    /// The requested seek target falls outside the stored byte range.
    #[snafu(display("seek target {target} is outside the log (0..={total})"))]
    SeekOutOfRange {
        /// Requested absolute cursor position.
        target: i64,
        /// Bytes currently stored in the log.
        total: u64,
    },

    /// The seek-to-command index names a command that is not present.
    #[snafu(display("no stored command at index {index}"))]
    CommandOutOfRange {
        /// Requested command index, oldest first.
        index: u32,
    },

    /// The seek-to-command offset is past the end of the named command.
    #[snafu(display("offset {offset} is past the end of command {index}"))]
    OffsetOutOfRange {
        /// Requested command index, oldest first.
        index: u32,
        /// Requested offset within that command.
        offset: u32,
    },

    /// The framer failed to cut the pushed bytes.
    #[snafu(display("framing failed: {source}"))]
    Framing {
        /// Underlying framer error.
        source: std::io::Error,
    },

    /// The data-file mirror rejected an append.
    #[snafu(display("data file write failed: {source}"))]
    Mirror {
        /// Underlying file error.
        source: std::io::Error,
    },
}

/// Control operations accepted by [`Handle::control`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Reposition the cursor onto a stored command at a byte offset within
    /// it.
    SeekToCommand(SeekTo),
}

/// Argument of [`ControlCommand::SeekToCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekTo {
    /// Index of the target command, oldest first.
    pub write_cmd: u32,
    /// Byte offset within the target command.
    pub write_cmd_offset: u32,
}

#[derive(Debug)]
struct Shared {
    ring: CommandRing,
    framer: Framer,
    mirror: Option<FileMirror>,
}

/// The process-wide pairing of one command ring and one framer behind a
/// mutex. Opened handles share the device; each carries its own cursor.
#[derive(Debug)]
pub struct Device {
    shared: Mutex<Shared>,
}

impl Default for Device {
    fn default() -> Self {
        Self::new()
    }
}

impl Device {
    /// Creates a device with no on-disk mirror.
    pub fn new() -> Self {
        Self {
            shared: Mutex::new(Shared {
                ring: CommandRing::new(),
                framer: Framer::new(),
                mirror: None,
            }),
        }
    }

    /// Creates a device that also appends every accepted byte to `mirror`.
    pub fn with_mirror(mirror: FileMirror) -> Self {
        let device = Self::new();
        device.lock().mirror = Some(mirror);
        device
    }

    /// Opens a handle with its cursor at byte 0. Never fails; dropping the
    /// handle closes it.
    pub fn open(self: &Arc<Self>) -> Handle {
        Handle {
            device: Arc::clone(self),
            cursor: 0,
        }
    }

    /// Pushes `bytes` through the framer, appending one entry to the ring
    /// per terminator seen, and mirrors the raw bytes when a data file is
    /// configured. Returns the number of input bytes consumed (all of
    /// them).
    pub fn write(&self, bytes: &[u8]) -> Result<usize, DeviceError> {
        let mut shared = self.lock();
        let entries = shared.framer.push(bytes).context(FramingSnafu)?;
        let appended = entries.len();
        for entry in entries {
            if let Some(evicted) = shared.ring.append(entry) {
                trace!(message = "Evicted oldest entry.", bytes = evicted.len());
            }
        }
        if let Some(mirror) = shared.mirror.as_mut() {
            mirror.append(bytes).context(MirrorSnafu)?;
        }
        debug!(
            message = "Accepted write.",
            bytes = bytes.len(),
            commands_completed = appended,
        );
        Ok(bytes.len())
    }

    /// Total bytes stored across all entries.
    pub fn total_bytes(&self) -> u64 {
        self.lock().ring.total_bytes()
    }

    /// Number of complete commands currently stored.
    pub fn commands(&self) -> usize {
        self.lock().ring.len()
    }

    /// Snapshot of the log contents from `offset` to the end, taken under
    /// one lock acquisition. The chunks are cheap slices of the stored
    /// entries, oldest to newest.
    pub fn contents_from(&self, offset: u64) -> Vec<Bytes> {
        let shared = self.lock();
        let mut skip = offset;
        let mut chunks = Vec::new();
        for entry in shared.ring.iter() {
            let len = entry.len() as u64;
            if skip >= len {
                skip -= len;
                continue;
            }
            chunks.push(entry.slice(skip as usize..));
            skip = 0;
        }
        chunks
    }

    /// Detaches the data-file mirror, if any, and deletes its file.
    pub fn remove_mirror(&self) -> std::io::Result<Option<std::path::PathBuf>> {
        let mirror = self.lock().mirror.take();
        mirror.map(FileMirror::remove).transpose()
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().expect("device lock poisoned")
    }
}

/// Per-opener cursor into the logical concatenation of the log's entries.
#[derive(Debug)]
pub struct Handle {
    device: Arc<Device>,
    cursor: u64,
}

impl Handle {
    /// Current cursor position.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Reads up to `max` bytes starting at the cursor and advances the
    /// cursor by the number returned. A single read never crosses an entry
    /// boundary; callers loop. An empty result means end of stream.
    pub fn read(&mut self, max: usize) -> Bytes {
        let shared = self.device.lock();
        let chunk = match shared.ring.find_offset(self.cursor) {
            None => return Bytes::new(),
            Some((entry, intra)) => {
                let take = max.min(entry.len() - intra);
                entry.slice(intra..intra + take)
            }
        };
        drop(shared);
        self.cursor += chunk.len() as u64;
        chunk
    }

    /// Writes through to the device. The cursor does not move.
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize, DeviceError> {
        self.device.write(bytes)
    }

    /// Repositions the cursor. The new position must land inside
    /// `0..=total_bytes()`; seeking exactly to the end is allowed and
    /// yields immediate end of stream.
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64, DeviceError> {
        let shared = self.device.lock();
        let total = shared.ring.total_bytes();
        let target = match pos {
            SeekFrom::Start(offset) => offset as i64,
            SeekFrom::Current(delta) => self.cursor as i64 + delta,
            SeekFrom::End(delta) => total as i64 + delta,
        };
        ensure!(
            target >= 0 && target as u64 <= total,
            SeekOutOfRangeSnafu { target, total }
        );
        drop(shared);
        self.cursor = target as u64;
        Ok(self.cursor)
    }

    /// Dispatches a control command. The command set is closed; see
    /// [`ControlCommand`].
    pub fn control(&mut self, cmd: ControlCommand) -> Result<u64, DeviceError> {
        match cmd {
            ControlCommand::SeekToCommand(seek_to) => self.seek_to_command(seek_to),
        }
    }

    /// Places the cursor at the base of the `write_cmd`th stored command
    /// (oldest first) plus `write_cmd_offset` bytes. No bytes are read.
    pub fn seek_to_command(&mut self, seek_to: SeekTo) -> Result<u64, DeviceError> {
        let shared = self.device.lock();
        let (base, entry) = shared
            .ring
            .nth_entry(seek_to.write_cmd as usize)
            .ok_or_else(|| {
                CommandOutOfRangeSnafu {
                    index: seek_to.write_cmd,
                }
                .build()
            })?;
        ensure!(
            (seek_to.write_cmd_offset as usize) < entry.len(),
            OffsetOutOfRangeSnafu {
                index: seek_to.write_cmd,
                offset: seek_to.write_cmd_offset,
            }
        );
        drop(shared);
        self.cursor = base + seek_to.write_cmd_offset as u64;
        Ok(self.cursor)
    }

    /// Drains the log from the cursor to end of stream in one atomic
    /// snapshot, advancing the cursor past everything returned.
    pub fn drain(&mut self) -> Vec<Bytes> {
        let chunks = self.device.contents_from(self.cursor);
        let drained: usize = chunks.iter().map(Bytes::len).sum();
        self.cursor += drained as u64;
        chunks
    }
}
