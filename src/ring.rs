//! The bounded circular log of complete command entries.
//!
//! Entries are owned byte buffers, each one terminator-ended command.
//! Once the ring is full, appending a new entry evicts the oldest one.
//! Readers see the entries as one logical byte stream, concatenated
//! oldest to newest.

use bytes::Bytes;

/// Number of entry slots in the ring. Appends past this evict the oldest
/// entry.
pub const MAX_COMMANDS: usize = 10;

/// Fixed-capacity, overwrite-oldest store of command entries.
///
/// `head` is the next insertion slot and `tail` the oldest occupied slot;
/// `full` disambiguates `head == tail`. All locking is the caller's
/// responsibility.
#[derive(Debug, Default)]
pub struct CommandRing {
    entries: [Option<Bytes>; MAX_COMMANDS],
    head: usize,
    tail: usize,
    full: bool,
}

impl CommandRing {
    /// Creates an empty ring.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `entry` at the head slot, evicting and returning the oldest
    /// entry when the ring is already full.
    pub fn append(&mut self, entry: Bytes) -> Option<Bytes> {
        let mut evicted = None;
        if self.full {
            evicted = self.entries[self.tail].take();
            self.tail = (self.tail + 1) % MAX_COMMANDS;
        }
        self.entries[self.head] = Some(entry);
        self.head = (self.head + 1) % MAX_COMMANDS;
        self.full = self.head == self.tail;
        evicted
    }

    /// Number of occupied entry slots.
    pub fn len(&self) -> usize {
        if self.full {
            MAX_COMMANDS
        } else {
            (self.head + MAX_COMMANDS - self.tail) % MAX_COMMANDS
        }
    }

    /// Whether the ring holds no entries.
    pub fn is_empty(&self) -> bool {
        !self.full && self.head == self.tail
    }

    /// Total size in bytes of the logical concatenation of all entries.
    pub fn total_bytes(&self) -> u64 {
        self.iter().map(|entry| entry.len() as u64).sum()
    }

    /// Iterates the occupied entries oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Bytes> {
        (0..MAX_COMMANDS)
            .map(|step| (self.tail + step) % MAX_COMMANDS)
            .filter_map(|slot| self.entries[slot].as_ref())
    }

    /// Maps a byte offset into the oldest-to-newest concatenation onto the
    /// entry containing it and the offset within that entry.
    ///
    /// Returns `None` when `offset` is at or past the end of the stored
    /// data, which readers treat as end of stream.
    pub fn find_offset(&self, offset: u64) -> Option<(&Bytes, usize)> {
        let mut base = 0u64;
        for entry in self.iter() {
            let end = base + entry.len() as u64;
            if offset < end {
                return Some((entry, (offset - base) as usize));
            }
            base = end;
        }
        None
    }

    /// Returns the `index`th entry (oldest first) together with the byte
    /// offset at which it starts in the logical concatenation.
    pub fn nth_entry(&self, index: usize) -> Option<(u64, &Bytes)> {
        let mut base = 0u64;
        for (position, entry) in self.iter().enumerate() {
            if position == index {
                return Some((base, entry));
            }
            base += entry.len() as u64;
        }
        None
    }
}
