//! Optional on-disk mirror of the accepted byte stream.

use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

/// Append-only file that records every byte the device accepts.
///
/// The mirror preserves the full accepted stream for the life of the
/// process; the in-memory ring stays bounded. The file is removed on clean
/// shutdown via [`FileMirror::remove`].
#[derive(Debug)]
pub struct FileMirror {
    path: PathBuf,
    file: File,
}

impl FileMirror {
    /// Opens (creating if needed) the mirror file in append mode.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, file })
    }

    /// Appends raw bytes exactly as they were accepted.
    pub fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.file.write_all(bytes)
    }

    /// Closes the mirror and deletes its file.
    pub fn remove(self) -> io::Result<PathBuf> {
        let Self { path, file } = self;
        drop(file);
        std::fs::remove_file(&path)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ringline.data");

        let mut mirror = FileMirror::open(&path).unwrap();
        mirror.append(b"one\n").unwrap();
        mirror.append(b"tw").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"one\ntw");

        let removed = mirror.remove().unwrap();
        assert_eq!(removed, path);
        assert!(!path.exists());
    }

    #[test]
    fn reopen_appends_to_existing_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ringline.data");

        let mut mirror = FileMirror::open(&path).unwrap();
        mirror.append(b"first\n").unwrap();
        drop(mirror);

        let mut mirror = FileMirror::open(&path).unwrap();
        mirror.append(b"second\n").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"first\nsecond\n");
    }
}
