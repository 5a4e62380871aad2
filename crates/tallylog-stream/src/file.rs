use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use tracing::debug;

use crate::error::{Result, StreamError};
use crate::traits::{flush_to, read_one, write_to, ByteReader, ByteWriter};

/// Reads bytes from a file.
///
/// The handle is opened at construction and released on drop.
#[derive(Debug)]
pub struct FileByteReader {
    inner: BufReader<File>,
}

impl FileByteReader {
    /// Open `path` for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| StreamError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(?path, "opened file for reading");
        Ok(Self::from_file(file))
    }

    /// Wrap an already-open file handle.
    pub fn from_file(file: File) -> Self {
        Self {
            inner: BufReader::new(file),
        }
    }
}

impl ByteReader for FileByteReader {
    fn read_byte(&mut self) -> Result<u8> {
        read_one(&mut self.inner)
    }
}

/// Writes bytes to a file.
///
/// Output is buffered until [`ByteWriter::flush`]; the buffer is also flushed
/// when the writer is dropped.
#[derive(Debug)]
pub struct FileByteWriter {
    inner: BufWriter<File>,
}

impl FileByteWriter {
    /// Create (or truncate) `path` for writing.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, OpenOptions::new().write(true).create(true).truncate(true))
    }

    /// Open `path` for appending, creating it if missing.
    pub fn append(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, OpenOptions::new().append(true).create(true))
    }

    /// Wrap an already-open file handle.
    pub fn from_file(file: File) -> Self {
        Self {
            inner: BufWriter::new(file),
        }
    }

    fn open_with(path: impl AsRef<Path>, options: &OpenOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = options.open(path).map_err(|source| StreamError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(?path, "opened file for writing");
        Ok(Self::from_file(file))
    }
}

impl ByteWriter for FileByteWriter {
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        write_to(&mut self.inner, &[byte])
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        write_to(&mut self.inner, bytes)
    }

    fn flush(&mut self) -> Result<()> {
        flush_to(&mut self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_missing_file_fails_with_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = FileByteReader::open(dir.path().join("missing.txt"));
        assert!(matches!(result, Err(StreamError::Open { .. })));
    }

    #[test]
    fn write_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bytes.bin");

        let mut writer = FileByteWriter::create(&path).unwrap();
        writer.write_all(b"hi").unwrap();
        writer.write_byte(b'!').unwrap();
        writer.flush().unwrap();
        drop(writer);

        let mut reader = FileByteReader::open(&path).unwrap();
        assert_eq!(reader.read_byte().unwrap(), b'h');
        assert_eq!(reader.read_byte().unwrap(), b'i');
        assert_eq!(reader.read_byte().unwrap(), b'!');
        assert!(reader.read_byte().unwrap_err().is_end_of_stream());
    }

    #[test]
    fn append_keeps_existing_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        std::fs::write(&path, b"first\n").unwrap();

        let mut writer = FileByteWriter::append(&path).unwrap();
        writer.write_all(b"second\n").unwrap();
        writer.close().unwrap();
        drop(writer);

        assert_eq!(std::fs::read(&path).unwrap(), b"first\nsecond\n");
    }

    #[test]
    fn dropping_writer_flushes_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dropped.txt");

        let mut writer = FileByteWriter::create(&path).unwrap();
        writer.write_all(b"unflushed").unwrap();
        drop(writer);

        assert_eq!(std::fs::read(&path).unwrap(), b"unflushed");
    }
}
