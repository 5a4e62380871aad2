use std::io::{ErrorKind, Read, Write};

use crate::error::{Result, StreamError};

/// A blocking source of bytes.
///
/// `read_byte` blocks until one byte is available. It fails with
/// [`StreamError::EndOfStream`] once the source is exhausted and with
/// [`StreamError::Io`] on any other transport error.
pub trait ByteReader {
    /// Read exactly one byte (blocking).
    fn read_byte(&mut self) -> Result<u8>;
}

/// A blocking sink of bytes.
pub trait ByteWriter {
    /// Write one byte. Implementations may buffer until [`flush`](Self::flush).
    fn write_byte(&mut self, byte: u8) -> Result<()>;

    /// Force buffered output out.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Write every byte of `bytes` in order.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        for &byte in bytes {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    /// Flush and close the outbound direction.
    ///
    /// For duplex transports this is a half-close: the peer observes
    /// end-of-stream while the inbound direction stays usable.
    fn close(&mut self) -> Result<()> {
        self.flush()
    }
}

impl<R: ByteReader + ?Sized> ByteReader for &mut R {
    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }
}

impl<R: ByteReader + ?Sized> ByteReader for Box<R> {
    fn read_byte(&mut self) -> Result<u8> {
        (**self).read_byte()
    }
}

impl<W: ByteWriter + ?Sized> ByteWriter for &mut W {
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        (**self).write_byte(byte)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_all(bytes)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl<W: ByteWriter + ?Sized> ByteWriter for Box<W> {
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        (**self).write_byte(byte)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_all(bytes)
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Read one byte from a `std::io::Read`, retrying interrupted reads.
pub(crate) fn read_one<T: Read + ?Sized>(inner: &mut T) -> Result<u8> {
    let mut byte = [0u8; 1];
    loop {
        match inner.read(&mut byte) {
            Ok(0) => return Err(StreamError::EndOfStream),
            Ok(_) => return Ok(byte[0]),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(StreamError::Io(err)),
        }
    }
}

/// Write a buffer to a `std::io::Write`, retrying interrupted writes.
pub(crate) fn write_to<T: Write + ?Sized>(inner: &mut T, bytes: &[u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < bytes.len() {
        match inner.write(&bytes[offset..]) {
            Ok(0) => return Err(StreamError::Io(ErrorKind::WriteZero.into())),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(StreamError::Io(err)),
        }
    }
    Ok(())
}

/// Flush a `std::io::Write`, retrying interrupted flushes.
pub(crate) fn flush_to<T: Write + ?Sized>(inner: &mut T) -> Result<()> {
    loop {
        match inner.flush() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(StreamError::Io(err)),
        }
    }
}
