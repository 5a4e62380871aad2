use tracing::trace;

use crate::error::{Result, StreamError};
use crate::traits::ByteReader;

/// Passes bytes through unchanged, emitting a `trace!` event for each one.
///
/// End-of-stream and failures are traced too, then returned as-is.
pub struct DumpingReader<R> {
    inner: R,
    label: &'static str,
    offset: u64,
}

impl<R: ByteReader> DumpingReader<R> {
    pub fn new(inner: R, label: &'static str) -> Self {
        Self {
            inner,
            label,
            offset: 0,
        }
    }

    /// Bytes read so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: ByteReader> ByteReader for DumpingReader<R> {
    fn read_byte(&mut self) -> Result<u8> {
        match self.inner.read_byte() {
            Ok(byte) => {
                trace!(
                    label = self.label,
                    offset = self.offset,
                    byte = format_args!("{byte:#04x}"),
                    ch = %byte.escape_ascii(),
                    "read byte"
                );
                self.offset += 1;
                Ok(byte)
            }
            Err(StreamError::EndOfStream) => {
                trace!(label = self.label, offset = self.offset, "end of stream");
                Err(StreamError::EndOfStream)
            }
            Err(err) => {
                trace!(label = self.label, offset = self.offset, error = %err, "read failed");
                Err(err)
            }
        }
    }
}

impl<R> std::fmt::Debug for DumpingReader<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DumpingReader")
            .field("label", &self.label)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryByteReader;

    #[test]
    fn passes_bytes_through_and_counts_them() {
        let mut reader = DumpingReader::new(MemoryByteReader::new(&b"1\n"[..]), "request");
        assert_eq!(reader.read_byte().unwrap(), b'1');
        assert_eq!(reader.read_byte().unwrap(), b'\n');
        assert!(reader.read_byte().unwrap_err().is_end_of_stream());
        assert_eq!(reader.offset(), 2);
    }

    #[test]
    fn failures_are_returned_unchanged() {
        struct Broken;
        impl ByteReader for Broken {
            fn read_byte(&mut self) -> Result<u8> {
                Err(StreamError::Io(std::io::ErrorKind::ConnectionReset.into()))
            }
        }

        let mut reader = DumpingReader::new(Broken, "request");
        let err = reader.read_byte().unwrap_err();
        assert!(matches!(
            err,
            StreamError::Io(ref io) if io.kind() == std::io::ErrorKind::ConnectionReset
        ));
        assert_eq!(reader.offset(), 0);
        assert!(matches!(reader.into_inner(), Broken));
    }
}
