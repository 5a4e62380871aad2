use bytes::Bytes;

use crate::error::{Result, StreamError};
use crate::traits::ByteReader;

/// Reads bytes from an immutable memory buffer.
///
/// The readable length is fixed at construction.
#[derive(Debug, Clone)]
pub struct MemoryByteReader {
    mem: Bytes,
    offset: usize,
    length: usize,
}

impl MemoryByteReader {
    /// Read the whole buffer.
    pub fn new(mem: impl Into<Bytes>) -> Self {
        let mem = mem.into();
        let length = mem.len();
        Self {
            mem,
            offset: 0,
            length,
        }
    }

    /// Read at most `length` bytes of the buffer.
    pub fn with_length(mem: impl Into<Bytes>, length: usize) -> Self {
        let mem = mem.into();
        let length = length.min(mem.len());
        Self {
            mem,
            offset: 0,
            length,
        }
    }

    /// Bytes left before end-of-stream.
    pub fn remaining(&self) -> usize {
        self.length - self.offset
    }
}

impl ByteReader for MemoryByteReader {
    fn read_byte(&mut self) -> Result<u8> {
        if self.offset >= self.length {
            return Err(StreamError::EndOfStream);
        }
        let byte = self.mem[self.offset];
        self.offset += 1;
        Ok(byte)
    }
}
