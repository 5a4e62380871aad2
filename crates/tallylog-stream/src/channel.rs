use crate::error::Result;
use crate::pipe::{Pipe, PipeKind};
use crate::traits::{ByteReader, ByteWriter};

/// One end of a full-duplex byte connection.
///
/// Owns an inbound [`ByteReader`] and an outbound [`ByteWriter`]. The two
/// halves can be split apart so that the outbound direction is closed
/// independently of the inbound one.
pub struct Channel {
    reader: Box<dyn ByteReader + Send>,
    writer: Box<dyn ByteWriter + Send>,
}

impl Channel {
    /// Pair a reader with a writer.
    pub fn new(
        reader: impl ByteReader + Send + 'static,
        writer: impl ByteWriter + Send + 'static,
    ) -> Self {
        Self {
            reader: Box::new(reader),
            writer: Box::new(writer),
        }
    }

    /// Borrow the inbound half.
    pub fn reader(&mut self) -> &mut (dyn ByteReader + Send) {
        self.reader.as_mut()
    }

    /// Borrow the outbound half.
    pub fn writer(&mut self) -> &mut (dyn ByteWriter + Send) {
        self.writer.as_mut()
    }

    /// Split into owned halves.
    pub fn into_parts(self) -> (Box<dyn ByteReader + Send>, Box<dyn ByteWriter + Send>) {
        (self.reader, self.writer)
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel").finish_non_exhaustive()
    }
}

/// Two pipes wired crosswise.
///
/// Bytes written on port A are read on port B and vice versa. The ports share
/// nothing but the two pipes.
#[derive(Debug)]
pub struct DuplexChannel {
    port_a: Channel,
    port_b: Channel,
}

impl DuplexChannel {
    /// Create a duplex channel over in-process buffered pipes.
    pub fn new() -> Self {
        Self::from_pipes(Pipe::new(), Pipe::new())
    }

    /// Create a duplex channel with an explicit pipe backing store.
    pub fn with_kind(kind: PipeKind) -> Result<Self> {
        Ok(Self::from_pipes(Pipe::with_kind(kind)?, Pipe::with_kind(kind)?))
    }

    fn from_pipes(a_to_b: Pipe, b_to_a: Pipe) -> Self {
        let (b_reader, a_writer) = a_to_b.into_ends();
        let (a_reader, b_writer) = b_to_a.into_ends();
        Self {
            port_a: Channel::new(a_reader, a_writer),
            port_b: Channel::new(b_reader, b_writer),
        }
    }

    /// Borrow port A.
    pub fn port_a(&mut self) -> &mut Channel {
        &mut self.port_a
    }

    /// Borrow port B.
    pub fn port_b(&mut self) -> &mut Channel {
        &mut self.port_b
    }

    /// Split into the two owned ports.
    pub fn into_ports(self) -> (Channel, Channel) {
        (self.port_a, self.port_b)
    }
}

impl Default for DuplexChannel {
    fn default() -> Self {
        Self::new()
    }
}
