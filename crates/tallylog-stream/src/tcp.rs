use std::io::{BufReader, BufWriter};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use tracing::{debug, info};

use crate::channel::Channel;
use crate::error::{Result, StreamError};
use crate::source::ChannelSource;
use crate::traits::{flush_to, read_one, write_to, ByteReader, ByteWriter};

/// TCP listener that yields one [`Channel`] per accepted connection.
pub struct TcpChannelSource {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpChannelSource {
    /// Bind and listen on `addr`.
    pub fn bind(addr: impl ToSocketAddrs + std::fmt::Display) -> Result<Self> {
        let listener = TcpListener::bind(&addr).map_err(|source| StreamError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        let local_addr = listener.local_addr().map_err(|source| StreamError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        info!(%local_addr, "listening on tcp");
        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Connect to a listening peer and return the client-side channel.
    pub fn connect(addr: impl ToSocketAddrs + std::fmt::Display) -> Result<Channel> {
        let stream = TcpStream::connect(&addr).map_err(|source| StreamError::Connect {
            addr: addr.to_string(),
            source,
        })?;
        debug!(%addr, "connected over tcp");
        Self::channel_for(stream)
    }

    /// The address actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    fn channel_for(stream: TcpStream) -> Result<Channel> {
        let read_half = stream.try_clone()?;
        Ok(Channel::new(
            TcpByteReader {
                inner: BufReader::new(read_half),
            },
            TcpByteWriter {
                inner: BufWriter::new(stream),
                closed: false,
            },
        ))
    }
}

impl ChannelSource for TcpChannelSource {
    fn accept(&mut self) -> Result<Channel> {
        let (stream, peer) = self.listener.accept().map_err(StreamError::Accept)?;
        debug!(%peer, "accepted connection");
        Self::channel_for(stream)
    }
}

impl std::fmt::Debug for TcpChannelSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpChannelSource")
            .field("local_addr", &self.local_addr)
            .finish()
    }
}

struct TcpByteReader {
    inner: BufReader<TcpStream>,
}

impl ByteReader for TcpByteReader {
    fn read_byte(&mut self) -> Result<u8> {
        read_one(&mut self.inner)
    }
}

/// Outbound half of a TCP connection. Closing (or dropping) it shuts down
/// the write side of the socket.
struct TcpByteWriter {
    inner: BufWriter<TcpStream>,
    closed: bool,
}

impl TcpByteWriter {
    fn shut(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        flush_to(&mut self.inner)?;
        self.inner.get_ref().shutdown(Shutdown::Write)?;
        Ok(())
    }
}

impl ByteWriter for TcpByteWriter {
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        write_to(&mut self.inner, &[byte])
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        write_to(&mut self.inner, bytes)
    }

    fn flush(&mut self) -> Result<()> {
        flush_to(&mut self.inner)
    }

    fn close(&mut self) -> Result<()> {
        self.shut()
    }
}

impl Drop for TcpByteWriter {
    fn drop(&mut self) {
        if let Err(err) = self.shut() {
            debug!(error = %err, "tcp half-close on drop failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn drain(reader: &mut dyn ByteReader) -> Vec<u8> {
        let mut out = Vec::new();
        while let Ok(byte) = reader.read_byte() {
            out.push(byte);
        }
        out
    }

    #[test]
    fn accept_connect_half_close_round_trip() {
        let mut source = TcpChannelSource::bind("127.0.0.1:0").unwrap();
        let addr = source.local_addr();

        let client = thread::spawn(move || {
            let (mut reader, mut writer) = TcpChannelSource::connect(addr).unwrap().into_parts();
            writer.write_all(b"request").unwrap();
            writer.close().unwrap();
            drain(reader.as_mut())
        });

        let (mut reader, mut writer) = source.accept().unwrap().into_parts();
        assert_eq!(drain(reader.as_mut()), b"request");
        writer.write_all(b"1").unwrap();
        writer.close().unwrap();

        assert_eq!(client.join().unwrap(), b"1");
    }

    #[test]
    fn bind_reports_address_in_use() {
        let first = TcpChannelSource::bind("127.0.0.1:0").unwrap();
        let result = TcpChannelSource::bind(first.local_addr());
        assert!(matches!(result, Err(StreamError::Bind { .. })));
    }
}
