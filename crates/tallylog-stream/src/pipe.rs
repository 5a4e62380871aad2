//! One-way byte pipes.
//!
//! A [`Pipe`] connects one [`PipeWriter`] to one [`PipeReader`]. The backing
//! store is chosen at construction; both backends honour the same contract:
//! reads block until a byte arrives, and once the writer is closed (or
//! dropped) and the buffer drained the reader sees end-of-stream.

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crate::error::{Result, StreamError};
use crate::traits::{ByteReader, ByteWriter};

/// Backing store for a [`Pipe`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PipeKind {
    /// Shared in-process buffer.
    #[default]
    Buffered,
    /// OS socket pair.
    #[cfg(unix)]
    Os,
}

/// A one-way byte channel with a reader end and a writer end.
#[derive(Debug)]
pub struct Pipe {
    reader: PipeReader,
    writer: PipeWriter,
}

impl Pipe {
    /// Create an in-process buffered pipe.
    pub fn new() -> Self {
        let shared = Arc::new(Shared::default());
        Self {
            reader: PipeReader {
                inner: ReaderInner::Buffered(Arc::clone(&shared)),
            },
            writer: PipeWriter {
                inner: WriterInner::Buffered(shared),
                closed: false,
            },
        }
    }

    /// Create a pipe with an explicit backing store.
    pub fn with_kind(kind: PipeKind) -> Result<Self> {
        match kind {
            PipeKind::Buffered => Ok(Self::new()),
            #[cfg(unix)]
            PipeKind::Os => {
                let (read_end, write_end) = std::os::unix::net::UnixStream::pair()?;
                Ok(Self {
                    reader: PipeReader {
                        inner: ReaderInner::Os(std::io::BufReader::new(read_end)),
                    },
                    writer: PipeWriter {
                        inner: WriterInner::Os(std::io::BufWriter::new(write_end)),
                        closed: false,
                    },
                })
            }
        }
    }

    /// Borrow the reader end.
    pub fn reader(&mut self) -> &mut PipeReader {
        &mut self.reader
    }

    /// Borrow the writer end.
    pub fn writer(&mut self) -> &mut PipeWriter {
        &mut self.writer
    }

    /// Split the pipe into independently owned ends.
    pub fn into_ends(self) -> (PipeReader, PipeWriter) {
        (self.reader, self.writer)
    }
}

impl Default for Pipe {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<State>,
    ready: Condvar,
}

#[derive(Debug, Default)]
struct State {
    buf: VecDeque<u8>,
    writer_closed: bool,
    reader_closed: bool,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Reader end of a [`Pipe`].
#[derive(Debug)]
pub struct PipeReader {
    inner: ReaderInner,
}

#[derive(Debug)]
enum ReaderInner {
    Buffered(Arc<Shared>),
    #[cfg(unix)]
    Os(std::io::BufReader<std::os::unix::net::UnixStream>),
}

impl ByteReader for PipeReader {
    fn read_byte(&mut self) -> Result<u8> {
        match &mut self.inner {
            ReaderInner::Buffered(shared) => {
                let mut state = shared.lock();
                loop {
                    if let Some(byte) = state.buf.pop_front() {
                        return Ok(byte);
                    }
                    if state.writer_closed {
                        return Err(StreamError::EndOfStream);
                    }
                    state = shared
                        .ready
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
            #[cfg(unix)]
            ReaderInner::Os(stream) => crate::traits::read_one(stream),
        }
    }
}

impl Drop for PipeReader {
    fn drop(&mut self) {
        if let ReaderInner::Buffered(shared) = &self.inner {
            let mut state = shared.lock();
            state.reader_closed = true;
            state.buf.clear();
        }
    }
}

/// Writer end of a [`Pipe`].
#[derive(Debug)]
pub struct PipeWriter {
    inner: WriterInner,
    closed: bool,
}

#[derive(Debug)]
enum WriterInner {
    Buffered(Arc<Shared>),
    #[cfg(unix)]
    Os(std::io::BufWriter<std::os::unix::net::UnixStream>),
}

impl PipeWriter {
    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(StreamError::Io(std::io::Error::new(
                ErrorKind::BrokenPipe,
                "pipe writer closed",
            )));
        }
        Ok(())
    }

    fn push(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_open()?;
        match &mut self.inner {
            WriterInner::Buffered(shared) => {
                let mut state = shared.lock();
                if state.reader_closed {
                    return Err(StreamError::Io(std::io::Error::new(
                        ErrorKind::BrokenPipe,
                        "pipe reader dropped",
                    )));
                }
                state.buf.extend(bytes);
                shared.ready.notify_all();
                Ok(())
            }
            #[cfg(unix)]
            WriterInner::Os(stream) => crate::traits::write_to(stream, bytes),
        }
    }

    fn shut(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match &mut self.inner {
            WriterInner::Buffered(shared) => {
                shared.lock().writer_closed = true;
                shared.ready.notify_all();
                Ok(())
            }
            #[cfg(unix)]
            WriterInner::Os(stream) => {
                crate::traits::flush_to(stream)?;
                stream.get_ref().shutdown(std::net::Shutdown::Write)?;
                Ok(())
            }
        }
    }
}

impl ByteWriter for PipeWriter {
    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.push(&[byte])
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.push(bytes)
    }

    fn flush(&mut self) -> Result<()> {
        self.ensure_open()?;
        match &mut self.inner {
            WriterInner::Buffered(_) => Ok(()),
            #[cfg(unix)]
            WriterInner::Os(stream) => crate::traits::flush_to(stream),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.shut()
    }
}

impl Drop for PipeWriter {
    fn drop(&mut self) {
        let _ = self.shut();
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn drain<R: ByteReader>(reader: &mut R) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            match reader.read_byte() {
                Ok(byte) => out.push(byte),
                Err(StreamError::EndOfStream) => return out,
                Err(err) => panic!("unexpected read error: {err}"),
            }
        }
    }

    #[test]
    fn buffered_pipe_delivers_in_order_then_eof() {
        let (mut reader, mut writer) = Pipe::new().into_ends();
        writer.write_all(b"hello").unwrap();
        writer.write_byte(b'!').unwrap();
        writer.close().unwrap();

        assert_eq!(drain(&mut reader), b"hello!");
    }

    #[test]
    fn dropping_writer_signals_end_of_stream() {
        let (mut reader, mut writer) = Pipe::new().into_ends();
        writer.write_all(b"x").unwrap();
        drop(writer);

        assert_eq!(reader.read_byte().unwrap(), b'x');
        assert!(reader.read_byte().unwrap_err().is_end_of_stream());
    }

    #[test]
    fn write_after_reader_dropped_fails() {
        let (reader, mut writer) = Pipe::new().into_ends();
        drop(reader);

        let err = writer.write_byte(b'x').unwrap_err();
        assert!(matches!(err, StreamError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn write_after_close_fails() {
        let mut pipe = Pipe::new();
        pipe.writer().close().unwrap();
        assert!(pipe.writer().write_byte(b'x').is_err());
        assert!(pipe.reader().read_byte().unwrap_err().is_end_of_stream());
    }

    #[test]
    fn reader_blocks_until_writer_thread_sends() {
        let (mut reader, mut writer) = Pipe::new().into_ends();

        let producer = thread::spawn(move || {
            for i in 0..64u8 {
                writer.write_byte(i).unwrap();
            }
        });

        let received = drain(&mut reader);
        producer.join().unwrap();
        assert_eq!(received, (0..64u8).collect::<Vec<_>>());
    }

    #[test]
    #[cfg(unix)]
    fn os_pipe_matches_buffered_contract() {
        let (mut reader, mut writer) = Pipe::with_kind(PipeKind::Os).unwrap().into_ends();

        let producer = thread::spawn(move || {
            writer.write_all(b"over the socket").unwrap();
            writer.close().unwrap();
        });

        assert_eq!(drain(&mut reader), b"over the socket");
        producer.join().unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn os_pipe_dropped_writer_flushes_and_ends() {
        let (mut reader, mut writer) = Pipe::with_kind(PipeKind::Os).unwrap().into_ends();
        writer.write_all(b"buffered").unwrap();
        drop(writer);

        assert_eq!(drain(&mut reader), b"buffered");
    }
}
