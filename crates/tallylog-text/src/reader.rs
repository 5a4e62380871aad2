use bytes::{BufMut, Bytes, BytesMut};
use tallylog_stream::{ByteReader, StreamError};
use tracing::debug;

const INITIAL_LINE_CAPACITY: usize = 256;

/// Reads text from a [`ByteReader`] a byte, a line, or a whole body at a time.
///
/// End-of-stream and transport failures both end input. Once input has ended,
/// every subsequent read reports end-of-input as well.
pub struct TextReader<R> {
    inner: Option<R>,
    buf: BytesMut,
    ended: bool,
    failure: Option<StreamError>,
}

impl<R: ByteReader> TextReader<R> {
    /// Wrap a byte reader.
    pub fn new(inner: R) -> Self {
        Self {
            inner: Some(inner),
            buf: BytesMut::with_capacity(INITIAL_LINE_CAPACITY),
            ended: false,
            failure: None,
        }
    }

    /// Read one byte, or `None` at end of input.
    pub fn read_byte(&mut self) -> Option<u8> {
        if self.ended {
            return None;
        }
        let Some(inner) = self.inner.as_mut() else {
            self.ended = true;
            return None;
        };
        match inner.read_byte() {
            Ok(byte) => Some(byte),
            Err(StreamError::EndOfStream) => {
                self.ended = true;
                None
            }
            Err(err) => {
                debug!(error = %err, "read failed; treating as end of input");
                self.ended = true;
                self.failure = Some(err);
                None
            }
        }
    }

    /// Read one `\n`-terminated line without its terminator.
    ///
    /// A final line with no terminator is still returned. Returns `None` once
    /// no bytes remain.
    pub fn read_line(&mut self) -> Option<Bytes> {
        self.buf.clear();
        let mut saw_any = false;
        while let Some(byte) = self.read_byte() {
            saw_any = true;
            if byte == b'\n' {
                return Some(self.buf.split().freeze());
            }
            self.buf.put_u8(byte);
        }
        saw_any.then(|| self.buf.split().freeze())
    }

    /// Read everything until end of input.
    pub fn read_to_end(&mut self) -> Bytes {
        self.buf.clear();
        while let Some(byte) = self.read_byte() {
            self.buf.put_u8(byte);
        }
        self.buf.split().freeze()
    }

    /// The first transport failure that ended input, if any.
    pub fn failure(&self) -> Option<&StreamError> {
        self.failure.as_ref()
    }

    /// Detach and return the underlying reader without closing it.
    ///
    /// Later reads report end of input.
    pub fn close(&mut self) -> Option<R> {
        self.inner.take()
    }
}
