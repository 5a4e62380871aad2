use tallylog_stream::{ByteWriter, StreamError};
use tracing::debug;

/// Writes text to a [`ByteWriter`].
///
/// Writes report success as a `bool`; a transport failure (or a write after
/// [`close`](Self::close)) returns `false` and the first failure is kept.
pub struct TextWriter<W> {
    inner: Option<W>,
    failure: Option<StreamError>,
}

impl<W: ByteWriter> TextWriter<W> {
    /// Wrap a byte writer.
    pub fn new(inner: W) -> Self {
        Self {
            inner: Some(inner),
            failure: None,
        }
    }

    /// Write raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> bool {
        let Some(inner) = self.inner.as_mut() else {
            return false;
        };
        match inner.write_all(bytes) {
            Ok(()) => true,
            Err(err) => self.record(err),
        }
    }

    /// Write a string.
    pub fn write_str(&mut self, text: &str) -> bool {
        self.write_bytes(text.as_bytes())
    }

    /// Force buffered output out.
    pub fn flush(&mut self) -> bool {
        let Some(inner) = self.inner.as_mut() else {
            return false;
        };
        match inner.flush() {
            Ok(()) => true,
            Err(err) => self.record(err),
        }
    }

    /// The first transport failure seen, if any.
    pub fn failure(&self) -> Option<&StreamError> {
        self.failure.as_ref()
    }

    /// Detach and return the underlying writer without closing it.
    pub fn close(&mut self) -> Option<W> {
        self.inner.take()
    }

    fn record(&mut self, err: StreamError) -> bool {
        debug!(error = %err, "write failed");
        if self.failure.is_none() {
            self.failure = Some(err);
        }
        false
    }
}
