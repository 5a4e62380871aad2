use std::path::PathBuf;

/// Errors that can occur in byte-stream operations.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The source is exhausted. Expected at the natural end of a read loop.
    #[error("reached end of stream")]
    EndOfStream,

    /// An I/O error occurred on the underlying stream.
    #[error("stream I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to open a file-backed stream.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to bind a listening channel source.
    #[error("failed to bind to {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    /// Failed to connect to a remote channel source.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// Failed to accept an incoming connection.
    #[error("failed to accept connection: {0}")]
    Accept(std::io::Error),

    /// A channel source has no queued channels and no fallback.
    #[error("no channels left")]
    NoChannelsAvailable,
}

impl StreamError {
    /// True for the benign end-of-stream signal.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, StreamError::EndOfStream)
    }
}

pub type Result<T> = std::result::Result<T, StreamError>;
