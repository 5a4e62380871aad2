//! Blocking byte-stream abstraction.
//!
//! Provides a minimal capability layer that decouples protocol code from any
//! concrete transport:
//! - [`ByteReader`] / [`ByteWriter`] byte-at-a-time contracts
//! - file and memory backends, plus a tracing [`DumpingReader`] decorator
//! - in-process [`Pipe`]s and crosswise [`DuplexChannel`]s
//! - [`ChannelSource`]s that yield one [`Channel`] per connection
//!
//! This is the lowest layer of tallylog. Everything else builds on top of
//! the [`Channel`] type provided here.

pub mod channel;
pub mod dump;
pub mod error;
pub mod file;
pub mod memory;
pub mod pipe;
pub mod source;
pub mod tcp;
pub mod traits;

pub use channel::{Channel, DuplexChannel};
pub use dump::DumpingReader;
pub use error::{Result, StreamError};
pub use file::{FileByteReader, FileByteWriter};
pub use memory::MemoryByteReader;
pub use pipe::{Pipe, PipeKind, PipeReader, PipeWriter};
pub use source::{ChannelSource, QueuedChannelSource};
pub use tcp::TcpChannelSource;
pub use traits::{ByteReader, ByteWriter};
