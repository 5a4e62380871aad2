//! Line-oriented text adapter over byte streams.
//!
//! [`TextReader`] and [`TextWriter`] wrap a [`ByteReader`] / [`ByteWriter`]
//! pair for protocol parsing. Every underlying failure is folded into a soft
//! end-of-input signal: a closed connection and a broken one look the same to
//! parsing code. The first hard failure is kept for diagnostics.
//!
//! [`ByteReader`]: tallylog_stream::ByteReader
//! [`ByteWriter`]: tallylog_stream::ByteWriter

pub mod reader;
pub mod writer;

pub use reader::TextReader;
pub use writer::TextWriter;
