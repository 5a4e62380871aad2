//! Device telemetry request handling.
//!
//! One request arrives per [`Channel`](tallylog_stream::Channel). The
//! [`ProtocolHandler`] reads it to end-of-input, optionally decrypts and
//! verifies its blocks, answers with a single accept/reject byte, and turns
//! the device's events into a [`MessageBatch`] of log lines. The [`Server`]
//! drives the accept loop and appends each batch to a [`LogSink`].

pub mod body;
pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handler;
pub mod message;
pub mod server;
pub mod sink;

#[cfg(test)]
mod testing;

pub use body::{DecryptedFrame, Event};
pub use client::{build_request, send_request, Response};
pub use config::{
    BlockKey, BlockLayout, ProtocolConfig, DEFAULT_CHECKSUM_MODULUS, DEFAULT_RANDOM_BIT_COUNT,
};
pub use error::{ConfigError, Rejection, ServerError};
pub use handler::ProtocolHandler;
pub use message::{MessageBatch, Outcome};
pub use server::{ServeMode, ServeReport, Server};
pub use sink::LogSink;
