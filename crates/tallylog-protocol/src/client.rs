//! Device side of the exchange.

use std::io;

use rand::RngCore;
use tallylog_stream::{ByteWriter, Channel, StreamError};
use tallylog_text::{TextReader, TextWriter};

use crate::config::{BlockKey, BlockLayout};
use crate::crypto::encrypt_body;
use crate::error::ConfigError;

/// The server's answer to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Accepted,
    Rejected,
    /// Anything other than a single `'0'` or `'1'`.
    Unexpected(Vec<u8>),
}

impl Response {
    fn from_bytes(bytes: &[u8]) -> Self {
        match bytes {
            b"1" => Response::Accepted,
            b"0" => Response::Rejected,
            other => Response::Unexpected(other.to_vec()),
        }
    }
}

/// Build a request for `device`.
///
/// The stats line is always sent (empty when `stats` is `None`) so the first
/// event is never mistaken for it. With a key the body is encrypted.
pub fn build_request<R: RngCore + ?Sized>(
    device: &str,
    stats: Option<&str>,
    events: &[String],
    key: Option<&BlockKey>,
    layout: &BlockLayout,
    rng: &mut R,
) -> Result<Vec<u8>, ConfigError> {
    let mut body = String::new();
    body.push_str(device);
    body.push('\n');
    body.push_str(stats.unwrap_or_default());
    body.push('\n');
    for event in events {
        body.push_str(event);
        body.push('\n');
    }

    let mut request = Vec::with_capacity(body.len() + 1);
    match key {
        Some(key) => {
            request.push(b'1');
            let encrypted = encrypt_body(body.as_bytes(), key, layout, rng)?;
            request.extend_from_slice(encrypted.as_bytes());
        }
        None => {
            request.push(b'0');
            request.extend_from_slice(body.as_bytes());
        }
    }
    Ok(request)
}

/// Send `request`, half-close, and wait for the response.
pub fn send_request(channel: Channel, request: &[u8]) -> Result<Response, StreamError> {
    let (reader, writer) = channel.into_parts();

    let mut output = TextWriter::new(writer);
    let sent = output.write_bytes(request) && output.flush();
    if !sent {
        return Err(write_failure(&output));
    }
    if let Some(mut writer) = output.close() {
        writer.close()?;
    }

    let mut input = TextReader::new(reader);
    let response = input.read_to_end();
    Ok(Response::from_bytes(&response))
}

fn write_failure<W: ByteWriter>(output: &TextWriter<W>) -> StreamError {
    let detail = output
        .failure()
        .map_or_else(|| "write failed".to_string(), ToString::to_string);
    StreamError::Io(io::Error::new(io::ErrorKind::BrokenPipe, detail))
}
