use std::borrow::Cow;
use std::sync::Arc;

use tallylog_stream::{ByteWriter, Channel, DumpingReader};
use tallylog_text::{TextReader, TextWriter};
use tracing::{debug, warn, Level};

use crate::body::{parse_events, split_device_name, split_stats, DecryptedFrame};
use crate::config::ProtocolConfig;
use crate::crypto::decrypt_body;
use crate::error::{Rejection, Result};
use crate::message::MessageBatch;

const TAG_PLAIN: u8 = b'0';
const TAG_ENCRYPTED: u8 = b'1';
const RESPONSE_REJECT: &str = "0";
const RESPONSE_ACCEPT: &str = "1";

type Reply = TextWriter<Box<dyn ByteWriter + Send>>;

/// Runs the request/response exchange for one channel.
///
/// Each call reads one request to end-of-input, writes exactly one response
/// (`'0'`, or `'1'` followed by a half-close) and returns the log lines.
/// The handler never touches durable storage.
#[derive(Debug, Clone)]
pub struct ProtocolHandler {
    config: Arc<ProtocolConfig>,
    clock: fn() -> i64,
}

impl ProtocolHandler {
    pub fn new(config: Arc<ProtocolConfig>) -> Self {
        Self {
            config,
            clock: wall_clock,
        }
    }

    /// Replace the clock used for events without a timestamp.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Handle one request to completion.
    pub fn handle(&self, channel: Channel) -> MessageBatch {
        let (mut reader, writer) = channel.into_parts();
        if tracing::enabled!(Level::TRACE) {
            reader = Box::new(DumpingReader::new(reader, "request"));
        }

        let mut input = TextReader::new(reader);
        let request = input.read_to_end();
        if let Some(err) = input.failure() {
            warn!(error = %err, len = request.len(), "request ended by transport failure");
        }
        input.close();

        let mut reply = TextWriter::new(writer);
        match self.process(&request, &mut reply) {
            Ok(frame) => {
                debug!(
                    device = %String::from_utf8_lossy(&frame.device_name),
                    events = frame.events.len(),
                    "request accepted"
                );
                MessageBatch::accepted(frame, self.config.info_messages)
            }
            Err(reason) => {
                debug!(%reason, "request rejected");
                respond(&mut reply, RESPONSE_REJECT);
                MessageBatch::rejected(reason)
            }
        }
    }

    fn process(&self, request: &[u8], reply: &mut Reply) -> Result<DecryptedFrame> {
        let (&tag, rest) = request.split_first().ok_or(Rejection::InvalidRequest)?;
        let body: Cow<'_, [u8]> = match tag {
            TAG_PLAIN => {
                if self.config.key.is_some() {
                    return Err(Rejection::UnencryptedAttempted);
                }
                Cow::Borrowed(rest)
            }
            TAG_ENCRYPTED => {
                let key = self.config.key.as_ref().ok_or(Rejection::NoKeyConfigured)?;
                Cow::Owned(decrypt_body(rest, key, &self.config.layout)?)
            }
            _ => return Err(Rejection::InvalidEncryptionType),
        };

        let (device_name, rest) = split_device_name(&body).ok_or(Rejection::MissingDeviceName)?;

        // Committed from here on: the peer is told before events are parsed.
        respond(reply, RESPONSE_ACCEPT);

        let (stats, rest) = split_stats(rest);
        let events = parse_events(rest, self.clock);
        Ok(DecryptedFrame {
            device_name: device_name.to_vec(),
            stats: stats.map(<[u8]>::to_vec),
            events,
        })
    }
}

/// Write the response, then half-close the outbound direction.
fn respond(reply: &mut Reply, response: &str) {
    if !(reply.write_str(response) && reply.flush()) {
        if let Some(err) = reply.failure() {
            warn!(error = %err, response, "failed to send response");
        }
    }
    if let Some(mut writer) = reply.close() {
        if let Err(err) = writer.close() {
            debug!(error = %err, "half-close failed");
        }
    }
}

fn wall_clock() -> i64 {
    chrono::Utc::now().timestamp()
}
