use std::path::Path;
use std::sync::{Mutex, PoisonError};

use tallylog_stream::{ByteWriter, FileByteWriter, Result};

use crate::message::MessageBatch;

/// Shared append-only destination for message batches.
///
/// Each batch is written and flushed under one lock, so lines from
/// concurrent requests never interleave.
pub struct LogSink {
    writer: Mutex<Box<dyn ByteWriter + Send>>,
}

impl LogSink {
    pub fn new(writer: impl ByteWriter + Send + 'static) -> Self {
        Self {
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// Append to `path`, creating it if missing.
    pub fn append_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(FileByteWriter::append(path)?))
    }

    /// Append one batch as a single unit.
    pub fn append(&self, batch: &MessageBatch) -> Result<()> {
        if batch.lines().is_empty() {
            return Ok(());
        }
        let rendered = batch.render();
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writer.write_all(rendered.as_bytes())?;
        writer.flush()
    }
}

impl std::fmt::Debug for LogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSink").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::body::{DecryptedFrame, Event};
    use crate::error::Rejection;

    #[test]
    fn appends_to_file_without_truncating() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people-counter-log.txt");
        std::fs::write(&path, "Error : earlier\n").unwrap();

        let sink = LogSink::append_file(&path).unwrap();
        sink.append(&MessageBatch::rejected(Rejection::InvalidRequest))
            .unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Error : earlier\nError : Invalid request\n"
        );
    }

    #[test]
    fn concurrent_batches_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        let sink = Arc::new(LogSink::append_file(&path).unwrap());

        let workers: Vec<_> = ["north", "south", "east", "west"]
            .into_iter()
            .map(|device| {
                let sink = Arc::clone(&sink);
                thread::spawn(move || {
                    let frame = DecryptedFrame {
                        device_name: device.as_bytes().to_vec(),
                        stats: None,
                        events: (0..3)
                            .map(|i| Event {
                                timestamp: i,
                                description: b"tick".to_vec(),
                            })
                            .collect(),
                    };
                    for _ in 0..50 {
                        sink.append(&MessageBatch::accepted(frame.clone(), false))
                            .unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4 * 50 * 3);
        for batch in lines.chunks(3) {
            let device = batch[0].split(" : ").nth(1).unwrap();
            assert!(batch.iter().all(|line| line.split(" : ").nth(1) == Some(device)));
        }
    }
}
