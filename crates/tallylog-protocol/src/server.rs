use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tallylog_stream::{ChannelSource, StreamError};
use tracing::{debug, error, info, warn};

use crate::error::ServerError;
use crate::handler::ProtocolHandler;
use crate::sink::LogSink;

/// How accepted channels are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ServeMode {
    /// Handle each channel to completion before accepting the next.
    #[default]
    Sequential,
    /// Handle each channel on its own thread.
    ThreadPerChannel,
}

/// Counters returned when the accept loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeReport {
    pub handled: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Per-connection accept failures that were skipped.
    pub accept_errors: usize,
}

impl ServeReport {
    fn record(&mut self, batch_accepted: bool) {
        self.handled += 1;
        if batch_accepted {
            self.accepted += 1;
        } else {
            self.rejected += 1;
        }
    }
}

type Worker = JoinHandle<Result<bool, StreamError>>;

/// Pause after a skipped accept failure so descriptor exhaustion does not spin.
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Accept failures that only concern one incoming connection (or a momentary
/// resource shortage) and leave the listener usable.
fn is_transient_accept_error(err: &StreamError) -> bool {
    let StreamError::Accept(source) = err else {
        return false;
    };
    !matches!(
        source.kind(),
        io::ErrorKind::InvalidInput | io::ErrorKind::Unsupported | io::ErrorKind::NotConnected
    )
}

/// Accept loop: accept a channel, handle it, append its batch to the sink.
pub struct Server<S> {
    source: S,
    handler: Arc<ProtocolHandler>,
    sink: Arc<LogSink>,
    mode: ServeMode,
    max_requests: Option<usize>,
}

impl<S: ChannelSource> Server<S> {
    pub fn new(source: S, handler: ProtocolHandler, sink: LogSink) -> Self {
        Self {
            source,
            handler: Arc::new(handler),
            sink: Arc::new(sink),
            mode: ServeMode::default(),
            max_requests: None,
        }
    }

    pub fn with_mode(mut self, mode: ServeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Stop after this many channels have been accepted.
    pub fn with_max_requests(mut self, max_requests: usize) -> Self {
        self.max_requests = Some(max_requests);
        self
    }

    /// Run until the source is exhausted or the request limit is reached.
    ///
    /// A source reporting [`StreamError::NoChannelsAvailable`] ends the loop
    /// normally. Per-connection accept failures are logged and skipped; only a
    /// failure of the source itself is returned.
    pub fn run(&mut self) -> Result<ServeReport, ServerError> {
        let mut report = ServeReport::default();
        let mut workers: Vec<Worker> = Vec::new();
        let mut accepted_channels = 0usize;

        let outcome = loop {
            if self.max_requests.is_some_and(|max| accepted_channels >= max) {
                info!(requests = accepted_channels, "request limit reached");
                break Ok(());
            }

            let channel = match self.source.accept() {
                Ok(channel) => channel,
                Err(StreamError::NoChannelsAvailable) => {
                    debug!("channel source exhausted");
                    break Ok(());
                }
                Err(err) if is_transient_accept_error(&err) => {
                    warn!(error = %err, "accept failed; continuing");
                    report.accept_errors += 1;
                    thread::sleep(ACCEPT_RETRY_DELAY);
                    continue;
                }
                Err(err) => break Err(ServerError::Accept(err)),
            };
            accepted_channels += 1;

            match self.mode {
                ServeMode::Sequential => {
                    let batch = self.handler.handle(channel);
                    if let Err(err) = self.sink.append(&batch) {
                        break Err(ServerError::Sink(err));
                    }
                    report.record(batch.is_accepted());
                }
                ServeMode::ThreadPerChannel => {
                    if let Err(err) = reap_finished(&mut workers, &mut report) {
                        break Err(err);
                    }
                    let handler = Arc::clone(&self.handler);
                    let sink = Arc::clone(&self.sink);
                    let spawned = thread::Builder::new()
                        .name(format!("tallylog-request-{accepted_channels}"))
                        .spawn(move || {
                            let batch = handler.handle(channel);
                            sink.append(&batch).map(|()| batch.is_accepted())
                        });
                    match spawned {
                        Ok(worker) => workers.push(worker),
                        Err(err) => break Err(ServerError::Spawn(err)),
                    }
                }
            }
        };

        let joined = join_all(workers, &mut report);
        outcome.and(joined)?;
        info!(
            handled = report.handled,
            accepted = report.accepted,
            rejected = report.rejected,
            accept_errors = report.accept_errors,
            "accept loop stopped"
        );
        Ok(report)
    }
}

fn reap_finished(workers: &mut Vec<Worker>, report: &mut ServeReport) -> Result<(), ServerError> {
    let (finished, running): (Vec<_>, Vec<_>) =
        workers.drain(..).partition(|worker| worker.is_finished());
    *workers = running;
    join_all(finished, report)
}

fn join_all(workers: Vec<Worker>, report: &mut ServeReport) -> Result<(), ServerError> {
    let mut first_err = None;
    for worker in workers {
        match worker.join() {
            Ok(Ok(accepted)) => report.record(accepted),
            Ok(Err(err)) => {
                error!(error = %err, "failed to append batch");
                if first_err.is_none() {
                    first_err = Some(ServerError::Sink(err));
                }
            }
            Err(_) => {
                // No batch was appended; counted as rejected.
                error!("request worker panicked");
                report.record(false);
            }
        }
    }
    first_err.map_or(Ok(()), Err)
}
