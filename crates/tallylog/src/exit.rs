use std::fmt;
use std::io;

use tallylog_protocol::{ConfigError, ServerError};
use tallylog_stream::StreamError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: &io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::AddrInUse
        | io::ErrorKind::AddrNotAvailable
        | io::ErrorKind::TimedOut => TRANSPORT_ERROR,
        io::ErrorKind::InvalidInput => USAGE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn stream_error(context: &str, err: StreamError) -> CliError {
    match &err {
        StreamError::Bind { source, .. }
        | StreamError::Connect { source, .. }
        | StreamError::Accept(source)
        | StreamError::Io(source) => io_error(context, source),
        StreamError::Open { .. } => CliError::new(INTERNAL, format!("{context}: {err}")),
        StreamError::EndOfStream | StreamError::NoChannelsAvailable => {
            CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
        }
    }
}

pub fn config_error(context: &str, err: ConfigError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn server_error(err: ServerError) -> CliError {
    match err {
        ServerError::Accept(err) => stream_error("accept failed", err),
        ServerError::Sink(err) => CliError::new(INTERNAL, format!("log write failed: {err}")),
        ServerError::Spawn(err) => CliError::new(INTERNAL, format!("worker spawn failed: {err}")),
    }
}
