use std::path::PathBuf;

use tallylog_stream::StreamError;

/// Why a request was refused.
///
/// Every rejection answers the peer with a single `'0'` byte and logs one
/// `Error : <reason>` line. Rejections never escape the request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// The request body was empty.
    #[error("Invalid request")]
    InvalidRequest,

    /// A plaintext request arrived while a decryption key is configured.
    #[error("unencrypted message attempted")]
    UnencryptedAttempted,

    /// The leading tag byte was neither `'0'` nor `'1'`.
    #[error("Invalid encryption type")]
    InvalidEncryptionType,

    /// An encrypted request arrived but no key is configured.
    #[error("no decryption key configured")]
    NoKeyConfigured,

    /// An encrypted block was not valid base64.
    #[error("invalid base64 block")]
    InvalidBlock,

    /// An encrypted block failed checksum verification.
    #[error("checksum doesn't match")]
    ChecksumMismatch,

    /// The body has no newline-terminated device name.
    #[error("can't find device name")]
    MissingDeviceName,
}

/// Errors loading or using key material.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The key file could not be read.
    #[error("can't load key from {path}: {source}")]
    KeyFile {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A required key field is missing from the key file.
    #[error("key file is missing the {0}")]
    MissingKeyField(&'static str),

    /// A key field is not a valid hex byte string.
    #[error("invalid hex byte string for {field}: {reason}")]
    InvalidHex {
        field: &'static str,
        reason: &'static str,
    },

    /// The key modulus is zero.
    #[error("key modulus must be non-zero")]
    ZeroModulus,

    /// The key modulus cannot carry any payload with the configured layout.
    #[error("key modulus too small ({bits} bits) for the block layout")]
    KeyTooSmall { bits: u64 },
}

/// Errors that stop the accept loop.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The channel source failed to accept.
    #[error("accept failed: {0}")]
    Accept(StreamError),

    /// The log sink could not be written.
    #[error("log sink write failed: {0}")]
    Sink(StreamError),

    /// A worker thread could not be spawned.
    #[error("failed to spawn worker: {0}")]
    Spawn(std::io::Error),
}

pub type Result<T> = std::result::Result<T, Rejection>;
