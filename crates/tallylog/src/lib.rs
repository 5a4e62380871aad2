//! People-counter telemetry collector.
//!
//! Devices open a connection, send one report (optionally encrypted block by
//! block), read back a single accept/reject byte, and disconnect. Accepted
//! reports become `Event : <device> : <time> : <description>` lines appended
//! to a shared log file.
//!
//! # Crate Structure
//!
//! - [`stream`]: byte readers/writers, pipes, channels and channel sources
//! - [`text`]: buffered text adapters with soft end-of-input
//! - [`protocol`]: request handling, block decryption, log sink and server loop

/// Re-export stream types.
pub mod stream {
    pub use tallylog_stream::*;
}

/// Re-export text adapter types.
pub mod text {
    pub use tallylog_text::*;
}

/// Re-export protocol types.
pub mod protocol {
    pub use tallylog_protocol::*;
}
