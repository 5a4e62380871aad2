use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod send;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Accept device reports and append them to the log file.
    Serve(ServeArgs),
    /// Send a single report to a collector.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args),
        Command::Send(args) => send::run(args),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "TALLYLOG_LISTEN", default_value = "0.0.0.0:12347")]
    pub listen: String,
    /// Decryption key file (modulus and exponent as hex byte strings).
    /// Without it only unencrypted reports are accepted.
    #[arg(long, env = "TALLYLOG_KEY", value_name = "FILE")]
    pub key: Option<PathBuf>,
    /// Event log file, opened for append.
    #[arg(
        long,
        env = "TALLYLOG_LOG_FILE",
        value_name = "FILE",
        default_value = "people-counter-log.txt"
    )]
    pub log_file: PathBuf,
    /// Log an `Info : <device> : syncing` line for every accepted report.
    #[arg(long)]
    pub info_messages: bool,
    /// Handle each connection on its own thread.
    #[arg(long)]
    pub concurrent: bool,
    /// Exit after accepting N connections.
    #[arg(long, value_name = "N")]
    pub max_requests: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Collector address.
    pub addr: String,
    /// Device name.
    #[arg(long)]
    pub device: String,
    /// Stats line.
    #[arg(long)]
    pub stats: Option<String>,
    /// Event line, optionally prefixed with a hex timestamp (repeatable).
    #[arg(long = "event", value_name = "LINE")]
    pub events: Vec<String>,
    /// Encryption key file. When given, the report is encrypted.
    #[arg(long, value_name = "FILE")]
    pub key: Option<PathBuf>,
    /// Report format.
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
