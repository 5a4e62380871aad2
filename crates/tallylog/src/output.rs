use std::io::IsTerminal;

use clap::ValueEnum;
use serde::Serialize;
use tallylog_protocol::Response;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// Outcome of one `send` exchange.
#[derive(Serialize, Debug)]
pub struct SendReport<'a> {
    pub address: &'a str,
    pub device: &'a str,
    pub encrypted: bool,
    pub events: usize,
    pub request_bytes: usize,
    pub response: &'static str,
}

pub fn response_name(response: &Response) -> &'static str {
    match response {
        Response::Accepted => "accepted",
        Response::Rejected => "rejected",
        Response::Unexpected(_) => "unexpected",
    }
}

pub fn render_send_report(report: &SendReport<'_>, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            serde_json::to_string(report).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Pretty => format!(
            "device={} addr={} encrypted={} events={} bytes={} response={}",
            report.device,
            report.address,
            report.encrypted,
            report.events,
            report.request_bytes,
            report.response
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> SendReport<'static> {
        SendReport {
            address: "127.0.0.1:12347",
            device: "lobby",
            encrypted: false,
            events: 2,
            request_bytes: 24,
            response: response_name(&Response::Accepted),
        }
    }

    #[test]
    fn json_report_is_single_line() {
        let json = render_send_report(&report(), OutputFormat::Json);
        assert!(!json.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["response"], "accepted");
        assert_eq!(value["events"], 2);
    }

    #[test]
    fn pretty_report_names_device_and_response() {
        let text = render_send_report(&report(), OutputFormat::Pretty);
        assert!(text.starts_with("device=lobby "));
        assert!(text.ends_with("response=accepted"));
    }
}
