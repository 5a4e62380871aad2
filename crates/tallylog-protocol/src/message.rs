use chrono::{Local, TimeZone};

use crate::body::{DecryptedFrame, Event};
use crate::error::Rejection;

/// How a request ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Accepted(DecryptedFrame),
    Rejected(Rejection),
}

/// Log lines produced by one request, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageBatch {
    lines: Vec<String>,
    outcome: Outcome,
}

impl MessageBatch {
    pub(crate) fn rejected(reason: Rejection) -> Self {
        Self {
            lines: vec![format!("Error : {reason}")],
            outcome: Outcome::Rejected(reason),
        }
    }

    pub(crate) fn accepted(frame: DecryptedFrame, info_messages: bool) -> Self {
        let device = String::from_utf8_lossy(&frame.device_name).into_owned();
        let mut lines = Vec::with_capacity(frame.events.len() + 1);
        if info_messages {
            lines.push(format!("Info : {device} : syncing"));
        }
        lines.extend(frame.events.iter().map(|event| event_line(&device, event)));
        Self {
            lines,
            outcome: Outcome::Accepted(frame),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self.outcome, Outcome::Accepted(_))
    }

    /// All lines, each terminated by `\n`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Format one event as `Event : <device> : <local time> : <description>`.
pub fn event_line(device: &str, event: &Event) -> String {
    format!(
        "Event : {device} : {} : {}",
        format_local_time(event.timestamp),
        String::from_utf8_lossy(&event.description)
    )
}

/// Format Unix seconds in the local time zone using the locale-style `%c`
/// layout. Out-of-range values fall back to the raw number.
pub fn format_local_time(timestamp: i64) -> String {
    match Local.timestamp_opt(timestamp, 0).single() {
        Some(time) => time.format("%c").to_string(),
        None => timestamp.to_string(),
    }
}
