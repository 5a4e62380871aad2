//! Parsing of a plaintext request body.
//!
//! ```text
//! Body  = DeviceName '\n' [Stats '\n'] Event*
//! Event = (HexTimestamp ' ' Description | Description) '\n'?
//! ```

/// One reported event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    pub description: Vec<u8>,
}

/// A fully parsed request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptedFrame {
    pub device_name: Vec<u8>,
    pub stats: Option<Vec<u8>>,
    pub events: Vec<Event>,
}

/// Split off the newline-terminated device name.
///
/// Returns `None` if the body has no line terminator at all.
pub fn split_device_name(body: &[u8]) -> Option<(&[u8], &[u8])> {
    split_line(body)
}

/// Split off the stats line, if the remainder has one.
///
/// Without a terminator there is no stats line and the whole remainder is
/// left for events.
pub fn split_stats(rest: &[u8]) -> (Option<&[u8]>, &[u8]) {
    match split_line(rest) {
        Some((stats, events)) => (Some(stats), events),
        None => (None, rest),
    }
}

/// Parse the event lines, in order.
///
/// `now` supplies the timestamp for lines without a hex timestamp prefix.
pub fn parse_events(mut rest: &[u8], now: impl Fn() -> i64) -> Vec<Event> {
    let mut events = Vec::new();
    while !rest.is_empty() {
        let line = match split_line(rest) {
            Some((line, tail)) => {
                rest = tail;
                line
            }
            None => std::mem::take(&mut rest),
        };
        events.push(parse_event(line, &now));
    }
    events
}

fn parse_event(line: &[u8], now: &impl Fn() -> i64) -> Event {
    if let Some(space) = line.iter().position(|&b| b == b' ') {
        if let Some(timestamp) = parse_hex_timestamp(&line[..space]) {
            return Event {
                timestamp,
                description: line[space + 1..].to_vec(),
            };
        }
    }
    Event {
        timestamp: now(),
        description: line.to_vec(),
    }
}

fn parse_hex_timestamp(field: &[u8]) -> Option<i64> {
    if field.is_empty() || !field.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    let text = std::str::from_utf8(field).ok()?;
    i64::from_str_radix(text, 16).ok()
}

fn split_line(bytes: &[u8]) -> Option<(&[u8], &[u8])> {
    let end = bytes.iter().position(|&b| b == b'\n')?;
    Some((&bytes[..end], &bytes[end + 1..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn now() -> i64 {
        NOW
    }

    #[test]
    fn device_name_requires_terminator() {
        assert_eq!(
            split_device_name(b"dev\nrest"),
            Some((&b"dev"[..], &b"rest"[..]))
        );
        assert_eq!(split_device_name(b"dev"), None);
        assert_eq!(split_device_name(b"\n"), Some((&b""[..], &b""[..])));
    }

    #[test]
    fn stats_only_when_terminated() {
        assert_eq!(
            split_stats(b"uptime=5\nev\n"),
            (Some(&b"uptime=5"[..]), &b"ev\n"[..])
        );
        assert_eq!(split_stats(b"lonely"), (None, &b"lonely"[..]));
        assert_eq!(split_stats(b""), (None, &b""[..]));
    }

    #[test]
    fn events_keep_order_and_use_hex_timestamps() {
        let events = parse_events(b"5f5e100 door opened\nno stamp here\n1a x\n", now);
        assert_eq!(
            events,
            vec![
                Event {
                    timestamp: 0x5f5e100,
                    description: b"door opened".to_vec(),
                },
                Event {
                    timestamp: NOW,
                    description: b"no stamp here".to_vec(),
                },
                Event {
                    timestamp: 0x1a,
                    description: b"x".to_vec(),
                },
            ]
        );
    }

    #[test]
    fn unterminated_last_event_is_kept() {
        let events = parse_events(b"ff first\nsecond", now);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].description, b"second");
        assert_eq!(events[1].timestamp, NOW);
    }

    #[test]
    fn line_without_space_uses_now_even_if_hex() {
        let events = parse_events(b"beef\n", now);
        assert_eq!(events[0].timestamp, NOW);
        assert_eq!(events[0].description, b"beef");
    }

    #[test]
    fn empty_lines_become_empty_events_but_trailing_newline_does_not() {
        let events = parse_events(b"a\n\nb\n", now);
        let descriptions: Vec<_> = events.iter().map(|e| e.description.as_slice()).collect();
        assert_eq!(descriptions, vec![&b"a"[..], &b""[..], &b"b"[..]]);
    }

    #[test]
    fn signed_or_overflowing_prefixes_are_not_timestamps() {
        let events = parse_events(b"-1f minus\nffffffffffffffffff big\n", now);
        assert_eq!(events[0].timestamp, NOW);
        assert_eq!(events[0].description, b"-1f minus");
        assert_eq!(events[1].timestamp, NOW);
    }
}
