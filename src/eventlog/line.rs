//! Encoding and parsing of single event log lines.
//!
//! Two formats exist. The text format is what earlier deployments wrote and
//! looks like this:
//!
//! ```text
//! 2025-06-13T21:34:53.235Z - ID: 1749850493076-uq0oos - SUBJECT: Hi - TO: bob@example.com
//! ```
//!
//! Both the subject and the recipient part are optional, and the oldest
//! files have neither. The separators are not escaped, so a subject or
//! recipient containing one of them will not survive being read back
//! intact. The token ends at the first separator and always survives.
//! Line breaks in the subject or recipient are written as spaces so that
//! every event stays on exactly one line.
//!
//! The JSON format stores each event as a JSON object on a line of its own
//! and represents every value faithfully.
//!
//! Lines of both formats can be mixed in one file.

use crate::api::event::TrackingEvent;
use crate::api::token::TrackingId;
use crate::commons::ext_serde::parse_timestamp;
use super::EventFormat;


//------------ Separators ----------------------------------------------------

const ID_SEP: &str = " - ID: ";
const SUBJECT_SEP: &str = " - SUBJECT: ";
const TO_SEP: &str = " - TO: ";


//------------ encode --------------------------------------------------------

/// Encodes an event as a single line without the trailing line feed.
pub fn encode(
    event: &TrackingEvent, format: EventFormat
) -> Result<String, serde_json::Error> {
    match format {
        EventFormat::Text => Ok(encode_text(event)),
        EventFormat::Json => serde_json::to_string(event),
    }
}

fn encode_text(event: &TrackingEvent) -> String {
    let mut res = format!("{}{}{}", event.timestamp_str(), ID_SEP, event.id);
    if let Some(subject) = &event.subject {
        res.push_str(SUBJECT_SEP);
        push_single_line(&mut res, subject);
    }
    if let Some(to) = &event.to {
        res.push_str(TO_SEP);
        push_single_line(&mut res, to);
    }
    res
}

/// Appends a value replacing line breaks with spaces.
fn push_single_line(target: &mut String, value: &str) {
    target.extend(value.chars().map(|ch| match ch {
        '\r' | '\n' => ' ',
        ch => ch
    }));
}


//------------ parse ---------------------------------------------------------

/// Parses a single line.
///
/// Returns `None` if the line is not a valid event in either format.
pub fn parse(line: &str) -> Option<TrackingEvent> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.starts_with('{') {
        serde_json::from_str(line).ok()
    }
    else {
        parse_text(line)
    }
}

fn parse_text(line: &str) -> Option<TrackingEvent> {
    let (timestamp, rest) = line.split_once(ID_SEP)?;
    let timestamp = parse_timestamp(timestamp).ok()?;

    // Tokens never contain a separator, so the first one ends the token.
    let subject_pos = rest.find(SUBJECT_SEP);
    let to_pos = rest.find(TO_SEP);
    let (id, subject, to) = match (subject_pos, to_pos) {
        (Some(subject_pos), to_pos)
            if to_pos.is_none_or(|to_pos| subject_pos < to_pos) =>
        {
            let id = &rest[..subject_pos];
            let rest = &rest[subject_pos + SUBJECT_SEP.len()..];
            match rest.rsplit_once(TO_SEP) {
                Some((subject, to)) => (id, Some(subject), Some(to)),
                None => (id, Some(rest), None),
            }
        }
        (_, Some(to_pos)) => {
            (&rest[..to_pos], None, Some(&rest[to_pos + TO_SEP.len()..]))
        }
        _ => (rest, None, None),
    };

    let id: TrackingId = id.parse().ok()?;
    Some(TrackingEvent::new(
        id, timestamp, subject.map(Into::into), to.map(Into::into)
    ))
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use chrono::{TimeZone, Utc};
    use super::*;

    fn event(
        id: &str, subject: Option<&str>, to: Option<&str>
    ) -> TrackingEvent {
        TrackingEvent::new(
            id.parse().unwrap(),
            Utc.timestamp_millis_opt(1_749_850_493_235).unwrap(),
            subject.map(Into::into),
            to.map(Into::into),
        )
    }

    #[test]
    fn parse_legacy_line() {
        let parsed = parse(
            "2025-06-13T21:34:53.235Z - ID: 1749850493076-uq0oos"
        ).unwrap();
        assert_eq!(parsed, event("1749850493076-uq0oos", None, None));
    }

    #[test]
    fn parse_line_with_metadata() {
        let parsed = parse(
            "2025-06-13T21:34:53.235Z - ID: abc - SUBJECT: Lunch? \
             - TO: bob@example.com\r"
        ).unwrap();
        assert_eq!(
            parsed, event("abc", Some("Lunch?"), Some("bob@example.com"))
        );

        let parsed = parse(
            "2025-06-13T21:34:53.235Z - ID: abc - TO: bob@example.com"
        ).unwrap();
        assert_eq!(parsed, event("abc", None, Some("bob@example.com")));
    }

    #[test]
    fn text_round_trip() {
        for item in [
            event("1749850493076-uq0oos", None, None),
            event("a", Some("Quarterly report"), None),
            event("a", Some(""), Some("")),
            event("a", Some("Re: Fwd: plans"), Some("x@example.com")),
        ] {
            let line = encode(&item, EventFormat::Text).unwrap();
            assert_eq!(parse(&line), Some(item));
        }
    }

    #[test]
    fn text_separator_in_subject_is_not_preserved() {
        let item = event("a", Some("one - TO: two"), None);
        let line = encode(&item, EventFormat::Text).unwrap();
        let parsed = parse(&line).unwrap();

        assert_eq!(parsed.id, item.id);
        assert_eq!(parsed.timestamp, item.timestamp);
        assert_eq!(parsed.subject.as_deref(), Some("one"));
        assert_eq!(parsed.to.as_deref(), Some("two"));

        // Without a subject, separators in the recipient stay with it.
        for to in ["a - TO: b", "a - SUBJECT: b", "a - ID: b"] {
            let item = event("t", None, Some(to));
            let line = encode(&item, EventFormat::Text).unwrap();
            assert_eq!(parse(&line), Some(item));
        }

        // The token survives whatever the subject and recipient contain.
        let item = event("t", Some("x - SUBJECT: y"), Some("a - TO: b"));
        let line = encode(&item, EventFormat::Text).unwrap();
        let parsed = parse(&line).unwrap();
        assert_eq!(parsed.id, item.id);
        assert_eq!(parsed.timestamp, item.timestamp);
    }

    #[test]
    fn text_line_breaks_become_spaces() {
        let item = event(
            "t",
            Some("hi\n2020-01-01T00:00:00.000Z - ID: forged"),
            Some("bob\r\n@example.com"),
        );
        let line = encode(&item, EventFormat::Text).unwrap();
        assert!(!line.contains('\n'));
        assert!(!line.contains('\r'));

        let parsed = parse(&line).unwrap();
        assert_eq!(parsed.id, item.id);
        assert_eq!(
            parsed.subject.as_deref(),
            Some("hi 2020-01-01T00:00:00.000Z - ID: forged")
        );
        assert_eq!(parsed.to.as_deref(), Some("bob  @example.com"));
    }

    #[test]
    fn json_round_trip() {
        for item in [
            event("a", None, None),
            event("a", Some("one - TO: two"), Some("x - ID: y\nz")),
        ] {
            let line = encode(&item, EventFormat::Json).unwrap();
            assert!(!line.contains('\n'));
            assert_eq!(parse(&line), Some(item));
        }
    }

    #[test]
    fn malformed_lines() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("garbage"), None);
        assert_eq!(parse("2025-06-13T21:34:53.235Z - ID: "), None);
        assert_eq!(parse("not a time - ID: abc"), None);
        assert_eq!(parse("2025-06-13T21:34:53.235Z - ID"), None);
        assert_eq!(parse(r#"{"id":"abc"}"#), None);
        assert_eq!(parse(r#"{"id":"","timestamp":"2025-06-13T21:34:53.235Z"}"#), None);
    }
}
