//! Tracking events.

use std::fmt;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use crate::commons::ext_serde;
use super::token::TrackingId;


//------------ TrackingEvent -------------------------------------------------

/// One observed fetch of a tracking pixel.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TrackingEvent {
    /// The token of the fetched pixel.
    pub id: TrackingId,

    /// The time the server saw the fetch.
    ///
    /// This is kept at millisecond precision which is what the log formats
    /// can represent.
    #[serde(
        serialize_with = "ext_serde::ser_timestamp",
        deserialize_with = "ext_serde::de_timestamp"
    )]
    pub timestamp: DateTime<Utc>,

    /// The subject of the message as supplied by the sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// The recipient of the message as supplied by the sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

impl TrackingEvent {
    /// Creates an event for a fetch happening right now.
    pub fn now(
        id: TrackingId, subject: Option<String>, to: Option<String>
    ) -> Self {
        Self::new(id, Utc::now(), subject, to)
    }

    pub fn new(
        id: TrackingId,
        timestamp: DateTime<Utc>,
        subject: Option<String>,
        to: Option<String>,
    ) -> Self {
        TrackingEvent {
            id,
            timestamp: timestamp.trunc_subsecs(3),
            subject,
            to,
        }
    }

    /// Returns the timestamp in the format used by the logs.
    pub fn timestamp_str(&self) -> String {
        ext_serde::format_timestamp(&self.timestamp)
    }
}

impl fmt::Display for TrackingEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.timestamp_str(), self.id)?;
        if let Some(subject) = &self.subject {
            write!(f, " subject: {subject}")?;
        }
        if let Some(to) = &self.to {
            write!(f, " to: {to}")?;
        }
        Ok(())
    }
}


//------------ EventList -----------------------------------------------------

/// The response of the events query endpoint.
///
/// Events are in the order they were recorded, oldest first.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventList {
    pub events: Vec<TrackingEvent>,
}

impl EventList {
    pub fn new(events: Vec<TrackingEvent>) -> Self {
        EventList { events }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl fmt::Display for EventList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.events.is_empty() {
            return writeln!(f, "No events recorded yet.")
        }
        for event in &self.events {
            writeln!(f, "{event}")?;
        }
        Ok(())
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use std::str::FromStr;
    use chrono::TimeZone;
    use super::*;

    fn id(s: &str) -> TrackingId {
        TrackingId::from_str(s).unwrap()
    }

    #[test]
    fn event_json() {
        let timestamp = Utc.with_ymd_and_hms(2025, 6, 13, 21, 34, 53).unwrap();
        let event = TrackingEvent::new(
            id("1749850493076-uq0oos"), timestamp, None, None
        );
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"id":"1749850493076-uq0oos","timestamp":"2025-06-13T21:34:53.000Z"}"#
        );

        let event = TrackingEvent::new(
            id("a"), timestamp, Some("Hi".into()), Some("bob@example.com".into())
        );
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"id":"a","timestamp":"2025-06-13T21:34:53.000Z","subject":"Hi","to":"bob@example.com"}"#
        );
        assert_eq!(
            serde_json::from_str::<TrackingEvent>(&json).unwrap(), event
        );
    }

    #[test]
    fn timestamp_precision() {
        let event = TrackingEvent::now(id("a"), None, None);
        assert_eq!(event.timestamp.timestamp_subsec_nanos() % 1_000_000, 0);
    }

    #[test]
    fn event_list_json() {
        let list: EventList = serde_json::from_str(
            r#"{"events":[{"id":"x","timestamp":"2025-06-13T21:34:53.235Z"}]}"#
        ).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.events[0].id, id("x"));
        assert_eq!(list.events[0].timestamp_str(), "2025-06-13T21:34:53.235Z");
    }
}
