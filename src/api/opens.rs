//! Classification of genuine opens.
//!
//! Mail clients and security scanners often fetch images automatically when
//! a message arrives, so a single fetch of a pixel says little about whether
//! a person ever looked at the message. The heuristic used here treats the
//! first fetch of every token as such a prefetch and every later fetch as a
//! genuine open.
//!
//! This is a heuristic and nothing more. A message opened by a person that
//! caused only one fetch is missed, and a scanner fetching an image twice
//! looks like a genuine open.

use std::collections::HashMap;
use std::fmt;
use serde::Serialize;
use super::event::TrackingEvent;
use super::token::TrackingId;


//------------ genuine_opens -------------------------------------------------

/// Groups events by token and returns the tokens with genuine opens.
///
/// The events are expected in the order they were recorded. Groups are
/// returned in the order their token first appears.
pub fn genuine_opens(events: &[TrackingEvent]) -> Vec<GenuineOpens> {
    let mut index: HashMap<&TrackingId, usize> = HashMap::new();
    let mut groups: Vec<Vec<&TrackingEvent>> = Vec::new();

    for event in events {
        match index.get(&event.id) {
            Some(&idx) => groups[idx].push(event),
            None => {
                index.insert(&event.id, groups.len());
                groups.push(vec![event]);
            }
        }
    }

    groups.into_iter().filter_map(GenuineOpens::from_fetches).collect()
}


//------------ GenuineOpens --------------------------------------------------

/// The genuine opens of a single tracking token.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct GenuineOpens {
    /// The token.
    pub id: TrackingId,

    /// The number of fetches after the first one.
    pub count: usize,

    /// The most recent fetch.
    pub representative: TrackingEvent,

    /// All fetches after the first one, oldest first.
    pub opens: Vec<TrackingEvent>,
}

impl GenuineOpens {
    fn from_fetches(fetches: Vec<&TrackingEvent>) -> Option<Self> {
        let (_prefetch, opens) = fetches.split_first()?;
        let representative = opens.last()?;
        Some(GenuineOpens {
            id: representative.id.clone(),
            count: opens.len(),
            representative: (*representative).clone(),
            opens: opens.iter().map(|event| (*event).clone()).collect(),
        })
    }
}


//------------ OpensReport ---------------------------------------------------

/// The genuine opens found in a list of events.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct OpensReport {
    pub opens: Vec<GenuineOpens>,
}

impl OpensReport {
    pub fn from_events(events: &[TrackingEvent]) -> Self {
        OpensReport { opens: genuine_opens(events) }
    }

    /// Returns the total number of genuine opens across all tokens.
    pub fn total(&self) -> usize {
        self.opens.iter().map(|item| item.count).sum()
    }
}

impl fmt::Display for OpensReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.opens.is_empty() {
            return writeln!(f, "No genuine opens detected yet.")
        }
        for item in &self.opens {
            writeln!(f, "{} opened {} time(s)", item.id, item.count)?;
            writeln!(
                f, "  last: {}", item.representative.timestamp_str()
            )?;
            if let Some(subject) = &item.representative.subject {
                writeln!(f, "  subject: {subject}")?;
            }
            if let Some(to) = &item.representative.to {
                writeln!(f, "  to: {to}")?;
            }
        }
        Ok(())
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use std::str::FromStr;
    use chrono::{TimeZone, Utc};
    use super::*;

    fn event(id: &str, secs: i64) -> TrackingEvent {
        TrackingEvent::new(
            TrackingId::from_str(id).unwrap(),
            Utc.timestamp_opt(secs, 0).unwrap(),
            None, None,
        )
    }

    #[test]
    fn one_group_with_genuine_open() {
        let events = [event("a", 1), event("a", 2), event("b", 1)];
        let opens = genuine_opens(&events);

        assert_eq!(opens.len(), 1);
        assert_eq!(opens[0].id.as_str(), "a");
        assert_eq!(opens[0].count, 1);
        assert_eq!(opens[0].representative, events[1]);
        assert_eq!(opens[0].opens, vec![events[1].clone()]);
    }

    #[test]
    fn groups_in_first_appearance_order() {
        let events = [
            event("b", 1), event("a", 2), event("a", 3),
            event("b", 4), event("a", 5), event("c", 6),
        ];
        let report = OpensReport::from_events(&events);

        let ids: Vec<_> = report.opens.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
        assert_eq!(report.opens[0].count, 1);
        assert_eq!(report.opens[0].representative, events[3]);
        assert_eq!(report.opens[1].count, 2);
        assert_eq!(report.opens[1].representative, events[4]);
        assert_eq!(report.total(), 3);
    }

    #[test]
    fn no_events_no_opens() {
        assert!(genuine_opens(&[]).is_empty());
        assert!(genuine_opens(&[event("a", 1)]).is_empty());
        assert_eq!(
            OpensReport::default().to_string(),
            "No genuine opens detected yet.\n"
        );
    }
}
