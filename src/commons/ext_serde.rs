//! Defines helper methods for Serializing and Deserializing external types.
use std::net::IpAddr;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use log::LevelFilter;
use serde::{de, Deserialize, Deserializer, Serializer};

//------------ Timestamps ----------------------------------------------------

/// Formats a timestamp as ISO 8601 with milliseconds, e.g.
/// `2025-06-13T21:34:53.235Z`.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses an RFC 3339 timestamp in any offset and converts it to UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|ts| ts.with_timezone(&Utc))
}

pub fn ser_timestamp<S>(timestamp: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&format_timestamp(timestamp))
}

pub fn de_timestamp<'de, D>(d: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let string = String::deserialize(d)?;
    parse_timestamp(&string).map_err(de::Error::custom)
}

//------------ LevelFilter ---------------------------------------------------

pub fn de_level_filter<'de, D>(d: D) -> Result<LevelFilter, D::Error>
where
    D: Deserializer<'de>,
{
    let string = String::deserialize(d)?;
    LevelFilter::from_str(&string).map_err(de::Error::custom)
}

//------------ IpAddr --------------------------------------------------------

/// Deserializes either a single IP address or a list of them.
pub fn de_ip_addrs<'de, D>(d: D) -> Result<Vec<IpAddr>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(IpAddr),
        Many(Vec<IpAddr>),
    }

    match OneOrMany::deserialize(d)? {
        OneOrMany::One(addr) => Ok(vec![addr]),
        OneOrMany::Many(addrs) if addrs.is_empty() => {
            Err(de::Error::custom("expected at least one IP address"))
        }
        OneOrMany::Many(addrs) => Ok(addrs),
    }
}

//============ Tests =========================================================
