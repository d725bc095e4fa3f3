//! Tracking identifiers and the pixel URLs that carry them.

use std::{error, fmt};
use std::str::FromStr;
use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use url::Url;
use crate::constants::TRACKING_ID_SUFFIX_LEN;


//------------ TrackingId ----------------------------------------------------

/// The token correlating all fetches of one injected tracking pixel.
///
/// A generated token is the current time in milliseconds since the epoch
/// followed by a dash and a short random base-36 suffix. Tokens received
/// from the network are taken as they are, the only requirement being that
/// they are not empty.
///
/// Nothing guarantees uniqueness. Two messages that happen to receive the
/// same token are silently merged into one.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackingId(String);

impl TrackingId {
    /// Generates a new token from the current time and random data.
    pub fn generate() -> Self {
        const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

        let mut rng = rand::rng();
        let suffix: String = (0..TRACKING_ID_SUFFIX_LEN).map(|_| {
            char::from(DIGITS[rng.random_range(0..DIGITS.len())])
        }).collect();

        TrackingId(format!("{}-{}", Utc::now().timestamp_millis(), suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TrackingId {
    type Err = EmptyTrackingId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            Err(EmptyTrackingId)
        }
        else {
            Ok(TrackingId(s.to_string()))
        }
    }
}

impl TryFrom<String> for TrackingId {
    type Error = EmptyTrackingId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.is_empty() {
            Err(EmptyTrackingId)
        }
        else {
            Ok(TrackingId(s))
        }
    }
}

impl From<TrackingId> for String {
    fn from(id: TrackingId) -> Self {
        id.0
    }
}

impl AsRef<str> for TrackingId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}


//------------ PixelUrl ------------------------------------------------------

/// The URL of a tracking pixel as embedded into an outgoing message.
///
/// This mirrors what the mail client side injector builds:
/// `<server>/pixel?id=<token>&subject=<subject>&to=<to>` with the optional
/// values form-encoded.
#[derive(Clone, Debug)]
pub struct PixelUrl {
    id: TrackingId,
    url: Url,
}

impl PixelUrl {
    pub fn new(
        server: &Url,
        id: TrackingId,
        subject: Option<&str>,
        to: Option<&str>,
    ) -> Result<Self, url::ParseError> {
        let mut url = if server.path().ends_with('/') {
            server.join("pixel")?
        }
        else {
            Url::parse(&format!("{server}/"))?.join("pixel")?
        };

        {
            let mut query = url.query_pairs_mut();
            query.clear();
            query.append_pair("id", id.as_str());
            if let Some(subject) = subject {
                query.append_pair("subject", subject);
            }
            if let Some(to) = to {
                query.append_pair("to", to);
            }
        }

        Ok(PixelUrl { id, url })
    }

    pub fn id(&self) -> &TrackingId {
        &self.id
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the HTML image element embedding the pixel.
    pub fn to_html(&self) -> String {
        format!(
            r#"<img src="{}" width="1" height="1" style="display:none" alt="">"#,
            self.url.as_str().replace('&', "&amp;").replace('"', "%22")
        )
    }
}

impl fmt::Display for PixelUrl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.url, f)
    }
}


//------------ EmptyTrackingId -----------------------------------------------

/// A tracking ID was empty.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EmptyTrackingId;

impl fmt::Display for EmptyTrackingId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("empty tracking ID")
    }
}

impl error::Error for EmptyTrackingId { }


//============ Tests =========================================================
