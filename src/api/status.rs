//! Status and error reporting.

use std::fmt;
use std::collections::HashMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::constants::{PIXELTRACK_STATUS_RUNNING, PIXELTRACK_VERSION};


//------------ HealthStatus --------------------------------------------------

/// The response of the health endpoint.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct HealthStatus {
    /// A human readable status line.
    pub status: String,

    /// The version of the server.
    #[serde(default)]
    pub version: String,

    /// The current time at the server.
    pub timestamp: DateTime<Utc>,
}

impl HealthStatus {
    /// Creates the status of a running server at the current time.
    pub fn running() -> Self {
        HealthStatus {
            status: PIXELTRACK_STATUS_RUNNING.to_string(),
            version: PIXELTRACK_VERSION.to_string(),
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f, "{} (version {}) at {}",
            self.status, self.version, self.timestamp.to_rfc3339()
        )
    }
}


//------------ ErrorResponse -------------------------------------------------

/// An API error response.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ErrorResponse {
    /// The error label.
    pub label: String,

    /// The error message.
    pub msg: String,

    /// Arguments with details about the error.
    #[serde(default)]
    pub args: HashMap<String, String>,
}

impl ErrorResponse {
    pub fn new(label: &str, msg: impl fmt::Display) -> Self {
        ErrorResponse {
            label: label.to_string(),
            msg: msg.to_string(),
            args: HashMap::new(),
        }
    }

    pub fn with_arg(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.args.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_cause(self, cause: impl fmt::Display) -> Self {
        self.with_arg("cause", cause)
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.msg)?;
        if let Some(cause) = self.args.get("cause") {
            write!(f, " ({cause})")?;
        }
        Ok(())
    }
}


//============ Tests =========================================================
