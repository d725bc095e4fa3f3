//! Formatting of results for the user.

use std::{error, fmt};
use std::str::FromStr;
use serde::Serialize;
use super::client;


//------------ ReportFormat --------------------------------------------------

/// The format to use when showing a result.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ReportFormat {
    /// Human readable text.
    #[default]
    Text,

    /// Pretty printed JSON.
    Json,
}

impl FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, ReportError> {
        match s {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => Err(ReportError::UnrecognisedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            ReportFormat::Text => "text",
            ReportFormat::Json => "json",
        })
    }
}


//------------ Report --------------------------------------------------------

/// The outcome of a client command ready to be shown to the user.
pub struct Report {
    content: Result<Box<dyn ReportContent>, client::Error>,
}

impl Report {
    pub fn new<T: ReportContent + 'static>(content: T) -> Self {
        Report { content: Ok(Box::new(content)) }
    }

    pub fn from_err(err: client::Error) -> Self {
        Report { content: Err(err) }
    }

    /// Renders the report in the given format.
    pub fn report(&self, format: ReportFormat) -> Result<String, ReportError> {
        match &self.content {
            Ok(content) => content.report(format),
            Err(err) => Err(ReportError::Client(err.to_string())),
        }
    }
}

impl<T: ReportContent + 'static> From<Result<T, client::Error>> for Report {
    fn from(res: Result<T, client::Error>) -> Self {
        match res {
            Ok(content) => Self::new(content),
            Err(err) => Self::from_err(err),
        }
    }
}


//------------ ReportContent -------------------------------------------------

/// Something that can be shown as text or as JSON.
pub trait ReportContent {
    fn report(&self, format: ReportFormat) -> Result<String, ReportError>;
}

impl<T: Serialize + fmt::Display> ReportContent for T {
    fn report(&self, format: ReportFormat) -> Result<String, ReportError> {
        match format {
            ReportFormat::Text => Ok(self.to_string()),
            ReportFormat::Json => {
                serde_json::to_string_pretty(self).map_err(|err| {
                    ReportError::Json(err.to_string())
                })
            }
        }
    }
}


//------------ ReportError ---------------------------------------------------

#[derive(Debug)]
pub enum ReportError {
    UnrecognisedFormat(String),
    Json(String),
    Client(String),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ReportError::UnrecognisedFormat(s) => {
                write!(f, "This report format is not recognised: {s}")
            }
            ReportError::Json(s) => write!(f, "Cannot format as JSON: {s}"),
            ReportError::Client(s) => f.write_str(s),
        }
    }
}

impl error::Error for ReportError { }


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use crate::api::event::EventList;
    use super::*;

    #[test]
    fn report_formats() {
        assert_eq!(ReportFormat::from_str("json").unwrap(), ReportFormat::Json);
        assert!(ReportFormat::from_str("xml").is_err());

        let report = Report::new(EventList::default());
        assert_eq!(
            report.report(ReportFormat::Text).unwrap(),
            "No events recorded yet.\n"
        );
        let json: serde_json::Value = serde_json::from_str(
            &report.report(ReportFormat::Json).unwrap()
        ).unwrap();
        assert_eq!(json, serde_json::json!({ "events": [] }));

        let report = Report::from(Err::<EventList, _>(
            client::Error::response("http://localhost:3000/logs", "boom")
        ));
        assert!(report.report(ReportFormat::Text).is_err());
    }
}
