//! Defines all pixeltrack server side errors

use std::{error, fmt};

use hyper::StatusCode;

use crate::api::status::ErrorResponse;
use crate::eventlog::EventLogError;

//------------ Error ---------------------------------------------------------

#[derive(Debug)]
pub enum Error {
    //-----------------------------------------------------------------
    // System Issues
    //-----------------------------------------------------------------

    // internal server error, the event log cannot be read
    StorageUnavailable(EventLogError),

    // not on api (fails at start up)
    Custom(String),

    //-----------------------------------------------------------------
    // General API Client Issues
    //-----------------------------------------------------------------

    // internal server error
    JsonError(serde_json::Error),

    // BAD REQUEST, no tracking ID in a pixel request
    MissingIdentifier,

    // BAD REQUEST
    UnexpectedBody,
}

impl Error {
    pub fn custom(msg: impl fmt::Display) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Returns the HTTP status code to use for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::StorageUnavailable(_)
            | Error::Custom(_)
            | Error::JsonError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::MissingIdentifier
            | Error::UnexpectedBody => StatusCode::BAD_REQUEST,
        }
    }

    /// Returns the JSON body to use for this error.
    pub fn to_error_response(&self) -> ErrorResponse {
        match self {
            Error::StorageUnavailable(e) => {
                ErrorResponse::new("storage-unavailable", self).with_cause(e)
            }
            Error::Custom(_) => ErrorResponse::new("general-error", self),
            Error::JsonError(e) => {
                ErrorResponse::new("api-invalid-json", self).with_cause(e)
            }
            Error::MissingIdentifier => {
                ErrorResponse::new("api-missing-id", self)
            }
            Error::UnexpectedBody => {
                ErrorResponse::new("api-unexpected-body", self)
            }
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::StorageUnavailable(_) => f.write_str("Failed to read logs"),
            Error::Custom(s) => f.write_str(s),
            Error::JsonError(e) => write!(f, "Invalid JSON: {e}"),
            Error::MissingIdentifier => f.write_str("Missing tracking ID"),
            Error::UnexpectedBody => {
                f.write_str("Request must not include a body")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::StorageUnavailable(e) => Some(e),
            Error::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

//------------ Tests ---------------------------------------------------------
