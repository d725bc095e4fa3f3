//! Dispatch error handling.

use crate::commons::error::Error;
use super::super::response::HttpResponse;


//------------ DispatchError -------------------------------------------------

/// An error occured during dispatch.
///
/// This error type exists so you can use the question mark operator for all
/// sorts of things during dispatch to minimize clutter. It always carries
/// the response to send back to the client. Various `From<_>` impls are
/// provided to translate errors into that response.
#[derive(Debug)]
pub struct DispatchError(HttpResponse);

impl DispatchError {
    pub fn into_response(self) -> HttpResponse {
        self.0
    }
}

impl From<HttpResponse> for DispatchError {
    fn from(src: HttpResponse) -> Self {
        Self(src)
    }
}

impl From<Error> for DispatchError {
    fn from(src: Error) -> Self {
        Self(HttpResponse::response_from_error(src))
    }
}
