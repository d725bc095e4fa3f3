//! HTTP requests.

use std::fmt;
use std::borrow::Cow;
use std::net::SocketAddr;
use hyper::Method;
use hyper::body::Body;
use hyper::header::USER_AGENT;
use percent_encoding::percent_decode;
use crate::commons::error::Error;
use crate::constants::HTTP_USER_AGENT_TRUNCATE;
use super::response::HttpResponse;
use super::server::HttpServer;


//------------ HyperRequest --------------------------------------------------

/// A type alias for the request we receive from Hyper.
pub type HyperRequest = hyper::Request<hyper::body::Incoming>;


//------------ Request -------------------------------------------------------

/// An enriched request.
pub struct Request<'a> {
    /// The underlying raw request.
    request: HyperRequest,

    /// The server providing access to the event log.
    server: &'a HttpServer,

    /// The address of the peer if known.
    remote: Option<SocketAddr>,
}

impl<'a> Request<'a> {
    /// Creates a request from the various necessary information.
    pub fn new(
        request: HyperRequest,
        server: &'a HttpServer,
        remote: Option<SocketAddr>,
    ) -> Self {
        Self { request, server, remote }
    }

    /// Returns the method of this request.
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// Checks whether the request is a GET or returns an error response.
    ///
    /// HEAD requests are treated as GET requests. Hyper drops the body of
    /// the response for them.
    pub fn check_get(&self) -> Result<(), HttpResponse> {
        match *self.request.method() {
            Method::GET | Method::HEAD => Ok(()),
            _ => Err(HttpResponse::method_not_allowed()),
        }
    }

    /// Returns the current request path.
    pub fn path(&self) -> Result<RequestPath, InvalidPath> {
        RequestPath::from_request(self)
    }

    /// Returns the decoded query parameters.
    pub fn query(&self) -> QueryParams {
        QueryParams::from_query(self.request.uri().query())
    }

    /// Returns the user agent header if present.
    pub fn user_agent(&self) -> Option<String> {
        match self.request.headers().get(&USER_AGENT) {
            None => None,
            Some(value) => value.to_str().ok().map(|s| {
                // HeaderValue::to_str only succeeds for visible ASCII, so
                // every byte is a character boundary.
                if s.len() > HTTP_USER_AGENT_TRUNCATE {
                    s[..HTTP_USER_AGENT_TRUNCATE].to_string()
                } else {
                    s.to_string()
                }
            }),
        }
    }

    /// Returns the address of the peer.
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote
    }

    /// Ensures the body is empty and progresses to the server.
    pub fn empty(self) -> Result<&'a HttpServer, Error> {
        if self.request.body().size_hint().upper() != Some(0) {
            return Err(Error::UnexpectedBody)
        }
        Ok(self.server)
    }
}


//------------ QueryParams ---------------------------------------------------

/// The query parameters of a request.
///
/// Names and values are decoded using form-urlencoded rules, i.e., a `+`
/// becomes a space.
#[derive(Clone, Debug, Default)]
pub struct QueryParams {
    params: Vec<(String, String)>,
}

impl QueryParams {
    pub fn from_query(query: Option<&str>) -> Self {
        QueryParams {
            params: query.map(|query| {
                url::form_urlencoded::parse(query.as_bytes())
                    .into_owned()
                    .collect()
            }).unwrap_or_default()
        }
    }

    /// Returns the value of the first parameter with the given name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params.iter().find_map(|(key, value)| {
            (key == name).then_some(value.as_str())
        })
    }

    /// Returns the value of the given parameter unless it is empty.
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|value| !value.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}


//------------ RequestPath ---------------------------------------------------

/// The percent-decoded path of a request’s URI.
///
/// It primarily allows iterating over the path segments. Note that because
/// it needs to be a “borrowing iterator,” it cannot implement the normal
/// `Iterator` trait.
#[derive(Debug, Clone)]
pub struct RequestPath {
    path: String,
}

impl RequestPath {
    fn from_request(request: &Request) -> Result<Self, InvalidPath> {
        Self::decode(request.request.uri().path())
    }

    fn decode(path: &str) -> Result<Self, InvalidPath> {
        let path = match percent_decode(path.as_bytes()).decode_utf8() {
            Ok(Cow::Borrowed(path)) => path.to_string(),
            Ok(Cow::Owned(path)) => path,
            Err(_) => return Err(InvalidPath),
        };
        Ok(Self { path })
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub fn iter(&self) -> PathIter<'_> {
        PathIter::new(self.as_str())
    }
}

impl AsRef<str> for RequestPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for RequestPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.path)
    }
}


//------------ PathIter ------------------------------------------------------

#[derive(Debug)]
pub struct PathIter<'a> {
    remaining: Option<&'a str>,
}

impl<'a> PathIter<'a> {
    fn new(path: &'a str) -> Self {
        Self {
            remaining: Some(path.strip_prefix('/').unwrap_or(path))
        }
    }

    /// Returns a copy with a possible trailing slash removed.
    pub fn strip_trailing_slash(&self) -> Self {
        // Some("") means there _was_ a trailing slash and we are now just
        // past it. So we need to transform this case into an exhausted path.
        let remaining = match self.remaining {
            Some("") | None => None,
            Some(remaining) => {
                Some(remaining.strip_suffix('/').unwrap_or(remaining))
            }
        };
        Self { remaining }
    }

    /// Checks that the path has been exhausted.
    ///
    /// Returns a 404 error response if it isn’t.
    pub fn check_exhausted(&self) -> Result<(), HttpResponse> {
        if self.remaining.is_some() {
            Err(HttpResponse::not_found())
        }
        else {
            Ok(())
        }
    }
}

impl<'a> Iterator for PathIter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let remaining = self.remaining?;
        let slash = match remaining.find('/') {
            Some(pos) => pos,
            None => {
                let res = remaining;
                self.remaining = None;
                return Some(res)
            }
        };
        let res = &remaining[..slash];
        self.remaining = Some(&remaining[slash + 1..]);
        Some(res)
    }
}


//------------ InvalidPath ---------------------------------------------------

/// An error happened while preparing the request path.
#[derive(Clone, Copy, Debug)]
pub struct InvalidPath;

impl fmt::Display for InvalidPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("invalid request path")
    }
}


//============ Tests =========================================================
