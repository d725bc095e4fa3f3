//! The HTTP client talking to a pixeltrack server.

use std::fmt;
use std::time::Duration;
use reqwest::{Response, StatusCode};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::de::DeserializeOwned;
use url::Url;
use crate::api::event::EventList;
use crate::api::status::{ErrorResponse, HealthStatus};
use crate::constants::HTTP_CLIENT_TIMEOUT_SECS;

const JSON_CONTENT: &str = "application/json";


//------------ PixeltrackClient ----------------------------------------------

/// A client for the API of a pixeltrack server.
#[derive(Clone, Debug)]
pub struct PixeltrackClient {
    /// The base URI of the server.
    server: Url,

    /// Only print the API calls instead of executing them.
    api_only: bool,

    /// The HTTP client.
    client: reqwest::Client,
}

impl PixeltrackClient {
    pub fn new(server: Url) -> Result<Self, Error> {
        let client = reqwest::ClientBuilder::new()
            .timeout(Duration::from_secs(HTTP_CLIENT_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::request_build(server.as_str(), e))?;
        Ok(PixeltrackClient { server, api_only: false, client })
    }

    /// Makes the client print API calls rather than executing them.
    pub fn with_api_only(mut self, api_only: bool) -> Self {
        self.api_only = api_only;
        self
    }

    pub fn server(&self) -> &Url {
        &self.server
    }

    /// Checks that the server is running.
    pub async fn health(&self) -> Result<HealthStatus, Error> {
        self.get_json("").await
    }

    /// Returns the most recent events recorded by the server.
    pub async fn events(&self) -> Result<EventList, Error> {
        self.get_json("logs").await
    }

    fn uri(&self, path: &str) -> Result<Url, Error> {
        let base = if self.server.path().ends_with('/') {
            self.server.clone()
        }
        else {
            Url::parse(&format!("{}/", self.server)).map_err(|e| {
                Error::request_build(self.server.as_str(), e)
            })?
        };
        base.join(path).map_err(|e| Error::request_build(base.as_str(), e))
    }

    /// Performs a GET request that expects a JSON response that can be
    /// deserialized into an owned value of the expected type.
    async fn get_json<T: DeserializeOwned>(
        &self, path: &str
    ) -> Result<T, Error> {
        let uri = self.uri(path)?;
        if self.api_only {
            println!("GET:\n  {uri}");
            std::process::exit(0);
        }

        let res = self.client
            .get(uri.as_str())
            .headers(headers())
            .send()
            .await
            .map_err(|e| Error::execute(uri.as_str(), e))?;

        process_json_response(uri.as_str(), res).await
    }
}

fn headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(
            concat!("pixeltrackc/", env!("CARGO_PKG_VERSION"))
        )
    );
    headers.insert(ACCEPT, HeaderValue::from_static(JSON_CONTENT));
    headers
}

async fn process_json_response<T: DeserializeOwned>(
    uri: &str, res: Response
) -> Result<T, Error> {
    match res.status() {
        StatusCode::OK => {
            let body = res.text().await.map_err(|e| {
                Error::response(uri, format!("cannot get body: {e}"))
            })?;
            if body.is_empty() {
                return Err(Error::response(uri, "got empty response body"))
            }
            serde_json::from_str(&body).map_err(|e| {
                Error::response(
                    uri, format!("could not parse JSON response: {e}")
                )
            })
        }
        _ => Err(Error::from_res(uri, res).await),
    }
}


//------------ Error ---------------------------------------------------------

type ErrorUri = String;
type ErrorMessage = String;

#[derive(Debug)]
pub enum Error {
    RequestBuild(ErrorUri, ErrorMessage),
    RequestExecute(ErrorUri, ErrorMessage),
    Response(ErrorUri, ErrorMessage),
    ErrorResponseWithBody(ErrorUri, StatusCode, String),
    ErrorResponseWithJson(ErrorUri, StatusCode, ErrorResponse),
}

impl Error {
    pub fn request_build(uri: &str, msg: impl fmt::Display) -> Self {
        Error::RequestBuild(uri.to_string(), msg.to_string())
    }

    pub fn execute(uri: &str, msg: impl fmt::Display) -> Self {
        Error::RequestExecute(uri.to_string(), msg.to_string())
    }

    pub fn response(uri: &str, msg: impl fmt::Display) -> Self {
        Error::Response(uri.to_string(), msg.to_string())
    }

    pub fn response_unexpected_status(uri: &str, status: StatusCode) -> Self {
        Error::Response(
            uri.to_string(), format!("unexpected status code {status}")
        )
    }

    async fn from_res(uri: &str, res: Response) -> Error {
        let status = res.status();
        match res.text().await {
            Ok(body) => {
                if body.is_empty() {
                    Self::response_unexpected_status(uri, status)
                } else {
                    match serde_json::from_str::<ErrorResponse>(&body) {
                        Ok(res) => Error::ErrorResponseWithJson(
                            uri.to_string(), status, res
                        ),
                        Err(_) => Error::ErrorResponseWithBody(
                            uri.to_string(), status, body
                        ),
                    }
                }
            }
            _ => Self::response_unexpected_status(uri, status),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::RequestBuild(uri, msg) => {
                write!(
                    f, "Issue creating request for URI: {uri}, error: {msg}"
                )
            }
            Error::RequestExecute(uri, msg) => {
                write!(f, "Issue accessing URI: {uri}, error: {msg}")
            }
            Error::Response(uri, msg) => {
                write!(
                    f,
                    "Issue processing response from URI: {uri}, \
                     error: {msg}"
                )
            }
            Error::ErrorResponseWithBody(uri, code, e) => {
                write!(
                    f,
                    "Error response from URI: {uri}, Status: {code}, \
                     Error: {e}"
                )
            }
            Error::ErrorResponseWithJson(uri, code, res) => {
                write!(
                    f,
                    "Error response from URI: {uri}, Status: {code}, \
                     ErrorResponse: {res}"
                )
            }
        }
    }
}

impl std::error::Error for Error { }


//============ Tests =========================================================
