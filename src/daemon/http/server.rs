//! The HTTP server.
//!
//! Here we hold on to what requests need, wrap incoming Hyper requests and
//! hand them off to dispatching. All responses get the CORS headers added
//! and are logged.

use std::error;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use hyper::Method;
use log::{debug, error, info, log_enabled, trace};
use crate::commons::error::Error;
use crate::config::Config;
use crate::eventlog::EventLog;
use super::dispatch::dispatch_request;
use super::request::{HyperRequest, Request};
use super::response::{HttpResponse, HyperResponse};


//------------ HttpServer ----------------------------------------------------

pub struct HttpServer {
    /// The log all tracking events go to.
    event_log: Arc<EventLog>,

    /// The configuration of the daemon.
    config: Arc<Config>,
}

impl HttpServer {
    pub fn new(event_log: EventLog, config: Arc<Config>) -> Self {
        HttpServer { event_log: Arc::new(event_log), config }
    }

    pub fn event_log(&self) -> &Arc<EventLog> {
        &self.event_log
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn process_request(
        &self,
        request: HyperRequest,
        remote: Option<SocketAddr>,
    ) -> Result<HyperResponse, Infallible> {
        let request = Request::new(request, self, remote);
        let method = request.method().clone();
        let path = request.path();

        if log_enabled!(log::Level::Trace) {
            trace!(
                "{} {} {:?}",
                method,
                path.as_ref().map(ToString::to_string).unwrap_or_default(),
                request.query(),
            );
        }

        let mut response = if method == Method::OPTIONS {
            HttpResponse::no_content()
        }
        else {
            match &path {
                Ok(path) => {
                    match dispatch_request(request, path.iter()).await {
                        Ok(response) => response,
                        Err(err) => err.into_response(),
                    }
                }
                Err(err) => {
                    info!("{method}: {err}");
                    HttpResponse::bad_request()
                }
            }
        };
        response.add_cors_headers();

        let path = path.as_ref().map(|path| path.as_str()).unwrap_or("-");
        if response.status().is_server_error() {
            match response.cause() {
                Some(cause) => {
                    error!(
                        "{} {} {}: {}",
                        method, path, response.status(), describe(cause)
                    )
                }
                None => error!("{} {} {}", method, path, response.status()),
            }
        }
        else {
            match response.cause() {
                Some(cause) => {
                    debug!(
                        "{} {} {}: {}", method, path, response.status(), cause
                    )
                }
                None => debug!("{} {} {}", method, path, response.status()),
            }
        }

        Ok(response.into_hyper())
    }
}

/// Describes an error including its source for logging.
fn describe(cause: &Error) -> String {
    match error::Error::source(cause) {
        Some(source) => format!("{cause} ({source})"),
        None => cause.to_string(),
    }
}
