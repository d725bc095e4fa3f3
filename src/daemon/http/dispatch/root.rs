//! Root level.

use log::{debug, info, warn};
use crate::api::event::{EventList, TrackingEvent};
use crate::api::status::HealthStatus;
use crate::api::token::TrackingId;
use crate::commons::error::Error;
use super::super::request::{PathIter, Request};
use super::super::response::HttpResponse;
use super::error::DispatchError;


//------------ / -------------------------------------------------------------

pub async fn dispatch_request(
    request: Request<'_>,
    mut path: PathIter<'_>,
) -> Result<HttpResponse, DispatchError> {
    match path.next() {
        Some("") => index(request, path),
        Some("logs") => logs(request, path),
        Some("pixel") => pixel(request, path).await,
        _ => Ok(HttpResponse::not_found())
    }
}


//------------ / -------------------------------------------------------------

/// The liveness check.
fn index(
    request: Request<'_>, path: PathIter<'_>,
) -> Result<HttpResponse, DispatchError> {
    path.check_exhausted()?;
    request.check_get()?;
    request.empty()?;
    Ok(HttpResponse::json(&HealthStatus::running()))
}


//------------ /pixel --------------------------------------------------------

/// Serves the tracking pixel and records the fetch.
///
/// Failing to record the fetch is logged but the pixel is served anyway.
async fn pixel(
    request: Request<'_>, path: PathIter<'_>,
) -> Result<HttpResponse, DispatchError> {
    let path = path.strip_trailing_slash();
    path.check_exhausted()?;
    request.check_get()?;

    let query = request.query();
    let user_agent = request.user_agent();
    let remote = request.remote_addr();
    let server = request.empty()?;

    let id = match query.get_non_empty("id") {
        Some(id) => id.parse::<TrackingId>().map_err(|_| {
            HttpResponse::text_from_error(Error::MissingIdentifier)
        })?,
        None => {
            debug!(
                "Pixel request without tracking ID from {}",
                remote.map(|addr| addr.to_string()).unwrap_or_default()
            );
            return Err(
                HttpResponse::text_from_error(Error::MissingIdentifier).into()
            )
        }
    };

    let event = TrackingEvent::now(
        id,
        query.get("subject").map(ToString::to_string),
        query.get("to").map(ToString::to_string),
    );

    info!(
        "Pixel fetched for {} from {} using '{}'",
        event.id,
        remote.map(|addr| addr.to_string()).unwrap_or_else(|| "-".into()),
        user_agent.as_deref().unwrap_or("-"),
    );

    let id = event.id.clone();
    if let Err(err) = server.event_log().clone().spawn_append(event).await {
        warn!("Failed to record tracking event for {}: {}", id, err);
    }

    Ok(HttpResponse::pixel())
}


//------------ /logs ---------------------------------------------------------

/// Returns the most recent events.
fn logs(
    request: Request<'_>, path: PathIter<'_>,
) -> Result<HttpResponse, DispatchError> {
    let path = path.strip_trailing_slash();
    path.check_exhausted()?;
    request.check_get()?;
    let server = request.empty()?;

    let events = server.event_log()
        .read_recent(server.config().logs_limit)
        .map_err(Error::StorageUnavailable)?;
    Ok(HttpResponse::json(&EventList::new(events)))
}
