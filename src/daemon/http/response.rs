use bytes::Bytes;
use http_body_util::{Either, Empty, Full};
use hyper::{HeaderMap, StatusCode};
use hyper::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_TYPE, EXPIRES,
    HeaderValue, PRAGMA,
};
use serde::Serialize;
use crate::commons::error::Error;
use crate::constants::{TRACKING_PIXEL_CACHE_CONTROL, TRACKING_PIXEL_GIF};


//----------- ContentType ----------------------------------------------------

#[derive(Clone, Copy)]
enum ContentType {
    Gif,
    Json,
    Text,
}

impl ContentType {
    fn as_str(&self) -> &'static str {
        match self {
            ContentType::Gif => "image/gif",
            ContentType::Json => "application/json",
            ContentType::Text => "text/plain",
        }
    }
}

//------------ HyperResponse -------------------------------------------------

pub type HyperResponseBody = Either<Empty<Bytes>, Full<Bytes>>;
pub type HyperResponse = hyper::Response<HyperResponseBody>;

//----------- Response -------------------------------------------------------

struct Response {
    status: StatusCode,
    content_type: ContentType,
    no_store: bool,
    body: Bytes,
    cause: Option<Error>,
}

impl Response {
    fn new(status: StatusCode) -> Self {
        Response {
            status,
            content_type: ContentType::Text,
            no_store: false,
            body: Bytes::default(),
            cause: None,
        }
    }

    fn finalize(self) -> HttpResponse {
        let body = if self.body.is_empty() {
            Either::Left(Empty::new())
        } else {
            Either::Right(Full::new(self.body))
        };
        let mut response = hyper::Response::new(body);
        *response.status_mut() = self.status;

        let headers = response.headers_mut();
        headers.insert(
            CONTENT_TYPE, HeaderValue::from_static(self.content_type.as_str())
        );
        if self.no_store {
            headers.insert(
                CACHE_CONTROL,
                HeaderValue::from_static(TRACKING_PIXEL_CACHE_CONTROL)
            );
            headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
            headers.insert(EXPIRES, HeaderValue::from_static("0"));
        }

        let mut r = HttpResponse::new(response);
        if let Some(cause) = self.cause {
            r.set_cause(cause);
        }
        r
    }
}

impl From<Response> for HttpResponse {
    fn from(res: Response) -> Self {
        res.finalize()
    }
}


//------------ HttpResponse --------------------------------------------------

#[derive(Debug)]
pub struct HttpResponse {
    response: HyperResponse,
    cause: Option<Error>,
}

impl HttpResponse {
    pub fn new(response: HyperResponse) -> Self {
        HttpResponse {
            response,
            cause: None,
        }
    }

    pub fn into_hyper(self) -> HyperResponse {
        self.response
    }

    pub fn cause(&self) -> Option<&Error> {
        self.cause.as_ref()
    }

    /// When logging it can be useful to have the original cause to log rather
    /// than the HTTP response body.
    pub fn set_cause(&mut self, error: Error) {
        self.cause = Some(error);
    }

    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.response.headers()
    }

    /// Adds the headers allowing browser scripts from any origin to call us.
    pub fn add_cors_headers(&mut self) {
        let headers = self.response.headers_mut();
        headers.insert(
            ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, OPTIONS")
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Content-Type")
        );
    }

    fn ok_response(
        content_type: ContentType,
        body: impl Into<Bytes>
    ) -> Self {
        Response {
            status: StatusCode::OK,
            content_type,
            no_store: false,
            body: body.into(),
            cause: None,
        }
        .finalize()
    }

    /// The tracking pixel.
    ///
    /// The response must never be cached anywhere so that every view of a
    /// message results in a request.
    pub fn pixel() -> Self {
        Response {
            status: StatusCode::OK,
            content_type: ContentType::Gif,
            no_store: true,
            body: Bytes::from_static(TRACKING_PIXEL_GIF),
            cause: None,
        }
        .finalize()
    }

    pub fn json<O: Serialize>(object: &O) -> Self {
        match serde_json::to_string(object) {
            Ok(json) => {
                Self::ok_response(ContentType::Json, json)
            }
            Err(e) => Self::response_from_error(Error::JsonError(e)),
        }
    }

    /// Returns an error response with a plain text body.
    pub fn text_from_error(error: Error) -> Self {
        Response {
            status: error.status(),
            content_type: ContentType::Text,
            no_store: false,
            body: error.to_string().into(),
            cause: Some(error),
        }.finalize()
    }

    /// Returns an error response with an `ErrorResponse` JSON body.
    pub fn response_from_error(error: Error) -> Self {
        let status = error.status();
        let body = match serde_json::to_string(&error.to_error_response()) {
            Ok(body) => body,
            Err(_) => return Self::text_from_error(error),
        };
        Response {
            status,
            content_type: ContentType::Json,
            no_store: false,
            body: body.into(),
            cause: Some(error),
        }.finalize()
    }

    pub fn no_content() -> Self {
        Response::new(StatusCode::NO_CONTENT).finalize()
    }

    pub fn bad_request() -> Self {
        Response::new(StatusCode::BAD_REQUEST).finalize()
    }

    pub fn not_found() -> Self {
        Response::new(StatusCode::NOT_FOUND).finalize()
    }

    pub fn method_not_allowed() -> Self {
        Response::new(StatusCode::METHOD_NOT_ALLOWED).finalize()
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use http_body_util::BodyExt;
    use super::*;

    async fn body(response: HttpResponse) -> Bytes {
        response.into_hyper().into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn pixel_response() {
        let mut response = HttpResponse::pixel();
        response.add_cors_headers();
        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers();
        assert_eq!(headers[CONTENT_TYPE], "image/gif");
        assert_eq!(
            headers[CACHE_CONTROL],
            "no-store, no-cache, must-revalidate, proxy-revalidate"
        );
        assert_eq!(headers[PRAGMA], "no-cache");
        assert_eq!(headers[EXPIRES], "0");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");

        assert_eq!(body(response).await.as_ref(), TRACKING_PIXEL_GIF);
    }

    #[tokio::test]
    async fn error_responses() {
        let response = HttpResponse::text_from_error(Error::MissingIdentifier);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/plain");
        assert!(matches!(response.cause(), Some(Error::MissingIdentifier)));
        assert_eq!(body(response).await.as_ref(), b"Missing tracking ID");

        let response = HttpResponse::response_from_error(
            Error::UnexpectedBody
        );
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        let json: serde_json::Value = serde_json::from_slice(
            &body(response).await
        ).unwrap();
        assert_eq!(json["label"], "api-unexpected-body");
    }
}
