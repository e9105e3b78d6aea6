use hyper::header::CONTENT_TYPE;
use hyper::{Body, Response, StatusCode};
use serde::Serialize;
use tracing::error;

#[derive(serde_derive::Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// Serializes `payload` as the JSON body of a response with `status`.
pub fn json<T: Serialize>(status: StatusCode, payload: &T) -> Response<Body> {
    match serde_json::to_vec(payload) {
        Ok(body) => with_body(status, body),
        Err(err) => {
            error!(reason = %err, "Unable to serialize response payload.");
            with_body(
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"error":"unable to serialize response"}"#.to_vec(),
            )
        }
    }
}

pub fn error(status: StatusCode, message: &str) -> Response<Body> {
    json(status, &ErrorBody { error: message })
}

pub fn no_content() -> Response<Body> {
    let mut res = Response::new(Body::empty());
    *res.status_mut() = StatusCode::NO_CONTENT;
    res
}

fn with_body(status: StatusCode, body: Vec<u8>) -> Response<Body> {
    let mut res = Response::new(Body::from(body));
    *res.status_mut() = status;
    res.headers_mut().insert(
        CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    res
}
