use hyper::{Body, Response, StatusCode};
use thiserror::Error;

use super::response;
use crate::datastore::DataStoreError;
use crate::model::{ModelError, TaskId};

// Every failure a request can end with
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("unable to read request body: {0}")]
    Body(#[from] hyper::Error),
    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),
    #[error("{0}")]
    Validation(#[from] ModelError),
    #[error("Task ID is missing")]
    MissingId,
    #[error("Task ID in body ({body}) does not match the path ({path})")]
    IdMismatch { path: TaskId, body: TaskId },
    #[error("Task not found")]
    TaskNotFound,
    #[error("Not found")]
    RouteNotFound,
    #[error("Method not allowed")]
    MethodNotAllowed(&'static str),
    #[error("{0}")]
    Storage(String),
}

impl From<DataStoreError> for ApiError {
    fn from(err: DataStoreError) -> Self {
        match err {
            DataStoreError::NotFound(_) => ApiError::TaskNotFound,
            DataStoreError::Storage(reason) => ApiError::Storage(reason),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidJson(_)
            | ApiError::Body(_)
            | ApiError::Validation(_)
            | ApiError::MissingId
            | ApiError::IdMismatch { .. } => StatusCode::BAD_REQUEST,
            ApiError::TaskNotFound | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_response(self) -> Response<Body> {
        let mut res = response::error(self.status(), &self.to_string());
        if let ApiError::MethodNotAllowed(allow) = self {
            res.headers_mut()
                .insert(hyper::header::ALLOW, http::HeaderValue::from_static(allow));
        }
        res
    }
}
