use hyper::{Body, Method, Request, Response, Uri};
use tracing::{error, warn};

use super::error::ApiError;
use super::handlers;
use crate::datastore::TaskDataStore;
use crate::model::{parse_task_id, TaskId};

#[derive(Debug, PartialEq, Eq)]
enum Resource<'a> {
    Collection,
    Item(&'a str),
}

impl<'a> Resource<'a> {
    fn parse(path: &'a str) -> Option<Self> {
        let rest = path.trim_end_matches('/').strip_prefix("/tasks")?;
        if rest.is_empty() {
            return Some(Resource::Collection);
        }
        match rest.strip_prefix('/') {
            Some(id) if !id.is_empty() && !id.contains('/') => Some(Resource::Item(id)),
            _ => None,
        }
    }
}

/// Dispatches a request to its handler; failures become JSON error responses.
pub async fn route<D: TaskDataStore>(datastore: &D, req: Request<Body>) -> Response<Body> {
    match dispatch(datastore, req).await {
        Ok(res) => res,
        Err(err) => {
            if err.status().is_server_error() {
                error!(reason = %err, "Request failed.");
            } else {
                warn!(reason = %err, status = err.status().as_u16(), "Request rejected.");
            }
            err.into_response()
        }
    }
}

async fn dispatch<D: TaskDataStore>(
    datastore: &D,
    req: Request<Body>,
) -> Result<Response<Body>, ApiError> {
    let (parts, body) = req.into_parts();

    match Resource::parse(parts.uri.path()) {
        Some(Resource::Collection) => match parts.method {
            Method::GET => handlers::list_tasks(datastore).await,
            Method::POST => handlers::create_task(datastore, body).await,
            Method::PUT => handlers::update_task(datastore, None, body).await,
            Method::DELETE => handlers::delete_task(datastore, query_id(&parts.uri)?).await,
            _ => Err(ApiError::MethodNotAllowed("GET, POST, PUT, DELETE")),
        },
        Some(Resource::Item(raw_id)) => match parts.method {
            Method::PUT => {
                let id = parse_task_id(raw_id)?;
                handlers::update_task(datastore, Some(id), body).await
            }
            Method::DELETE => handlers::delete_task(datastore, parse_task_id(raw_id)?).await,
            _ => Err(ApiError::MethodNotAllowed("PUT, DELETE")),
        },
        None => Err(ApiError::RouteNotFound),
    }
}

// DELETE /tasks?id=<id>
fn query_id(uri: &Uri) -> Result<TaskId, ApiError> {
    let raw = uri.query().and_then(|query| {
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "id")
            .map(|(_, value)| value.into_owned())
    });
    match raw {
        Some(raw) => Ok(parse_task_id(&raw)?),
        None => Err(ApiError::MissingId),
    }
}
