use hyper::body::HttpBody;
use hyper::{Body, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::info;

use super::error::ApiError;
use super::response;
use crate::datastore::TaskDataStore;
use crate::model::{NewTask, TaskId, TaskUpdate};

/// Largest request body accepted, in bytes.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

pub async fn create_task<D: TaskDataStore>(
    datastore: &D,
    body: Body,
) -> Result<Response<Body>, ApiError> {
    let new_task = read_json::<NewTask>(body).await?.validate()?;

    let task = datastore.create(new_task.title, new_task.completed).await?;
    info!(id = task.id, "Task created.");
    Ok(response::json(StatusCode::CREATED, &task))
}

pub async fn list_tasks<D: TaskDataStore>(datastore: &D) -> Result<Response<Body>, ApiError> {
    let tasks = datastore.list().await?;
    Ok(response::json(StatusCode::OK, &tasks))
}

/// `path_id` is absent when the id travels in the body (`PUT /tasks`).
pub async fn update_task<D: TaskDataStore>(
    datastore: &D,
    path_id: Option<TaskId>,
    body: Body,
) -> Result<Response<Body>, ApiError> {
    let update = read_json::<TaskUpdate>(body).await?;
    let id = match (path_id, update.id) {
        (Some(path), Some(body)) if path != body => {
            return Err(ApiError::IdMismatch { path, body });
        }
        (Some(id), _) | (None, Some(id)) => id,
        (None, None) => return Err(ApiError::MissingId),
    };
    let update = update.validate()?;

    let task = datastore
        .update(id, update.title, update.completed)
        .await?;
    info!(id, completed = task.completed, "Task updated.");
    Ok(response::json(StatusCode::OK, &task))
}

pub async fn delete_task<D: TaskDataStore>(
    datastore: &D,
    id: TaskId,
) -> Result<Response<Body>, ApiError> {
    datastore.delete(id).await?;
    info!(id, "Task deleted.");
    Ok(response::no_content())
}

async fn read_json<T: DeserializeOwned>(body: Body) -> Result<T, ApiError> {
    let bytes = read_body(body).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

// Stops reading as soon as the body, announced or streamed, goes over the cap.
async fn read_body(mut body: Body) -> Result<Vec<u8>, ApiError> {
    if body.size_hint().lower() > MAX_BODY_BYTES as u64 {
        return Err(ApiError::PayloadTooLarge(MAX_BODY_BYTES));
    }
    let mut bytes = Vec::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk?;
        if bytes.len() + chunk.len() > MAX_BODY_BYTES {
            return Err(ApiError::PayloadTooLarge(MAX_BODY_BYTES));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}
