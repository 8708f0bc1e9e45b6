//! Task route handlers. Each one unpacks the request, calls the service and
//! lets [`ApiError`] translate failures.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::todos::TodoServiceError;
use crate::domain::caller::CallerContext;
use crate::domain::todos::TodoId;

use super::HttpState;
use super::error::ApiError;
use super::models::TodoItemRequest;

pub async fn list_todo_items(
    State(state): State<HttpState>,
    Extension(caller): Extension<CallerContext>,
) -> Result<impl IntoResponse, ApiError> {
    let items = state.todos.list(&caller).await?;
    Ok(Json(items))
}

pub async fn get_todo_item(
    State(state): State<HttpState>,
    Extension(caller): Extension<CallerContext>,
    id: Result<Path<TodoId>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let item = state.todos.get_by_id(id, &caller).await?;
    Ok(Json(item))
}

pub async fn create_todo_item(
    State(state): State<HttpState>,
    Extension(caller): Extension<CallerContext>,
    payload: Result<Json<TodoItemRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload?;
    let input = payload.into_new().map_err(TodoServiceError::from)?;
    let item = state.todos.create(input, &caller).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update_todo_item(
    State(state): State<HttpState>,
    Extension(caller): Extension<CallerContext>,
    id: Result<Path<TodoId>, PathRejection>,
    payload: Result<Json<TodoItemRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let patch = payload.into_patch().map_err(TodoServiceError::from)?;
    let item = state.todos.update(id, patch, &caller).await?;
    Ok(Json(item))
}

pub async fn delete_todo_item(
    State(state): State<HttpState>,
    Extension(caller): Extension<CallerContext>,
    id: Result<Path<TodoId>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id?;
    state.todos.delete(id, &caller).await?;
    Ok(StatusCode::NO_CONTENT)
}
