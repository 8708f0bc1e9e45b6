//! HTTP adapter: routing, bearer authentication and error translation.

pub mod auth;
pub mod error;
mod handlers;
pub mod middleware;
pub mod models;

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::application::error::ErrorReport;
use crate::application::repos::HealthRepo;
use crate::application::todos::TodoItemService;

pub use auth::{AuthError, TokenVerifier};
pub use error::ApiError;

#[derive(Clone)]
pub struct HttpState {
    pub todos: Arc<TodoItemService>,
    pub tokens: Arc<TokenVerifier>,
    pub health: Arc<dyn HealthRepo>,
}

/// Builds the full router: health checks plus the authenticated task routes.
pub fn build_router(state: HttpState) -> Router {
    let todos = Router::new()
        .route(
            "/api/v1/todo-items",
            get(handlers::list_todo_items).post(handlers::create_todo_item),
        )
        .route(
            "/api/v1/todo-items/{id}",
            get(handlers::get_todo_item)
                .put(handlers::update_todo_item)
                .delete(handlers::delete_todo_item),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth::require_caller,
        ));

    Router::new()
        .route("/health/live", get(live))
        .route("/health/db", get(db_health))
        .merge(todos)
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::log_responses))
        .layer(axum_middleware::from_fn(middleware::set_request_context))
}

async fn live() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn db_health(State(state): State<HttpState>) -> Response {
    match state.health.ping().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}
