use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::error::ErrorReport;
use crate::application::repos::RepoError;
use crate::application::todos::TodoServiceError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const USER_NOT_FOUND: &str = "user_not_found";
    pub const FORBIDDEN: &str = "forbidden";
    pub const NOT_FOUND: &str = "not_found";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REPO: &str = "repo_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// JSON error response. `hint` reaches the client; `detail` only reaches logs.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
    detail: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn unauthorized(message: &'static str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, codes::UNAUTHORIZED, message, None)
    }

    pub fn forbidden() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            codes::FORBIDDEN,
            "Caller lacks a role permitted to use this resource",
            Some("requires the Reader or Admin role".to_string()),
        )
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    pub fn invalid_input(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::INVALID_INPUT, message, hint)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = self
            .detail
            .clone()
            .or_else(|| self.hint.clone())
            .unwrap_or_else(|| self.message.to_string());
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message(
            "infra::http::error",
            self.status,
            format!("{}: {detail}", self.code),
        )
        .attach(&mut response);
        response
    }
}

pub(crate) fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        other => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            None,
        )
        .with_detail(other.to_string()),
    }
}

impl From<TodoServiceError> for ApiError {
    fn from(err: TodoServiceError) -> Self {
        match err {
            TodoServiceError::NotAuthorized { .. } => ApiError::new(
                StatusCode::UNAUTHORIZED,
                codes::UNAUTHORIZED,
                "User not authorized to access this item",
                None,
            )
            .with_detail(err.to_string()),
            TodoServiceError::UserNotFound { .. } => ApiError::new(
                StatusCode::UNAUTHORIZED,
                codes::USER_NOT_FOUND,
                "User not found",
                None,
            )
            .with_detail(err.to_string()),
            TodoServiceError::ItemNotFound { id } => {
                ApiError::not_found("Item not found").with_detail(format!("todo item {id}"))
            }
            TodoServiceError::Validation(inner) => {
                ApiError::invalid_input("Invalid todo item", Some(inner.message().to_string()))
            }
            TodoServiceError::Repo(repo) => repo_to_api(repo),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_input("Malformed JSON body", Some(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::invalid_input("Malformed item id", Some(rejection.body_text()))
    }
}
