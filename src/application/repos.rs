//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::todos::{TodoId, TodoItemRecord};
use crate::domain::users::{UserId, UserRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct NewTodoItemParams {
    pub name: String,
    pub is_complete: bool,
    pub user_id: UserId,
}

#[async_trait]
pub trait TodoItemsRepo: Send + Sync {
    async fn list_all(&self) -> Result<Vec<TodoItemRecord>, RepoError>;

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<TodoItemRecord>, RepoError>;

    async fn find_by_id(&self, id: TodoId) -> Result<Option<TodoItemRecord>, RepoError>;

    async fn insert(&self, params: NewTodoItemParams) -> Result<TodoItemRecord, RepoError>;

    /// Persist name and completion flag. Ownership is never written.
    async fn update(&self, record: &TodoItemRecord) -> Result<TodoItemRecord, RepoError>;

    async fn delete(&self, record: &TodoItemRecord) -> Result<(), RepoError>;
}

#[async_trait]
pub trait UsersRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError>;

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn ping(&self) -> Result<(), RepoError>;
}
