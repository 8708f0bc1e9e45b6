//! Task records and the inputs that create or change them.

use serde::{Deserialize, Serialize};

use super::error::DomainError;
use super::users::UserId;

pub type TodoId = i64;

/// A persisted task. `user_id` is fixed at creation and never reassigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItemRecord {
    pub id: TodoId,
    pub name: String,
    pub is_complete: bool,
    pub user_id: UserId,
}

impl TodoItemRecord {
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.user_id == user
    }

    /// Overwrite both mutable fields. Ownership is untouched.
    pub fn apply(&mut self, patch: TodoItemPatch) {
        self.name = patch.name;
        self.is_complete = patch.is_complete;
    }
}

/// Input for a new task. It has no owner field: the owner is
/// always the resolved caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodoItem {
    pub name: String,
    pub is_complete: bool,
}

impl NewTodoItem {
    pub fn new(name: impl Into<String>, is_complete: bool) -> Result<Self, DomainError> {
        Ok(Self {
            name: validate_name(name.into())?,
            is_complete,
        })
    }
}

/// Full replacement of a task's name and completion flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItemPatch {
    pub name: String,
    pub is_complete: bool,
}

impl TodoItemPatch {
    pub fn new(name: impl Into<String>, is_complete: bool) -> Result<Self, DomainError> {
        Ok(Self {
            name: validate_name(name.into())?,
            is_complete,
        })
    }
}

fn validate_name(name: String) -> Result<String, DomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("name must not be empty"));
    }
    Ok(trimmed.to_string())
}
