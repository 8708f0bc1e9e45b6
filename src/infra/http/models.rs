use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::todos::{NewTodoItem, TodoItemPatch};

/// Body accepted by create and update.
///
/// Unknown fields such as `id` or `userId` are ignored; ownership always
/// comes from the authenticated caller.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItemRequest {
    pub name: String,
    #[serde(default)]
    pub is_complete: bool,
}

impl TodoItemRequest {
    pub fn into_new(self) -> Result<NewTodoItem, DomainError> {
        NewTodoItem::new(self.name, self.is_complete)
    }

    pub fn into_patch(self) -> Result<TodoItemPatch, DomainError> {
        TodoItemPatch::new(self.name, self.is_complete)
    }
}
