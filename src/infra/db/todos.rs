use async_trait::async_trait;
use sqlx::query;

use crate::application::repos::{NewTodoItemParams, RepoError, TodoItemsRepo};
use crate::domain::todos::{TodoId, TodoItemRecord};
use crate::domain::users::UserId;

use super::{PostgresRepositories, map_sqlx_error};

#[derive(Debug, sqlx::FromRow)]
struct TodoItemRow {
    id: i64,
    name: String,
    is_complete: bool,
    user_id: String,
}

impl From<TodoItemRow> for TodoItemRecord {
    fn from(row: TodoItemRow) -> Self {
        TodoItemRecord {
            id: row.id,
            name: row.name,
            is_complete: row.is_complete,
            user_id: UserId::new(row.user_id),
        }
    }
}

#[async_trait]
impl TodoItemsRepo for PostgresRepositories {
    async fn list_all(&self) -> Result<Vec<TodoItemRecord>, RepoError> {
        let rows = sqlx::query_as::<_, TodoItemRow>(
            r#"
            SELECT id, name, is_complete, user_id
            FROM todo_items
            ORDER BY id
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TodoItemRecord::from).collect())
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<TodoItemRecord>, RepoError> {
        let rows = sqlx::query_as::<_, TodoItemRow>(
            r#"
            SELECT id, name, is_complete, user_id
            FROM todo_items
            WHERE user_id = $1
            ORDER BY id
            "#,
        )
        .bind(owner.as_str())
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TodoItemRecord::from).collect())
    }

    async fn find_by_id(&self, id: TodoId) -> Result<Option<TodoItemRecord>, RepoError> {
        let row = sqlx::query_as::<_, TodoItemRow>(
            r#"
            SELECT id, name, is_complete, user_id
            FROM todo_items
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(TodoItemRecord::from))
    }

    async fn insert(&self, params: NewTodoItemParams) -> Result<TodoItemRecord, RepoError> {
        let row = sqlx::query_as::<_, TodoItemRow>(
            r#"
            INSERT INTO todo_items (name, is_complete, user_id)
            VALUES ($1, $2, $3)
            RETURNING id, name, is_complete, user_id
            "#,
        )
        .bind(&params.name)
        .bind(params.is_complete)
        .bind(params.user_id.as_str())
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update(&self, record: &TodoItemRecord) -> Result<TodoItemRecord, RepoError> {
        // `user_id` is never part of the SET list.
        let row = sqlx::query_as::<_, TodoItemRow>(
            r#"
            UPDATE todo_items
            SET name = $2, is_complete = $3
            WHERE id = $1
            RETURNING id, name, is_complete, user_id
            "#,
        )
        .bind(record.id)
        .bind(&record.name)
        .bind(record.is_complete)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(TodoItemRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete(&self, record: &TodoItemRecord) -> Result<(), RepoError> {
        let result = query("DELETE FROM todo_items WHERE id = $1")
            .bind(record.id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
