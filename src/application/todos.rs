//! Access-controlled task service.
//!
//! Every operation takes the caller's context as established by the transport.
//! Admins bypass ownership checks; everybody else is resolved to a user id by
//! email and may only reach records they own. List reads go through the view
//! cache; single-record reads and all writes go straight to the store.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::repos::{NewTodoItemParams, RepoError, TodoItemsRepo, UsersRepo};
use crate::cache::{CacheKey, CacheView, TodoViewCache};
use crate::domain::access::{Principal, authorize};
use crate::domain::caller::CallerContext;
use crate::domain::error::DomainError;
use crate::domain::todos::{NewTodoItem, TodoId, TodoItemPatch, TodoItemRecord};
use crate::domain::users::UserId;

/// What a caller attempted on a record they do not own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoAction {
    View,
    Update,
    Delete,
}

impl TodoAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl Display for TodoAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum TodoServiceError {
    #[error("user `{email}` not found")]
    UserNotFound { email: String },
    #[error("todo item {id} not found")]
    ItemNotFound { id: TodoId },
    #[error("user not authorized to {action} todo item {id}")]
    NotAuthorized { id: TodoId, action: TodoAction },
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct TodoItemService {
    todos: Arc<dyn TodoItemsRepo>,
    users: Arc<dyn UsersRepo>,
    cache: TodoViewCache,
}

impl TodoItemService {
    pub fn new(
        todos: Arc<dyn TodoItemsRepo>,
        users: Arc<dyn UsersRepo>,
        cache: TodoViewCache,
    ) -> Self {
        Self {
            todos,
            users,
            cache,
        }
    }

    pub fn cache(&self) -> &TodoViewCache {
        &self.cache
    }

    /// Admins see every record; everybody else sees the records they own.
    ///
    /// Both views are served from the cache when present and filled on a miss.
    pub async fn list(
        &self,
        caller: &CallerContext,
    ) -> Result<Vec<TodoItemRecord>, TodoServiceError> {
        let (key, principal) = if caller.is_admin() {
            (CacheKey::all(caller.email()), Principal::Admin)
        } else {
            let user = self.resolve(caller).await?;
            (CacheKey::owned(caller.email()), Principal::User(user))
        };

        if let Some(records) = self.cache.get(&key).await {
            return Ok(records);
        }

        let records = match &principal {
            Principal::Admin => self.todos.list_all().await?,
            Principal::User(user) => self.todos.list_by_owner(user).await?,
        };
        self.cache.put(&key, &records).await;

        debug!(
            target = "application::todos::list",
            view = key.view().as_str(),
            count = records.len(),
            "listed todo items from store"
        );
        Ok(records)
    }

    pub async fn get_by_id(
        &self,
        id: TodoId,
        caller: &CallerContext,
    ) -> Result<TodoItemRecord, TodoServiceError> {
        let principal = self.principal(caller).await?;
        let record = self.load(id).await?;
        Self::ensure_access(caller, &principal, &record, TodoAction::View)?;
        Ok(record)
    }

    /// Replaces name and completion flag. The owner never changes.
    pub async fn update(
        &self,
        id: TodoId,
        patch: TodoItemPatch,
        caller: &CallerContext,
    ) -> Result<TodoItemRecord, TodoServiceError> {
        let mut record = self.load(id).await?;
        let principal = self.principal(caller).await?;
        Self::ensure_access(caller, &principal, &record, TodoAction::Update)?;

        record.apply(patch);
        let updated = self
            .todos
            .update(&record)
            .await
            .map_err(|err| Self::write_error(id, err))?;

        info!(
            target = "application::todos::update",
            id,
            owner = %updated.user_id,
            caller = caller.email(),
            "todo item updated"
        );
        self.invalidate_after_write(caller, &updated.user_id).await;
        Ok(updated)
    }

    pub async fn delete(&self, id: TodoId, caller: &CallerContext) -> Result<(), TodoServiceError> {
        let record = self.load(id).await?;
        let principal = self.principal(caller).await?;
        Self::ensure_access(caller, &principal, &record, TodoAction::Delete)?;

        self.todos
            .delete(&record)
            .await
            .map_err(|err| Self::write_error(id, err))?;

        info!(
            target = "application::todos::delete",
            id,
            owner = %record.user_id,
            caller = caller.email(),
            "todo item deleted"
        );
        self.invalidate_after_write(caller, &record.user_id).await;
        Ok(())
    }

    /// Creates a record owned by the resolved caller, whatever their roles.
    pub async fn create(
        &self,
        input: NewTodoItem,
        caller: &CallerContext,
    ) -> Result<TodoItemRecord, TodoServiceError> {
        let user = self.resolve(caller).await?;
        let created = self
            .todos
            .insert(NewTodoItemParams {
                name: input.name,
                is_complete: input.is_complete,
                user_id: user,
            })
            .await?;

        info!(
            target = "application::todos::create",
            id = created.id,
            owner = %created.user_id,
            "todo item created"
        );
        self.invalidate_after_write(caller, &created.user_id).await;
        Ok(created)
    }

    async fn resolve(&self, caller: &CallerContext) -> Result<UserId, TodoServiceError> {
        match self.users.find_by_email(caller.email()).await? {
            Some(user) => Ok(user.id),
            None => Err(TodoServiceError::UserNotFound {
                email: caller.email().to_string(),
            }),
        }
    }

    async fn principal(&self, caller: &CallerContext) -> Result<Principal, TodoServiceError> {
        if caller.is_admin() {
            return Ok(Principal::Admin);
        }
        self.resolve(caller).await.map(Principal::User)
    }

    async fn load(&self, id: TodoId) -> Result<TodoItemRecord, TodoServiceError> {
        self.todos
            .find_by_id(id)
            .await?
            .ok_or(TodoServiceError::ItemNotFound { id })
    }

    /// A row removed between the read and the write is a missing record.
    fn write_error(id: TodoId, err: RepoError) -> TodoServiceError {
        match err {
            RepoError::NotFound => TodoServiceError::ItemNotFound { id },
            other => TodoServiceError::Repo(other),
        }
    }

    fn ensure_access(
        caller: &CallerContext,
        principal: &Principal,
        record: &TodoItemRecord,
        action: TodoAction,
    ) -> Result<(), TodoServiceError> {
        if authorize(caller.roles(), principal.user_id(), &record.user_id) {
            Ok(())
        } else {
            Err(TodoServiceError::NotAuthorized {
                id: record.id,
                action,
            })
        }
    }

    /// Evicts the caller's views and, when someone else owns the written
    /// record, the owner's own view. Runs only after the store accepted the write.
    async fn invalidate_after_write(&self, caller: &CallerContext, owner: &UserId) {
        if !self.cache.policy().evicts_on_write() {
            return;
        }

        for view in CacheView::all() {
            self.cache
                .invalidate(&CacheKey::new(*view, caller.email()))
                .await;
        }

        // A non-admin can only have written their own record.
        if !caller.is_admin() {
            return;
        }

        match self.users.find_by_id(owner).await {
            Ok(Some(user)) => {
                if !user.email.eq_ignore_ascii_case(caller.email().trim()) {
                    self.cache.invalidate(&CacheKey::owned(&user.email)).await;
                }
            }
            Ok(None) => {}
            Err(err) => {
                warn!(
                    target = "application::todos::invalidate_after_write",
                    owner = %owner,
                    error = %err,
                    "could not resolve record owner; their cached view expires by TTL"
                );
            }
        }
    }
}
