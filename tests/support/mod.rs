#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use tokio::sync::Mutex;

use todo_api::application::repos::{
    HealthRepo, NewTodoItemParams, RepoError, TodoItemsRepo, UsersRepo,
};
use todo_api::application::todos::TodoItemService;
use todo_api::cache::{
    CacheConfig, CacheError, CacheStore, InvalidationPolicy, MemoryCacheStore, TodoViewCache,
};
use todo_api::config::AuthSettings;
use todo_api::domain::caller::CallerContext;
use todo_api::domain::roles::{Role, RoleSet};
use todo_api::domain::todos::{TodoId, TodoItemRecord};
use todo_api::domain::users::{UserId, UserRecord};
use todo_api::infra::http::{self, HttpState, TokenVerifier};

pub const SECRET: &str = "integration-test-secret";
pub const ISSUER: &str = "todo-identity";
pub const AUDIENCE: &str = "todo-clients";

pub const USER_EMAIL: &str = "user@example.com";
pub const OTHER_EMAIL: &str = "other@example.com";
pub const ADMIN_EMAIL: &str = "admin@example.com";

/// Task store held in memory. Counts list reads so cache hits are observable.
pub struct InMemoryTodos {
    items: Mutex<BTreeMap<TodoId, TodoItemRecord>>,
    next_id: AtomicI64,
    list_reads: AtomicUsize,
}

impl InMemoryTodos {
    /// Two records: id 1 owned by user "1", id 2 owned by user "2".
    pub fn seeded() -> Self {
        let mut items = BTreeMap::new();
        items.insert(1, record(1, "Buy milk", false, "1"));
        items.insert(2, record(2, "Walk dog", true, "2"));
        Self {
            items: Mutex::new(items),
            next_id: AtomicI64::new(3),
            list_reads: AtomicUsize::new(0),
        }
    }

    pub fn list_reads(&self) -> usize {
        self.list_reads.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> Vec<TodoItemRecord> {
        self.items.lock().await.values().cloned().collect()
    }
}

#[async_trait]
impl TodoItemsRepo for InMemoryTodos {
    async fn list_all(&self) -> Result<Vec<TodoItemRecord>, RepoError> {
        self.list_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.items.lock().await.values().cloned().collect())
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<TodoItemRecord>, RepoError> {
        self.list_reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .items
            .lock()
            .await
            .values()
            .filter(|item| item.is_owned_by(owner))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: TodoId) -> Result<Option<TodoItemRecord>, RepoError> {
        Ok(self.items.lock().await.get(&id).cloned())
    }

    async fn insert(&self, params: NewTodoItemParams) -> Result<TodoItemRecord, RepoError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let created = TodoItemRecord {
            id,
            name: params.name,
            is_complete: params.is_complete,
            user_id: params.user_id,
        };
        self.items.lock().await.insert(id, created.clone());
        Ok(created)
    }

    async fn update(&self, record: &TodoItemRecord) -> Result<TodoItemRecord, RepoError> {
        let mut items = self.items.lock().await;
        let existing = items.get_mut(&record.id).ok_or(RepoError::NotFound)?;
        existing.name = record.name.clone();
        existing.is_complete = record.is_complete;
        Ok(existing.clone())
    }

    async fn delete(&self, record: &TodoItemRecord) -> Result<(), RepoError> {
        self.items
            .lock()
            .await
            .remove(&record.id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

pub struct InMemoryUsers(Vec<UserRecord>);

impl InMemoryUsers {
    /// "1" is user@, "2" is other@, "9" is admin@.
    pub fn standard() -> Self {
        Self(vec![
            user("1", USER_EMAIL),
            user("2", OTHER_EMAIL),
            user("9", ADMIN_EMAIL),
        ])
    }
}

#[async_trait]
impl UsersRepo for InMemoryUsers {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, RepoError> {
        Ok(self
            .0
            .iter()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, RepoError> {
        Ok(self.0.iter().find(|user| &user.id == id).cloned())
    }
}

/// A cache backend that is always down.
pub struct BrokenCacheStore;

#[async_trait]
impl CacheStore for BrokenCacheStore {
    fn backend(&self) -> &'static str {
        "broken"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::backend("connection refused"))
    }

    async fn evict(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::backend("connection refused"))
    }
}

pub struct StaticHealth(pub Result<(), RepoError>);

impl StaticHealth {
    pub fn up() -> Self {
        Self(Ok(()))
    }

    pub fn down(message: &str) -> Self {
        Self(Err(RepoError::from_persistence(message)))
    }
}

#[async_trait]
impl HealthRepo for StaticHealth {
    async fn ping(&self) -> Result<(), RepoError> {
        match &self.0 {
            Ok(()) => Ok(()),
            Err(err) => Err(RepoError::from_persistence(err)),
        }
    }
}

pub fn record(id: TodoId, name: &str, is_complete: bool, owner: &str) -> TodoItemRecord {
    TodoItemRecord {
        id,
        name: name.to_string(),
        is_complete,
        user_id: UserId::from(owner),
    }
}

pub fn user(id: &str, email: &str) -> UserRecord {
    UserRecord {
        id: UserId::from(id),
        email: email.to_string(),
        first_name: None,
        last_name: None,
        date_of_birth: None,
    }
}

pub fn caller(email: &str, roles: &[Role]) -> CallerContext {
    CallerContext::new(email, roles.iter().copied().collect::<RoleSet>()).expect("caller")
}

pub fn memory_cache(policy: InvalidationPolicy) -> TodoViewCache {
    let config = CacheConfig {
        invalidation: policy,
        ..Default::default()
    };
    TodoViewCache::new(Arc::new(MemoryCacheStore::new(&config)), config)
}

pub fn service_with_cache(cache: TodoViewCache) -> (Arc<InMemoryTodos>, TodoItemService) {
    let todos = Arc::new(InMemoryTodos::seeded());
    let service = TodoItemService::new(todos.clone(), Arc::new(InMemoryUsers::standard()), cache);
    (todos, service)
}

pub fn service(policy: InvalidationPolicy) -> (Arc<InMemoryTodos>, TodoItemService) {
    service_with_cache(memory_cache(policy))
}

pub fn auth_settings() -> AuthSettings {
    AuthSettings {
        jwt_secret: Some(SECRET.to_string()),
        issuer: Some(ISSUER.to_string()),
        audience: Some(AUDIENCE.to_string()),
        leeway: Duration::from_secs(0),
    }
}

pub fn mint_token(email: &str, roles: &[&str]) -> String {
    let exp = time::OffsetDateTime::now_utc().unix_timestamp() + 300;
    encode(
        &Header::default(),
        &json!({
            "email": email,
            "roles": roles,
            "iss": ISSUER,
            "aud": AUDIENCE,
            "exp": exp,
        }),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("token encodes")
}

pub struct TestApp {
    pub router: Router,
    pub todos: Arc<InMemoryTodos>,
}

pub fn app_with_health(health: StaticHealth) -> TestApp {
    let (todos, service) = service(InvalidationPolicy::OnWrite);
    let state = HttpState {
        todos: Arc::new(service),
        tokens: Arc::new(TokenVerifier::new(SECRET, &auth_settings())),
        health: Arc::new(health),
    };
    TestApp {
        router: http::build_router(state),
        todos,
    }
}

pub fn app() -> TestApp {
    app_with_health(StaticHealth::up())
}
