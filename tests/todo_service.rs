mod support;

use std::collections::BTreeSet;
use std::sync::Arc;

use todo_api::application::todos::{TodoAction, TodoServiceError};
use todo_api::cache::{CacheConfig, InvalidationPolicy, TodoViewCache};
use todo_api::domain::roles::Role;
use todo_api::domain::todos::{NewTodoItem, TodoItemPatch};
use todo_api::domain::users::UserId;

use support::{
    ADMIN_EMAIL, BrokenCacheStore, OTHER_EMAIL, USER_EMAIL, caller, service, service_with_cache,
};

#[tokio::test]
async fn admin_list_returns_every_record() {
    let (todos, service) = service(InvalidationPolicy::OnWrite);
    let admin = caller(ADMIN_EMAIL, &[Role::Admin]);

    let listed = service.list(&admin).await.expect("list");

    let listed_ids: BTreeSet<_> = listed.iter().map(|item| item.id).collect();
    let stored_ids: BTreeSet<_> = todos.snapshot().await.iter().map(|item| item.id).collect();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed_ids, stored_ids);
}

#[tokio::test]
async fn reader_list_returns_only_owned_records() {
    let (_, service) = service(InvalidationPolicy::OnWrite);
    let reader = caller(USER_EMAIL, &[Role::Reader]);

    let listed = service.list(&reader).await.expect("list");

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, 1);
    assert_eq!(listed[0].user_id, UserId::from("1"));
}

#[tokio::test]
async fn non_admin_is_refused_on_another_users_record() {
    let (_, service) = service(InvalidationPolicy::OnWrite);
    let reader = caller(USER_EMAIL, &[Role::Reader, Role::Writer]);

    let err = service.get_by_id(2, &reader).await.expect_err("view");
    assert!(matches!(
        err,
        TodoServiceError::NotAuthorized {
            id: 2,
            action: TodoAction::View
        }
    ));

    let patch = TodoItemPatch::new("Hijacked", true).expect("patch");
    let err = service.update(2, patch, &reader).await.expect_err("update");
    assert!(matches!(
        err,
        TodoServiceError::NotAuthorized {
            action: TodoAction::Update,
            ..
        }
    ));

    let err = service.delete(2, &reader).await.expect_err("delete");
    assert!(matches!(
        err,
        TodoServiceError::NotAuthorized {
            action: TodoAction::Delete,
            ..
        }
    ));
}

#[tokio::test]
async fn missing_ids_are_not_found_for_every_caller() {
    let (_, service) = service(InvalidationPolicy::OnWrite);
    let callers = [
        caller(ADMIN_EMAIL, &[Role::Admin]),
        caller(USER_EMAIL, &[Role::Reader]),
    ];

    for who in &callers {
        let patch = TodoItemPatch::new("X", false).expect("patch");
        let err = service.update(404, patch, who).await.expect_err("update");
        assert!(matches!(err, TodoServiceError::ItemNotFound { id: 404 }));

        let err = service.delete(404, who).await.expect_err("delete");
        assert!(matches!(err, TodoServiceError::ItemNotFound { id: 404 }));

        let err = service.get_by_id(404, who).await.expect_err("get");
        assert!(matches!(err, TodoServiceError::ItemNotFound { id: 404 }));
    }
}

#[tokio::test]
async fn create_assigns_the_resolved_caller_as_owner() {
    let (todos, service) = service(InvalidationPolicy::OnWrite);

    let admin = caller(ADMIN_EMAIL, &[Role::Admin]);
    let created = service
        .create(NewTodoItem::new("Audit", false).expect("input"), &admin)
        .await
        .expect("create");
    assert_eq!(created.user_id, UserId::from("9"));

    let reader = caller(OTHER_EMAIL, &[Role::Reader]);
    let created = service
        .create(NewTodoItem::new("  Water plants ", true).expect("input"), &reader)
        .await
        .expect("create");
    assert_eq!(created.user_id, UserId::from("2"));
    assert_eq!(created.name, "Water plants");
    assert!(created.is_complete);

    assert_eq!(todos.snapshot().await.len(), 4);
}

#[tokio::test]
async fn unknown_caller_is_user_not_found() {
    let (_, service) = service(InvalidationPolicy::OnWrite);
    let stranger = caller("ghost@example.com", &[Role::Reader]);

    let err = service.list(&stranger).await.expect_err("list");
    assert!(matches!(
        err,
        TodoServiceError::UserNotFound { ref email } if email == "ghost@example.com"
    ));

    let err = service
        .create(NewTodoItem::new("Boo", false).expect("input"), &stranger)
        .await
        .expect_err("create");
    assert!(matches!(err, TodoServiceError::UserNotFound { .. }));

    let err = service.delete(1, &stranger).await.expect_err("delete");
    assert!(matches!(err, TodoServiceError::UserNotFound { .. }));
}

#[tokio::test]
async fn repeated_list_within_ttl_reads_store_once() {
    let (todos, service) = service(InvalidationPolicy::OnWrite);
    let reader = caller(USER_EMAIL, &[Role::Reader]);

    let first = service.list(&reader).await.expect("first list");
    let second = service.list(&reader).await.expect("second list");

    assert_eq!(first, second);
    assert_eq!(todos.list_reads(), 1);
}

#[tokio::test]
async fn admin_and_owner_views_do_not_collide() {
    let (todos, service) = service(InvalidationPolicy::OnWrite);
    let admin = caller(ADMIN_EMAIL, &[Role::Admin]);
    let reader = caller(USER_EMAIL, &[Role::Reader]);

    assert_eq!(service.list(&admin).await.expect("admin").len(), 2);
    assert_eq!(service.list(&reader).await.expect("reader").len(), 1);
    assert_eq!(todos.list_reads(), 2);
}

#[tokio::test]
async fn admin_update_on_other_users_record_succeeds() {
    let (_, service) = service(InvalidationPolicy::OnWrite);
    let admin = caller(ADMIN_EMAIL, &[Role::Admin]);

    let patch = TodoItemPatch::new("X", true).expect("patch");
    let updated = service.update(1, patch, &admin).await.expect("update");

    assert_eq!(updated.name, "X");
    assert!(updated.is_complete);
    assert_eq!(updated.user_id, UserId::from("1"));
}

#[tokio::test]
async fn own_writes_are_visible_in_the_next_list() {
    let (_, service) = service(InvalidationPolicy::OnWrite);
    let owner = caller(USER_EMAIL, &[Role::Reader, Role::Writer]);

    assert_eq!(service.list(&owner).await.expect("list").len(), 1);

    let created = service
        .create(NewTodoItem::new("Call mum", false).expect("input"), &owner)
        .await
        .expect("create");
    let listed = service.list(&owner).await.expect("list");
    assert!(listed.iter().any(|item| item.id == created.id));

    let patch = TodoItemPatch::new("Call mum today", true).expect("patch");
    service
        .update(created.id, patch, &owner)
        .await
        .expect("update");
    let listed = service.list(&owner).await.expect("list");
    let item = listed
        .iter()
        .find(|item| item.id == created.id)
        .expect("listed item");
    assert_eq!(item.name, "Call mum today");

    service.delete(created.id, &owner).await.expect("delete");
    let listed = service.list(&owner).await.expect("list");
    assert!(listed.iter().all(|item| item.id != created.id));
}

#[tokio::test]
async fn admin_write_evicts_the_owners_view() {
    let (_, service) = service(InvalidationPolicy::OnWrite);
    let admin = caller(ADMIN_EMAIL, &[Role::Admin]);
    let other = caller(OTHER_EMAIL, &[Role::Reader]);

    let before = service.list(&other).await.expect("list");
    assert!(before[0].is_complete);

    let patch = TodoItemPatch::new("Walk dog twice", false).expect("patch");
    service.update(2, patch, &admin).await.expect("update");

    let after = service.list(&other).await.expect("list");
    assert_eq!(after[0].name, "Walk dog twice");
    assert!(!after[0].is_complete);
}

#[tokio::test]
async fn ttl_only_policy_serves_stale_views_after_writes() {
    let (_, service) = service(InvalidationPolicy::TtlOnly);
    let owner = caller(USER_EMAIL, &[Role::Reader, Role::Writer]);

    let before = service.list(&owner).await.expect("list");
    service
        .create(NewTodoItem::new("Unseen", false).expect("input"), &owner)
        .await
        .expect("create");
    let after = service.list(&owner).await.expect("list");

    assert_eq!(before, after);
}

#[tokio::test]
async fn broken_cache_never_fails_a_request() {
    let cache = TodoViewCache::new(Arc::new(BrokenCacheStore), CacheConfig::default());
    let (todos, service) = service_with_cache(cache);
    let owner = caller(USER_EMAIL, &[Role::Reader, Role::Writer]);

    assert_eq!(service.list(&owner).await.expect("list").len(), 1);
    service
        .create(NewTodoItem::new("Still works", false).expect("input"), &owner)
        .await
        .expect("create");
    assert_eq!(service.list(&owner).await.expect("list").len(), 2);
    assert_eq!(todos.list_reads(), 2);
}

#[tokio::test]
async fn disabled_cache_always_reads_the_store() {
    let (todos, service) = service_with_cache(TodoViewCache::disabled());
    let admin = caller(ADMIN_EMAIL, &[Role::Admin]);

    service.list(&admin).await.expect("list");
    service.list(&admin).await.expect("list");

    assert_eq!(todos.list_reads(), 2);
}
