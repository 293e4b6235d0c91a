use super::Store;
use chrono::{Duration, Utc};
use stride_core::error::StrideError;

/// Create an in-memory store for testing.
async fn test_store() -> Store {
    Store::open_in_memory().await.unwrap()
}

#[tokio::test]
async fn test_get_or_create_tg_user() {
    let store = test_store().await;

    let (first, created) = store.get_or_create_tg_user(555).await.unwrap();
    assert!(created);
    assert_eq!(first.chat_id, 555);
    assert!(first.user_id.is_none());
    assert!(first.verification_code.is_none());

    // Second call finds the same row.
    let (second, created) = store.get_or_create_tg_user(555).await.unwrap();
    assert!(!created);
    assert_eq!(second.chat_id, 555);
}

#[tokio::test]
async fn test_verification_code_overwrite() {
    let store = test_store().await;
    store.get_or_create_tg_user(1).await.unwrap();

    store.set_verification_code(1, "aaaa").await.unwrap();
    store.set_verification_code(1, "bbbb").await.unwrap();

    let user = store.get_tg_user(1).await.unwrap().unwrap();
    // Reissuing invalidates the previous code by overwrite.
    assert_eq!(user.verification_code.as_deref(), Some("bbbb"));
}

#[tokio::test]
async fn test_link_account_consumes_code() {
    let store = test_store().await;
    let account = store.create_user("alice").await.unwrap();
    store.get_or_create_tg_user(555).await.unwrap();
    store.set_verification_code(555, "code-1").await.unwrap();

    let linked = store.link_account("code-1", account.id).await.unwrap();
    assert_eq!(linked.chat_id, 555);
    assert_eq!(linked.user_id, Some(account.id));
    assert!(linked.verification_code.is_none());

    // The stored row is linked and the code is cleared.
    let user = store.get_tg_user(555).await.unwrap().unwrap();
    assert!(user.is_linked());
    assert!(user.verification_code.is_none());

    // Replaying the consumed code fails without mutating state.
    let err = store.link_account("code-1", account.id).await.unwrap_err();
    assert!(matches!(err, StrideError::CodeNotFound));
    let user = store.get_tg_user(555).await.unwrap().unwrap();
    assert_eq!(user.user_id, Some(account.id));
}

#[tokio::test]
async fn test_link_account_unknown_code() {
    let store = test_store().await;
    let account = store.create_user("bob").await.unwrap();

    let err = store.link_account("nope", account.id).await.unwrap_err();
    assert!(matches!(err, StrideError::CodeNotFound));
}

#[tokio::test]
async fn test_list_categories_excludes_deleted() {
    let store = test_store().await;
    let account = store.create_user("carol").await.unwrap();

    let work = store.create_category(account.id, "Work").await.unwrap();
    store.create_category(account.id, "Home").await.unwrap();
    let old = store.create_category(account.id, "Old").await.unwrap();
    store.delete_category(old.id).await.unwrap();

    let categories = store.list_categories(account.id).await.unwrap();
    let titles: Vec<&str> = categories.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["Work", "Home"]);
    assert_eq!(categories[0].id, work.id);
}

#[tokio::test]
async fn test_categories_are_per_account() {
    let store = test_store().await;
    let a = store.create_user("a").await.unwrap();
    let b = store.create_user("b").await.unwrap();
    store.create_category(a.id, "Work").await.unwrap();

    assert!(store.list_categories(b.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_and_list_goals() {
    let store = test_store().await;
    let account = store.create_user("dave").await.unwrap();
    let category = store.create_category(account.id, "Work").await.unwrap();

    let due = Utc::now() + Duration::days(14);
    let goal = store
        .create_goal(account.id, category.id, "Finish report", "Draft outline", due)
        .await
        .unwrap();
    assert_eq!(goal.title, "Finish report");
    assert_eq!(goal.category_id, category.id);

    let goals = store.list_goals(account.id).await.unwrap();
    assert_eq!(goals.len(), 1);
    assert_eq!(goals[0].id, goal.id);
    assert_eq!(goals[0].description, "Draft outline");
    // Due date survives the round trip.
    assert!((goals[0].due_date - due).num_seconds().abs() <= 1);
}

#[tokio::test]
async fn test_list_goals_creation_order() {
    let store = test_store().await;
    let account = store.create_user("erin").await.unwrap();
    let category = store.create_category(account.id, "Home").await.unwrap();
    let due = Utc::now() + Duration::days(14);

    for title in ["first", "second", "third"] {
        store
            .create_goal(account.id, category.id, title, "", due)
            .await
            .unwrap();
    }

    let goals = store.list_goals(account.id).await.unwrap();
    let titles: Vec<&str> = goals.iter().map(|g| g.title.as_str()).collect();
    assert_eq!(titles, vec!["first", "second", "third"]);
}
