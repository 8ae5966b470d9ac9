mod common;

use tokenvision::db::{PgUserStore, StoreError, UserStore};
use tokenvision::models::NewUser;

/// Fresh store with `usernames` removed; tests in this file run in parallel
/// against one database, so each cleans only its own rows.
async fn store_without(usernames: &[&str]) -> PgUserStore {
    let pool = common::setup_test_db().await;
    for name in usernames {
        sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(name)
            .execute(&pool)
            .await
            .ok();
    }
    PgUserStore::new(pool)
}

fn new_user(name: &str, tokens: i64) -> NewUser {
    NewUser {
        username: name.into(),
        password_hash: "$argon2id$v=19$m=8,t=1,p=1$c2FsdHNhbHQ$aGFzaA".into(),
        tokens,
    }
}

#[tokio::test]
#[ignore = "requires a Postgres instance at TEST_DATABASE_URL"]
async fn test_pg_insert_and_duplicate() {
    let store = store_without(&["pg_alice"]).await;

    let user = store.insert(new_user("pg_alice", 4)).await.unwrap();
    assert_eq!(user.tokens, 4);

    let err = store.insert(new_user("pg_alice", 9)).await.unwrap_err();
    assert!(matches!(err, StoreError::Duplicate(_)));
}

#[tokio::test]
#[ignore = "requires a Postgres instance at TEST_DATABASE_URL"]
async fn test_pg_decrement_stops_at_zero() {
    let store = store_without(&["pg_bob"]).await;
    store.insert(new_user("pg_bob", 1)).await.unwrap();

    assert_eq!(store.decrement_if_positive("pg_bob").await.unwrap(), Some(0));
    assert_eq!(store.decrement_if_positive("pg_bob").await.unwrap(), None);
    assert_eq!(store.find("pg_bob").await.unwrap().unwrap().tokens, 0);
}

#[tokio::test]
#[ignore = "requires a Postgres instance at TEST_DATABASE_URL"]
async fn test_pg_concurrent_spends() {
    let store = store_without(&["pg_carol"]).await;
    store.insert(new_user("pg_carol", 4)).await.unwrap();

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.decrement_if_positive("pg_carol").await.unwrap() })
        })
        .collect();

    let mut spent = 0;
    for handle in handles {
        if handle.await.unwrap().is_some() {
            spent += 1;
        }
    }

    assert_eq!(spent, 4);
    assert_eq!(store.find("pg_carol").await.unwrap().unwrap().tokens, 0);
}

#[tokio::test]
#[ignore = "requires a Postgres instance at TEST_DATABASE_URL"]
async fn test_pg_update_and_add_tokens() {
    let store = store_without(&["pg_dave", "pg_nobody"]).await;
    store.insert(new_user("pg_dave", 4)).await.unwrap();

    assert!(store.update_tokens("pg_dave", 10).await.unwrap());
    assert!(!store.update_tokens("pg_nobody", 10).await.unwrap());
    assert_eq!(store.add_tokens("pg_dave", 5).await.unwrap(), Some(15));
    assert_eq!(store.add_tokens("pg_nobody", 5).await.unwrap(), None);
    store.ping().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a Postgres instance at TEST_DATABASE_URL"]
async fn test_pg_add_tokens_overflow() {
    let store = store_without(&["pg_erin"]).await;
    store.insert(new_user("pg_erin", 4)).await.unwrap();

    let err = store.add_tokens("pg_erin", i64::MAX).await.unwrap_err();
    assert!(matches!(err, StoreError::Overflow(name) if name == "pg_erin"));
    assert_eq!(store.find("pg_erin").await.unwrap().unwrap().tokens, 4);
}
