pub mod memory;
pub mod user_repo;

pub use memory::InMemoryUserStore;
pub use user_repo::PgUserStore;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;

use crate::models::{NewUser, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username already exists: {0}")]
    Duplicate(String),

    #[error("token balance out of range for {0}")]
    Overflow(String),

    #[error("database error: {0}")]
    Backend(#[from] sqlx::Error),
}

/// Persistence contract for user credentials and token balances.
///
/// `decrement_if_positive` and `add_tokens` are single atomic operations;
/// callers never need a read-then-write pair to move a balance.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Returns [`StoreError::Duplicate`] if the username is taken.
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    /// Overwrite a balance. Returns `false` when the user does not exist.
    async fn update_tokens(&self, username: &str, new_balance: i64) -> Result<bool, StoreError>;

    /// Subtract one token if the balance is positive.
    ///
    /// Returns the new balance, or `None` when the user is missing or
    /// already at zero.
    async fn decrement_if_positive(&self, username: &str) -> Result<Option<i64>, StoreError>;

    /// Add `amount` (possibly negative). `None` when the user is missing.
    ///
    /// Returns [`StoreError::Overflow`] and leaves the balance alone when the
    /// result does not fit in an `i64`.
    async fn add_tokens(&self, username: &str, amount: i64) -> Result<Option<i64>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

pub async fn init_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    // Verify connectivity
    sqlx::query("SELECT 1").execute(&pool).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
