use async_trait::async_trait;
use sqlx::PgPool;

use super::{StoreError, UserStore};
use crate::models::{NewUser, User};

/// Fetch a user by username.
pub async fn get_user_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, StoreError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Insert a new user. A unique-constraint hit maps to [`StoreError::Duplicate`].
pub async fn insert_user(pool: &PgPool, user: &NewUser) -> Result<User, StoreError> {
    let result = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, password_hash, tokens)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(&user.username)
    .bind(&user.password_hash)
    .bind(user.tokens)
    .fetch_one(pool)
    .await;

    match result {
        Ok(row) => Ok(row),
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Err(StoreError::Duplicate(user.username.clone()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Set the token balance outright.
pub async fn set_tokens(pool: &PgPool, username: &str, tokens: i64) -> Result<bool, StoreError> {
    let result = sqlx::query(
        "UPDATE users SET tokens = $2, updated_at = NOW() WHERE username = $1",
    )
    .bind(username)
    .bind(tokens)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Spend one token in a single statement; no row comes back at zero.
pub async fn decrement_tokens(pool: &PgPool, username: &str) -> Result<Option<i64>, StoreError> {
    let row: Option<(i64,)> = sqlx::query_as(
        r#"
        UPDATE users
        SET tokens = tokens - 1, updated_at = NOW()
        WHERE username = $1 AND tokens > 0
        RETURNING tokens
        "#,
    )
    .bind(username)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.0))
}

/// SQLSTATE `numeric_value_out_of_range`.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Increment the balance by `amount`. A BIGINT overflow rolls the statement
/// back and maps to [`StoreError::Overflow`].
pub async fn increment_tokens(
    pool: &PgPool,
    username: &str,
    amount: i64,
) -> Result<Option<i64>, StoreError> {
    let result: Result<Option<(i64,)>, sqlx::Error> = sqlx::query_as(
        r#"
        UPDATE users
        SET tokens = tokens + $2, updated_at = NOW()
        WHERE username = $1
        RETURNING tokens
        "#,
    )
    .bind(username)
    .bind(amount)
    .fetch_optional(pool)
    .await;

    match result {
        Ok(row) => Ok(row.map(|r| r.0)),
        Err(sqlx::Error::Database(db)) if db.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE) => {
            Err(StoreError::Overflow(username.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Postgres-backed [`UserStore`].
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find(&self, username: &str) -> Result<Option<User>, StoreError> {
        get_user_by_username(&self.pool, username).await
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        insert_user(&self.pool, &user).await
    }

    async fn update_tokens(&self, username: &str, new_balance: i64) -> Result<bool, StoreError> {
        set_tokens(&self.pool, username, new_balance).await
    }

    async fn decrement_if_positive(&self, username: &str) -> Result<Option<i64>, StoreError> {
        decrement_tokens(&self.pool, username).await
    }

    async fn add_tokens(&self, username: &str, amount: i64) -> Result<Option<i64>, StoreError> {
        increment_tokens(&self.pool, username, amount).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
