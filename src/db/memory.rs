use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{StoreError, UserStore};
use crate::models::{NewUser, User};

/// Process-local [`UserStore`].
///
/// Every operation takes the map lock once, so balance changes are atomic
/// with respect to each other. Data is lost on restart.
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<Mutex<HashMap<String, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find(&self, username: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().await;
        Ok(users.get(username).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().await;
        if users.contains_key(&user.username) {
            return Err(StoreError::Duplicate(user.username));
        }

        let now = Utc::now();
        let row = User {
            id: Uuid::new_v4(),
            username: user.username.clone(),
            password_hash: user.password_hash,
            tokens: user.tokens,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.username, row.clone());
        Ok(row)
    }

    async fn update_tokens(&self, username: &str, new_balance: i64) -> Result<bool, StoreError> {
        let mut users = self.users.lock().await;
        match users.get_mut(username) {
            Some(user) => {
                user.tokens = new_balance;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn decrement_if_positive(&self, username: &str) -> Result<Option<i64>, StoreError> {
        let mut users = self.users.lock().await;
        match users.get_mut(username) {
            Some(user) if user.tokens > 0 => {
                user.tokens -= 1;
                user.updated_at = Utc::now();
                Ok(Some(user.tokens))
            }
            _ => Ok(None),
        }
    }

    async fn add_tokens(&self, username: &str, amount: i64) -> Result<Option<i64>, StoreError> {
        let mut users = self.users.lock().await;
        let Some(user) = users.get_mut(username) else {
            return Ok(None);
        };
        user.tokens = user
            .tokens
            .checked_add(amount)
            .ok_or_else(|| StoreError::Overflow(username.to_string()))?;
        user.updated_at = Utc::now();
        Ok(Some(user.tokens))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
