use std::sync::Arc;

use metrics::counter;
use thiserror::Error;

use crate::db::{StoreError, UserStore};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("insufficient tokens")]
    InsufficientTokens,

    #[error("negative refill not permitted: {0}")]
    NegativeRefill(i64),

    #[error("refill of {0} would take the balance out of range")]
    Overflow(i64),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Per-user token balances.
///
/// Spends and credits are delegated to the store's atomic operations, so
/// concurrent requests for the same user cannot overspend or lose updates.
#[derive(Clone)]
pub struct TokenLedger {
    store: Arc<dyn UserStore>,
    allow_negative_refill: bool,
}

impl TokenLedger {
    pub fn new(store: Arc<dyn UserStore>, allow_negative_refill: bool) -> Self {
        Self {
            store,
            allow_negative_refill,
        }
    }

    pub async fn balance(&self, username: &str) -> Result<i64, LedgerError> {
        self.store
            .find(username)
            .await?
            .map(|user| user.tokens)
            .ok_or_else(|| LedgerError::UserNotFound(username.to_string()))
    }

    /// Take exactly one token. On failure the balance is left unchanged.
    ///
    /// Not idempotent: call once per successful classification.
    pub async fn spend_one(&self, username: &str) -> Result<i64, LedgerError> {
        if let Some(remaining) = self.store.decrement_if_positive(username).await? {
            counter!("tokens_spent_total").increment(1);
            tracing::debug!(username, remaining, "Token spent");
            return Ok(remaining);
        }

        // Nothing was decremented; tell "missing" apart from "empty".
        match self.store.find(username).await? {
            Some(_) => Err(LedgerError::InsufficientTokens),
            None => Err(LedgerError::UserNotFound(username.to_string())),
        }
    }

    /// Add `amount` to the balance. Negative amounts obey the refill policy.
    pub async fn credit(&self, username: &str, amount: i64) -> Result<i64, LedgerError> {
        if amount < 0 && !self.allow_negative_refill {
            return Err(LedgerError::NegativeRefill(amount));
        }

        let balance = match self.store.add_tokens(username, amount).await {
            Ok(Some(balance)) => balance,
            Ok(None) => return Err(LedgerError::UserNotFound(username.to_string())),
            Err(StoreError::Overflow(_)) => {
                tracing::warn!(username, amount, "Refill rejected: balance out of range");
                return Err(LedgerError::Overflow(amount));
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(username, amount, balance, "Tokens credited");
        Ok(balance)
    }
}
