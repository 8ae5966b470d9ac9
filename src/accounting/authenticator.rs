use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use thiserror::Error;

use crate::db::{StoreError, UserStore};
use crate::models::{NewUser, User, MIN_PASSWORD_LEN, STARTING_TOKENS};

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("username already in use")]
    UsernameTaken,

    #[error("password too short")]
    PasswordTooShort,

    #[error("incorrect username or password")]
    InvalidCredentials,

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// argon2id cost parameters.
#[derive(Debug, Clone, Copy)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
        }
    }
}

/// Registration and password verification on top of a [`UserStore`].
#[derive(Clone)]
pub struct Authenticator {
    store: Arc<dyn UserStore>,
    argon2: Argon2<'static>,
}

impl Authenticator {
    pub fn new(store: Arc<dyn UserStore>, cost: HashCost) -> Result<Self, AccountError> {
        let params = Params::new(cost.memory_kib, cost.iterations, Params::DEFAULT_P_COST, None)
            .map_err(|e| AccountError::Hashing(e.to_string()))?;

        Ok(Self {
            store,
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Create a user with the starting balance.
    ///
    /// The username check runs before the password-length check.
    pub async fn register(&self, username: &str, password: &str) -> Result<User, AccountError> {
        if self.store.find(username).await?.is_some() {
            return Err(AccountError::UsernameTaken);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AccountError::PasswordTooShort);
        }

        let password_hash = self.hash(password).await?;
        let user = self
            .store
            .insert(NewUser {
                username: username.to_string(),
                password_hash,
                tokens: STARTING_TOKENS,
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => AccountError::UsernameTaken,
                other => AccountError::Store(other),
            })?;

        tracing::info!(username = %user.username, tokens = user.tokens, "User registered");
        Ok(user)
    }

    /// Check `password` against the stored hash. An unknown user is `false`.
    pub async fn verify(&self, username: &str, password: &str) -> Result<bool, AccountError> {
        match self.store.find(username).await? {
            Some(user) => self.check_hash(user.password_hash, password).await,
            None => Ok(false),
        }
    }

    /// Fetch the user if, and only if, the credentials match.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, AccountError> {
        let Some(user) = self.store.find(username).await? else {
            tracing::debug!(username, "Authentication failed: unknown user");
            return Err(AccountError::InvalidCredentials);
        };

        if !self.check_hash(user.password_hash.clone(), password).await? {
            tracing::debug!(username, "Authentication failed: password mismatch");
            return Err(AccountError::InvalidCredentials);
        }

        Ok(user)
    }

    async fn hash(&self, password: &str) -> Result<String, AccountError> {
        let argon2 = self.argon2.clone();
        let password = password.to_string();

        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
        })
        .await
        .map_err(|e| AccountError::Hashing(e.to_string()))?
        .map_err(|e| AccountError::Hashing(e.to_string()))
    }

    async fn check_hash(&self, stored: String, password: &str) -> Result<bool, AccountError> {
        let argon2 = self.argon2.clone();
        let password = password.to_string();

        tokio::task::spawn_blocking(move || match PasswordHash::new(&stored) {
            Ok(parsed) => argon2.verify_password(password.as_bytes(), &parsed).is_ok(),
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is unparsable");
                false
            }
        })
        .await
        .map_err(|e| AccountError::Hashing(e.to_string()))
    }
}
