use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("admin secret must not be empty")]
    EmptySecret,

    #[error("HMAC computation failed: {0}")]
    HmacError(String),
}

/// Gatekeeper for privileged operations (token refills).
///
/// Candidates are compared by HMAC-SHA256 tag, keyed with the configured
/// secret, using `verify_slice`, which runs in constant time.
#[derive(Clone)]
pub struct AdminGuard {
    key: Vec<u8>,
    tag: Vec<u8>,
}

impl AdminGuard {
    pub fn new(secret: &str) -> Result<Self, AdminError> {
        if secret.is_empty() {
            return Err(AdminError::EmptySecret);
        }

        let key = secret.as_bytes().to_vec();
        let mut mac = HmacSha256::new_from_slice(&key)
            .map_err(|e| AdminError::HmacError(e.to_string()))?;
        mac.update(secret.as_bytes());
        let tag = mac.finalize().into_bytes().to_vec();

        Ok(Self { key, tag })
    }

    /// Returns true if `candidate` equals the configured secret.
    pub fn verify(&self, candidate: &str) -> bool {
        let Ok(mut mac) = HmacSha256::new_from_slice(&self.key) else {
            return false;
        };
        mac.update(candidate.as_bytes());
        mac.verify_slice(&self.tag).is_ok()
    }
}

impl fmt::Debug for AdminGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminGuard").finish_non_exhaustive()
    }
}
