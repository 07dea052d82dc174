use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::LookupError;

/// A bearer token and the moment it stops being usable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue(&self, now: DateTime<Utc>) -> Result<Credential, LookupError>;
}

/// Hands out a cached credential until it expires, then asks the issuer for
/// a new one. Owned by whoever constructs the client; nothing is global.
pub struct CredentialCache<I: TokenIssuer> {
    issuer: I,
    current: RwLock<Option<Credential>>,
    /// Refresh this long before the real expiry.
    leeway: Duration,
}

impl<I: TokenIssuer> CredentialCache<I> {
    pub fn new(issuer: I) -> Self {
        Self {
            issuer,
            current: RwLock::new(None),
            leeway: Duration::seconds(30),
        }
    }

    /// # Errors
    /// Returns the issuer's error when a fresh token is needed and cannot be had.
    pub async fn acquire(&self) -> Result<String, LookupError> {
        self.acquire_at(Utc::now()).await
    }

    /// # Errors
    /// Returns the issuer's error when a fresh token is needed and cannot be had.
    pub async fn acquire_at(&self, now: DateTime<Utc>) -> Result<String, LookupError> {
        let horizon = now + self.leeway;
        if let Some(credential) = self.current.read().await.as_ref() {
            if credential.is_valid_at(horizon) {
                debug!("using cached token");
                return Ok(credential.token.clone());
            }
        }

        let mut slot = self.current.write().await;
        // another caller may have refreshed while we waited for the lock
        if let Some(credential) = slot.as_ref() {
            if credential.is_valid_at(horizon) {
                return Ok(credential.token.clone());
            }
        }
        info!("fetching new token");
        let credential = self.issuer.issue(now).await?;
        let token = credential.token.clone();
        *slot = Some(credential);
        Ok(token)
    }

    /// Forget the cached credential, e.g. after the server rejected it.
    pub async fn invalidate(&self) {
        *self.current.write().await = None;
    }
}
