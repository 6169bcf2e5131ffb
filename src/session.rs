// Session manager: opaque bearer tokens with a fixed 7-day expiry.

use chrono::Utc;
use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::Arc;

use crate::db::{RecordStore, StoreError, SESSIONS};
use crate::error::ApiError;
use crate::metrics;
use crate::models::Session;

/// Session lifetime. There is no refresh or rotation; a token is valid until
/// this expiry or explicit logout.
pub const SESSION_TTL_DAYS: i64 = 7;

/// The identity a valid token resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub user_id: String,
    pub email: String,
}

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<RecordStore>,
}

impl SessionManager {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// Issue a fresh token for the given user and persist it with its expiry.
    pub async fn create(&self, user_id: &str, email: &str) -> Result<String, StoreError> {
        let token = generate_token();
        let session = Session {
            token: token.clone(),
            user_id: user_id.to_string(),
            email: email.to_string(),
            expires_at: Utc::now() + chrono::Duration::days(SESSION_TTL_DAYS),
        };
        self.store.put(SESSIONS, &token, &session).await?;
        metrics::SESSIONS_ISSUED_TOTAL.inc();
        Ok(token)
    }

    /// Resolve a token to its identity. Unknown and expired tokens both
    /// reject; expired sessions are deleted on the way out (passive expiry,
    /// there is no background sweep).
    pub async fn validate(&self, token: &str) -> Result<SessionIdentity, ApiError> {
        let session: Option<Session> = self.store.get(SESSIONS, token).await?;
        let Some(session) = session else {
            return Err(ApiError::Unauthenticated("Invalid session"));
        };
        if Utc::now() > session.expires_at {
            let _ = self.store.delete(SESSIONS, token).await;
            return Err(ApiError::Unauthenticated("Session expired"));
        }
        Ok(SessionIdentity {
            user_id: session.user_id,
            email: session.email,
        })
    }

    /// Idempotent logout; revoking an absent token is not an error.
    pub async fn revoke(&self, token: &str) -> Result<(), StoreError> {
        self.store.delete(SESSIONS, token).await?;
        Ok(())
    }
}

/// 32 bytes from the OS RNG, hex-encoded: a 256-bit opaque bearer token.
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
