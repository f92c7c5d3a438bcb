//! services/client/src/session.rs
//!
//! The session store: a bearer token and the signed-in user's profile, kept in
//! durable key/value storage under fixed keys. No expiry is enforced here; the
//! backend decides whether a token is still good.

use std::collections::HashMap;
use std::sync::Arc;

use prd_client_core::domain::{Session, UserProfile};
use prd_client_core::ports::{KeyValueStore, PortError, PortResult};
use tracing::warn;

use crate::config::AuthMode;
use crate::records::ProfileRecord;

pub const AUTH_TOKEN_KEY: &str = "prd_generator_auth_token";
pub const USER_DATA_KEY: &str = "prd_generator_user_data";

/// Cheap to clone; all clones share the same backing store.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    mode: AuthMode,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>, mode: AuthMode) -> Self {
        Self { store, mode }
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn token(&self) -> PortResult<Option<String>> {
        self.store.get(AUTH_TOKEN_KEY)
    }

    pub fn set_token(&self, token: &str) -> PortResult<()> {
        self.store.set(AUTH_TOKEN_KEY, token)
    }

    /// The stored profile. A record that no longer parses is treated as absent.
    pub fn user(&self) -> PortResult<Option<UserProfile>> {
        let Some(raw) = self.store.get(USER_DATA_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<ProfileRecord>(&raw) {
            Ok(record) => Ok(Some(record.to_domain())),
            Err(e) => {
                warn!("Ignoring unreadable stored profile: {}", e);
                Ok(None)
            }
        }
    }

    pub fn set_user(&self, user: &UserProfile) -> PortResult<()> {
        let json = serde_json::to_string(&ProfileRecord::from_domain(user))
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        self.store.set(USER_DATA_KEY, &json)
    }

    /// Writes token and profile together. If the profile cannot be written the
    /// token is removed again, so a token never outlives a failed commit.
    pub fn commit(&self, token: &str, user: &UserProfile) -> PortResult<()> {
        self.set_token(token)?;
        if let Err(e) = self.set_user(user) {
            if let Err(rollback) = self.store.remove(AUTH_TOKEN_KEY) {
                warn!("Failed to roll back token after profile write error: {}", rollback);
            }
            return Err(e);
        }
        Ok(())
    }

    pub fn clear(&self) -> PortResult<()> {
        self.store.remove(AUTH_TOKEN_KEY)?;
        self.store.remove(USER_DATA_KEY)
    }

    pub fn load(&self) -> PortResult<Session> {
        Ok(Session {
            token: self.token()?,
            user: self.user()?,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        match self.mode {
            AuthMode::Disabled => true,
            AuthMode::Enforced => match self.token() {
                Ok(token) => token.is_some(),
                Err(e) => {
                    warn!("Could not read the stored token: {}", e);
                    false
                }
            },
        }
    }

    /// `{"Authorization": "Bearer <token>"}` when a token is stored, else empty.
    pub fn auth_headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        if self.mode == AuthMode::Disabled {
            return headers;
        }
        if let Ok(Some(token)) = self.token() {
            headers.insert("Authorization".to_string(), bearer(&token));
        }
        headers
    }
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
