// src/infrastructure/auth/mod.rs
// Token-table authenticator

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::repository::Authenticator;

/// Maps bearer tokens to user ids from a fixed table. Stands in for the
/// external authentication service at the boundary the engine consumes it.
pub struct StaticTokenAuthenticator {
    tokens: Mutex<HashMap<String, Uuid>>,
}

impl StaticTokenAuthenticator {
    pub fn new() -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
        }
    }

    pub fn register(&self, token: &str, user_id: Uuid) {
        let mut tokens = self.tokens.lock().unwrap();
        tokens.insert(token.to_string(), user_id);
    }
}

impl Default for StaticTokenAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Authenticator for StaticTokenAuthenticator {
    async fn resolve_bidder(&self, token: &str) -> Option<Uuid> {
        let tokens = self.tokens.lock().unwrap();
        tokens.get(token).copied()
    }
}
