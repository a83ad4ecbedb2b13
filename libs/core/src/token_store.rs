use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;

use crate::types::AccessToken;

/// Shared token store handle used across the gateway.
pub type SharedTokenStore = Arc<dyn TokenStore>;

/// Access tokens keyed by session identifier.
///
/// Sessions are opaque strings: the WhatsApp sender number for webhook
/// traffic, or an explicit `session` parameter for browser/API traffic.
/// Concurrent authorizations for the same session race and the last writer
/// wins.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn put(&self, session: &str, token: AccessToken) -> Result<()>;
    async fn get(&self, session: &str) -> Result<Option<AccessToken>>;
}

#[derive(Default)]
pub struct MemoryTokenStore {
    tokens: DashMap<String, AccessToken>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self {
            tokens: DashMap::new(),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn put(&self, session: &str, token: AccessToken) -> Result<()> {
        self.tokens.insert(session.to_string(), token);
        Ok(())
    }

    async fn get(&self, session: &str) -> Result<Option<AccessToken>> {
        Ok(self.tokens.get(session).map(|entry| entry.value().clone()))
    }
}

/// Returns an in-memory token store wrapped in an [`Arc`].
pub fn shared_memory_store() -> SharedTokenStore {
    Arc::new(MemoryTokenStore::new())
}
