use std::collections::BTreeMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::users::{
    repo_types::{User, UserDraft},
    store::UserStore,
};

#[derive(Default)]
struct Inner {
    users: BTreeMap<u64, User>,
    last_id: u64,
}

/// Process-local store. Ids are a counter starting at 1 and are never reused.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: RwLock<Inner>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Only the exact decimal form the store hands out names a user; "01" or "+1" do not.
fn parse_key(id: &str) -> Option<u64> {
    id.parse().ok().filter(|key: &u64| key.to_string() == id)
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, draft: UserDraft) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        inner.last_id += 1;
        let key = inner.last_id;

        let now = OffsetDateTime::now_utc();
        let user = User {
            id: key.to_string(),
            name: draft.name,
            email: draft.email,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(key, user.clone());
        Ok(user)
    }

    async fn get(&self, id: &str) -> Result<Option<User>, StoreError> {
        let Some(key) = parse_key(id) else {
            return Ok(None);
        };
        let inner = self.inner.read().await;
        Ok(inner.users.get(&key).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let inner = self.inner.read().await;
        let mut users: Vec<(u64, User)> = inner
            .users
            .iter()
            .map(|(k, u)| (*k, u.clone()))
            .collect();
        drop(inner);

        // Keys grow with creation order, so they break created_at ties.
        users.sort_by(|(ka, a), (kb, b)| b.created_at.cmp(&a.created_at).then(kb.cmp(ka)));
        Ok(users.into_iter().map(|(_, u)| u).collect())
    }

    async fn update(&self, id: &str, draft: UserDraft) -> Result<Option<User>, StoreError> {
        let Some(key) = parse_key(id) else {
            return Ok(None);
        };
        let mut inner = self.inner.write().await;
        let Some(user) = inner.users.get_mut(&key) else {
            return Ok(None);
        };

        user.name = draft.name;
        user.email = draft.email;
        // Wall clock may step backwards; updated_at must not.
        user.updated_at = OffsetDateTime::now_utc().max(user.updated_at);
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let key = parse_key(id).ok_or(StoreError::NotFound)?;
        let mut inner = self.inner.write().await;
        inner
            .users
            .remove(&key)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
