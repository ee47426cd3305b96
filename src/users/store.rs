use async_trait::async_trait;

use crate::error::StoreError;
use crate::users::repo_types::{User, UserDraft};

/// Persistence for user records. Implemented by the in-memory and PostgreSQL backends.
///
/// Absence is reported as `Ok(None)` from `get` and `update`, and as
/// `StoreError::NotFound` from `delete`. `list` returns newest records first.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, draft: UserDraft) -> Result<User, StoreError>;
    async fn get(&self, id: &str) -> Result<Option<User>, StoreError>;
    async fn list(&self) -> Result<Vec<User>, StoreError>;
    async fn update(&self, id: &str, draft: UserDraft) -> Result<Option<User>, StoreError>;
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Connectivity probe used by the readiness endpoint.
    async fn ping(&self) -> Result<(), StoreError>;

    fn backend(&self) -> &'static str;
}
