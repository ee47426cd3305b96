use crate::config::{AppConfig, StoreBackend};
use crate::db;
use crate::users::{memory::MemoryUserStore, repo::PgUserStore, store::UserStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Builds the configured store. The postgres backend connects and migrates first.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn UserStore> = match config.store {
            StoreBackend::Memory => Arc::new(MemoryUserStore::new()),
            StoreBackend::Postgres => {
                let pool = db::connect(&config.database).await?;
                db::migrate_or_warn(&pool).await;
                Arc::new(PgUserStore::new(pool))
            }
        };

        Ok(Self::from_parts(store, Arc::new(config)))
    }

    pub fn from_parts(store: Arc<dyn UserStore>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        let config = AppConfig::from_lookup(|key| match key {
            "STORE_BACKEND" => Some("memory".into()),
            _ => None,
        })
        .expect("default config is valid");

        Self::from_parts(Arc::new(MemoryUserStore::new()), Arc::new(config))
    }
}
