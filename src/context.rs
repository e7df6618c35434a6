/// Application context and dependency injection
use crate::{
    config::ServerConfig,
    db,
    error::{KlikError, KlikResult},
    verification::{
        ConsoleHandle, LiveUpdates, RecordSource, Subscription, VerificationStore, ViewCoordinator,
    },
};
use chrono::Duration;
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub store: Arc<VerificationStore>,
    pub console: ConsoleHandle,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> KlikResult<Self> {
        // Validate configuration
        config.validate()?;

        // Create data directories if they don't exist
        Self::ensure_directories(&config).await?;

        let db = db::create_pool(&config.storage.database, db::DatabaseOptions::default()).await?;
        db::run_migrations(&db).await?;
        db::test_connection(&db).await?;

        Ok(Self::with_pool(config, db))
    }

    /// Wire services over an already-migrated pool
    pub fn with_pool(config: ServerConfig, db: SqlitePool) -> Self {
        let store = Arc::new(VerificationStore::new(db.clone()));

        let source: Arc<dyn RecordSource> = store.clone();
        let coordinator = ViewCoordinator::new(source)
            .with_window(Duration::days(config.console.stats_window_days));

        Self {
            config: Arc::new(config),
            db,
            store,
            console: ConsoleHandle::new(coordinator),
        }
    }

    /// Start refreshing the console from the store's change feed, if enabled
    ///
    /// Take `subscription` before the initial load so that writes landing
    /// between the load and this call are still delivered. The returned guard
    /// must be kept alive for as long as updates are wanted.
    pub fn start_live_updates(&self, subscription: Subscription) -> Option<LiveUpdates> {
        if !self.config.console.live_updates {
            tracing::info!("Live updates disabled - console refreshes on demand only");
            return None;
        }

        Some(LiveUpdates::spawn(
            self.console.clone(),
            subscription,
            std::time::Duration::from_millis(self.config.console.live_debounce_ms),
        ))
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> KlikResult<()> {
        let dir = &config.storage.data_directory;
        if !dir.exists() {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                KlikError::Internal(format!("Failed to create directory {:?}: {}", dir, e))
            })?;
        }

        Ok(())
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
