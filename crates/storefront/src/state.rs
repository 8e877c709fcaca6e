//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::services::session::{PgSessionStore, SessionManager};
use crate::services::tokens::TokenCodec;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    sessions: SessionManager<PgSessionStore>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let codec = TokenCodec::new(&config.access_token_secret, &config.refresh_token_secret);
        let sessions = SessionManager::new(codec, PgSessionStore::new(pool.clone()));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                sessions,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the session manager.
    #[must_use]
    pub fn sessions(&self) -> &SessionManager<PgSessionStore> {
        &self.inner.sessions
    }
}
