//! Application state - shared across all handlers.

use std::sync::Arc;

use blog_core::ports::{PasswordService, PostRepository, SessionStore, TokenService, UserRepository};
use blog_infra::database::{DatabaseConfig, InMemoryPostRepository, InMemoryUserRepository};
use blog_infra::{Argon2PasswordService, InMemorySessionStore, JwtTokenService};

#[cfg(feature = "postgres")]
use blog_infra::database::{DatabaseConnections, PostgresPostRepository, PostgresUserRepository};

use crate::config::AppConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<dyn PostRepository>,
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        let (posts, users) = Self::repositories(config.database.as_ref(), config.run_migrations).await;
        let sessions = Self::session_store(config.redis_url.as_deref()).await;

        tracing::info!("Application state initialized");

        Self {
            posts,
            users,
            tokens: Arc::new(JwtTokenService::from_env()),
            passwords: Arc::new(Argon2PasswordService::new()),
            sessions,
        }
    }

    #[cfg(feature = "postgres")]
    async fn repositories(
        db_config: Option<&DatabaseConfig>,
        run_migrations: bool,
    ) -> (Arc<dyn PostRepository>, Arc<dyn UserRepository>) {
        use migration::{Migrator, MigratorTrait};

        let Some(config) = db_config else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return Self::memory_repositories();
        };

        let connections = match DatabaseConnections::init(config).await {
            Ok(connections) => connections,
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database: {}. Using in-memory fallback.",
                    e
                );
                return Self::memory_repositories();
            }
        };

        if run_migrations {
            match Migrator::up(&connections.main, None).await {
                Ok(()) => tracing::info!("Database migrations applied"),
                Err(e) => tracing::error!("Failed to apply migrations: {}", e),
            }
        }

        (
            Arc::new(PostgresPostRepository::new(connections.main.clone())),
            Arc::new(PostgresUserRepository::new(connections.main)),
        )
    }

    #[cfg(not(feature = "postgres"))]
    async fn repositories(
        db_config: Option<&DatabaseConfig>,
        _run_migrations: bool,
    ) -> (Arc<dyn PostRepository>, Arc<dyn UserRepository>) {
        if db_config.is_some() {
            tracing::warn!("DATABASE_URL ignored: built without postgres feature");
        }
        tracing::info!("Running without postgres feature - using in-memory repositories");
        Self::memory_repositories()
    }

    fn memory_repositories() -> (Arc<dyn PostRepository>, Arc<dyn UserRepository>) {
        (
            Arc::new(InMemoryPostRepository::new()),
            Arc::new(InMemoryUserRepository::new()),
        )
    }

    #[cfg(feature = "redis")]
    async fn session_store(redis_url: Option<&str>) -> Arc<dyn SessionStore> {
        use blog_infra::{RedisConfig, RedisSessionStore};

        let Some(url) = redis_url else {
            return Self::memory_session_store();
        };

        match RedisSessionStore::new(RedisConfig::from_env(url.to_string())).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::error!("Failed to connect to Redis: {}. Using in-memory sessions.", e);
                Self::memory_session_store()
            }
        }
    }

    #[cfg(not(feature = "redis"))]
    async fn session_store(redis_url: Option<&str>) -> Arc<dyn SessionStore> {
        if redis_url.is_some() {
            tracing::warn!("REDIS_URL ignored: built without redis feature");
        }
        Self::memory_session_store()
    }

    fn memory_session_store() -> Arc<dyn SessionStore> {
        let store = Arc::new(InMemorySessionStore::new());
        spawn_session_sweeper(Arc::clone(&store));
        store
    }
}

/// Periodically drop expired in-memory sessions.
fn spawn_session_sweeper(store: Arc<InMemorySessionStore>) {
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            let purged = store.purge_expired().await;
            if purged > 0 {
                tracing::debug!(purged, "Expired sessions purged");
            }
        }
    });
}
