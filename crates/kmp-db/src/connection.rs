//! SurrealDB connection management.

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::{debug, info};

use crate::error::DbError;
use crate::schema::run_migrations;

/// Configuration for connecting to the officers database.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// WebSocket address (e.g., `127.0.0.1:8000`).
    pub url: String,
    /// SurrealDB namespace.
    pub namespace: String,
    /// SurrealDB database name.
    pub database: String,
    /// Root username for authentication.
    pub username: String,
    /// Root password for authentication.
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "kmp".into(),
            database: "officers".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

impl DbConfig {
    /// Defaults overridden by `KMP_DB_URL`, `KMP_DB_NAMESPACE`,
    /// `KMP_DB_DATABASE`, `KMP_DB_USER` and `KMP_DB_PASSWORD`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            url: lookup("KMP_DB_URL").unwrap_or(defaults.url),
            namespace: lookup("KMP_DB_NAMESPACE").unwrap_or(defaults.namespace),
            database: lookup("KMP_DB_DATABASE").unwrap_or(defaults.database),
            username: lookup("KMP_DB_USER").unwrap_or(defaults.username),
            password: lookup("KMP_DB_PASSWORD").unwrap_or(defaults.password),
        }
    }
}

/// Manages a connection to SurrealDB.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    /// Connect to SurrealDB using the provided configuration.
    ///
    /// Authenticates as root, selects the configured namespace and
    /// database, and returns a ready-to-use manager.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to SurrealDB"
        );

        let db = Surreal::new::<Ws>(&config.url).await?;

        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        debug!("SurrealDB session established");

        Ok(Self { db })
    }

    /// Connect and bring the schema up to date.
    pub async fn connect_and_migrate(config: &DbConfig) -> Result<Self, DbError> {
        let manager = Self::connect(config).await?;
        run_migrations(&manager.db).await?;
        info!("Officers database ready");
        Ok(manager)
    }

    /// Returns a reference to the underlying SurrealDB client.
    pub fn client(&self) -> &Surreal<Client> {
        &self.db
    }
}
