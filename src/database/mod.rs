//! SeaORM-backed metadata database
//!
//! SQLite, PostgreSQL and MySQL URLs are accepted. SQLite files are created
//! on first use.

use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, Database as SeaOrmDatabase, DatabaseBackend, DatabaseConnection};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::config::defaults::DEFAULT_MAX_CONNECTIONS;
use crate::utils::redact_url;

pub mod migrations;
pub mod repositories;

/// Database connection manager with multi-database support
#[derive(Clone)]
pub struct Database {
    pub connection: Arc<DatabaseConnection>,
    pub backend: DatabaseBackend,
    pub database_type: DatabaseType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    SQLite,
    PostgreSQL,
    MySQL,
}

impl DatabaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseType::SQLite => "SQLite",
            DatabaseType::PostgreSQL => "PostgreSQL",
            DatabaseType::MySQL => "MySQL",
        }
    }
}

impl Database {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let database_type = Self::detect_database_type(&config.url)?;
        let backend = match database_type {
            DatabaseType::SQLite => DatabaseBackend::Sqlite,
            DatabaseType::PostgreSQL => DatabaseBackend::Postgres,
            DatabaseType::MySQL => DatabaseBackend::MySql,
        };

        info!("Connecting to {} database at {}", database_type.as_str(), redact_url(&config.url));

        let connection_url = match database_type {
            DatabaseType::SQLite => Self::ensure_sqlite_auto_creation(&config.url)?,
            _ => config.url.clone(),
        };

        // Every connection to sqlite::memory: is its own database
        let max_connections = if connection_url.contains(":memory:") {
            1
        } else {
            config.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS)
        };

        let mut connect_options = ConnectOptions::new(&connection_url);
        connect_options
            .max_connections(max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(5))
            .acquire_timeout(Duration::from_secs(3))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false);

        let connection = SeaOrmDatabase::connect(connect_options)
            .await
            .with_context(|| format!("Failed to connect to database at '{}'", redact_url(&config.url)))?;

        debug!("Database connection established successfully");

        Ok(Self {
            connection: Arc::new(connection),
            backend,
            database_type,
        })
    }

    /// In-memory SQLite database with the schema applied
    pub async fn in_memory() -> Result<Self> {
        let database = Self::new(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: Some(1),
        })
        .await?;
        database.migrate().await?;
        Ok(database)
    }

    fn detect_database_type(url: &str) -> Result<DatabaseType> {
        if url.starts_with("sqlite:") {
            Ok(DatabaseType::SQLite)
        } else if url.starts_with("postgres:") || url.starts_with("postgresql:") {
            Ok(DatabaseType::PostgreSQL)
        } else if url.starts_with("mysql:") {
            Ok(DatabaseType::MySQL)
        } else {
            anyhow::bail!("Unsupported database URL format: {}", url);
        }
    }

    /// Add `mode=rwc` to SQLite file URLs so the file is created if missing
    fn ensure_sqlite_auto_creation(url: &str) -> Result<String> {
        if url.contains("mode=") || url.contains(":memory:") {
            return Ok(url.to_string());
        }

        let file_path = if let Some(path) = url.strip_prefix("sqlite://") {
            path
        } else if let Some(path) = url.strip_prefix("sqlite:") {
            path
        } else {
            anyhow::bail!("Invalid SQLite URL format: {}", url);
        };
        let file_path = file_path.split('?').next().unwrap_or(file_path);

        let path = std::path::Path::new(file_path);
        if path.exists() {
            return Ok(url.to_string());
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty() && !p.exists()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for SQLite database: {}", parent.display()))?;
            info!("Created directory for SQLite database: {}", parent.display());
        }

        let separator = if url.contains('?') { '&' } else { '?' };
        Ok(format!("{url}{separator}mode=rwc"))
    }

    pub async fn migrate(&self) -> Result<()> {
        use migrations::Migrator;
        use sea_orm_migration::MigratorTrait;

        info!("Running database migrations for {}", self.database_type.as_str());

        Migrator::up(&*self.connection, None)
            .await
            .context("Failed to run migrations")?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    pub fn connection(&self) -> Arc<DatabaseConnection> {
        self.connection.clone()
    }
}
