mod models;

pub use models::*;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::config::ServerConfig;

pub type DbPool = SqlitePool;

/// Execute a SQL migration file, properly handling comments
async fn execute_sql(pool: &SqlitePool, sql: &str) -> Result<()> {
    for statement in sql.split(';') {
        // Strip SQL comment lines (lines starting with --)
        let cleaned: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = cleaned.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(pool).await?;
        }
    }
    Ok(())
}

/// Open (creating if needed) the database file inside `data_dir`
pub async fn init(data_dir: &Path) -> Result<DbPool> {
    let db_path = data_dir.join("recipes.db");

    info!("Initializing database at {}", db_path.display());

    let options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    run_migrations(&pool).await?;

    info!("Database initialized successfully");
    Ok(pool)
}

/// Open a database from an explicit SQLite URL.
///
/// In-memory databases are private to a single connection, so the pool is
/// pinned to one connection that is never recycled.
pub async fn connect(url: &str) -> Result<DbPool> {
    let options = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("Invalid database URL: {}", url))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool_options = if url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    let pool = pool_options
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database: {}", url))?;

    run_migrations(&pool).await?;
    Ok(pool)
}

/// Open the database configured for the server: `database_url` when set,
/// otherwise `recipes.db` under `data_dir`
pub async fn open(config: &ServerConfig) -> Result<DbPool> {
    match config.database_url {
        Some(ref url) => connect(url).await,
        None => {
            std::fs::create_dir_all(&config.data_dir).with_context(|| {
                format!(
                    "Failed to create data directory: {}",
                    config.data_dir.display()
                )
            })?;
            init(&config.data_dir).await
        }
    }
}

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    // Migration 001: Users and sessions
    let has_users_table: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name='users'")
            .fetch_optional(pool)
            .await?;
    if has_users_table.is_none() {
        execute_sql(pool, include_str!("../../migrations/001_users.sql")).await?;
    }

    // Migration 002: Recipes, tags, ingredients
    let has_recipes_table: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name='recipes'")
            .fetch_optional(pool)
            .await?;
    if has_recipes_table.is_none() {
        execute_sql(pool, include_str!("../../migrations/002_recipes.sql")).await?;
    }

    info!("Migrations completed");
    Ok(())
}
