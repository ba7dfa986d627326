//! Database Module
//!
//! Handles SQLite connection pool and migrations

pub mod repository;

use repository::{RepoError, RepoResult};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::path::Path;
use std::time::Duration;

/// Database service, owns the SQLite connection pool
#[derive(Clone)]
pub struct DbService {
    pub pool: SqlitePool,
}

impl DbService {
    /// Open (or create) the station database with WAL mode and run migrations
    pub async fn new(db_path: &Path) -> RepoResult<Self> {
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                RepoError::Database(format!(
                    "Failed to create database directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        // WAL, foreign keys, normal sync; busy_timeout: 写冲突时等待 5s 而非立即失败
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5))
            .optimize_on_close(true, None);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| RepoError::Database(format!("Failed to open database: {e}")))?;

        tracing::info!(path = %db_path.display(), "Database connection established (SQLite WAL, busy_timeout=5000ms)");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| RepoError::Database(format!("Failed to apply migrations: {e}")))?;
        tracing::info!("Database migrations applied");

        Ok(Self { pool })
    }

    /// Close the pool, flushing WAL on the way out
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_seeds_settings() {
        let dir = tempfile::tempdir().unwrap();
        let db = DbService::new(&dir.path().join("data").join("outerbox.db"))
            .await
            .unwrap();

        let rule = repository::settings::box_rule(&db.pool).await.unwrap();
        assert_eq!(rule, repository::settings::DEFAULT_BOX_RULE);
        assert_eq!(
            repository::settings::current_sequence(&db.pool).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outerbox.db");

        let db = DbService::new(&path).await.unwrap();
        repository::settings::next_sequence(&db.pool).await.unwrap();
        db.close().await;

        let db = DbService::new(&path).await.unwrap();
        assert_eq!(
            repository::settings::current_sequence(&db.pool).await.unwrap(),
            1
        );
    }
}
