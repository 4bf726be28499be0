use std::sync::Arc;
use std::time::Duration;

use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use thiserror::Error;

use crate::repository::Storage;

mod ai_usage_repo;
mod class_repo;
mod lesson_repo;
mod mapping;
mod migrate;
mod progress_repo;
mod student_repo;

#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl SqliteRepository {
    /// Connect to `SQLite` using the given URL.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the connection cannot be established or if
    /// the connection pragmas fail.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5))
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query("PRAGMA foreign_keys = ON;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA journal_mode = WAL;")
                        .execute(&mut *conn)
                        .await?;
                    sqlx::query("PRAGMA busy_timeout = 5000;")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Create tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if migration queries fail.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

/// Turn a bare `sqlite:path` into a URL that creates the file when missing.
///
/// In-memory URLs and URLs that already carry query parameters are returned
/// unchanged.
#[must_use]
pub fn normalize_database_url(url: &str) -> String {
    let url = url.trim();
    if url.contains('?') || url.contains(":memory:") {
        return url.to_owned();
    }
    match url.strip_prefix("sqlite://") {
        Some(path) => format!("sqlite://{path}?mode=rwc"),
        None => match url.strip_prefix("sqlite:") {
            Some(path) => format!("sqlite://{path}?mode=rwc"),
            None => format!("sqlite://{url}?mode=rwc"),
        },
    }
}

impl Storage {
    /// Build a `Storage` backed by `SQLite`.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connection or migrations cannot be
    /// completed.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        Ok(Self {
            classes: Arc::new(repo.clone()),
            students: Arc::new(repo.clone()),
            progress: Arc::new(repo.clone()),
            lessons: Arc::new(repo.clone()),
            ai_usage: Arc::new(repo),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SqliteRepository>();
    }

    #[test]
    fn normalizes_file_urls() {
        assert_eq!(normalize_database_url("sqlite:aet.db"), "sqlite://aet.db?mode=rwc");
        assert_eq!(
            normalize_database_url("sqlite:///var/lib/aet.db"),
            "sqlite:///var/lib/aet.db?mode=rwc"
        );
        assert_eq!(normalize_database_url("data/aet.db"), "sqlite://data/aet.db?mode=rwc");
        assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            normalize_database_url("sqlite:file:x?mode=memory&cache=shared"),
            "sqlite:file:x?mode=memory&cache=shared"
        );
    }
}
