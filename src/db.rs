use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::str::FromStr;
use std::time::Duration;

use crate::error::Result;

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    pub async fn new(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a transaction that holds the write lock from its first
    /// statement. A deferred transaction that reads before writing fails
    /// with SQLITE_BUSY instead of waiting when another connection is
    /// writing, since `busy_timeout` does not cover the lock upgrade.
    pub async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS home (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slot INTEGER DEFAULT 1,
                title TEXT,
                content TEXT,
                description TEXT,
                image_path TEXT,
                media_type TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS about (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slot INTEGER DEFAULT 1,
                title TEXT,
                content TEXT,
                image_path TEXT NOT NULL,
                media_type TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS resources (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT,
                description TEXT,
                file_path TEXT NOT NULL,
                media_type TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS admins (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS text_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        for table in ["home", "about"] {
            self.migrate_singleton_slot(table).await?;
        }

        tracing::info!("Database migrations completed");
        Ok(())
    }

    /// Backfill the `slot` column on singleton tables and enforce it with a
    /// unique index. Only the oldest row keeps slot 1; older duplicates stay
    /// NULL until the next upload removes them.
    async fn migrate_singleton_slot(&self, table: &str) -> Result<()> {
        // Backward-compatible column for databases created without it
        let _ = sqlx::query(&format!("ALTER TABLE {} ADD COLUMN slot INTEGER", table))
            .execute(&self.pool)
            .await;

        sqlx::query(&format!(
            "UPDATE {table} SET slot = NULL WHERE id <> (SELECT MIN(id) FROM {table})"
        ))
        .execute(&self.pool)
        .await?;
        sqlx::query(&format!(
            "UPDATE {table} SET slot = 1 WHERE id = (SELECT MIN(id) FROM {table})"
        ))
        .execute(&self.pool)
        .await?;
        sqlx::query(&format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_{table}_slot ON {table}(slot)"
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    async fn open_temp() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::new(path.to_str().unwrap()).await.unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let (_dir, db) = open_temp().await;
        db.run_migrations().await.unwrap();
        db.run_migrations().await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap();
        let names: Vec<&str> = tables.iter().map(|(n,)| n.as_str()).collect();
        assert_eq!(names, ["about", "admins", "home", "resources", "text_entries"]);
    }

    #[tokio::test]
    async fn legacy_duplicates_keep_slot_on_oldest_row() {
        let (_dir, db) = open_temp().await;
        sqlx::query(
            "CREATE TABLE home (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT, content TEXT, description TEXT, image_path TEXT, media_type TEXT, created_at TEXT NOT NULL, updated_at TEXT NOT NULL)",
        )
        .execute(db.pool())
        .await
        .unwrap();
        for title in ["first", "second", "third"] {
            sqlx::query("INSERT INTO home (title, created_at, updated_at) VALUES (?, 'x', 'x')")
                .bind(title)
                .execute(db.pool())
                .await
                .unwrap();
        }

        db.run_migrations().await.unwrap();

        let slots: Vec<(i64, Option<i64>)> = sqlx::query_as("SELECT id, slot FROM home ORDER BY id")
            .fetch_all(db.pool())
            .await
            .unwrap();
        assert_eq!(slots, vec![(1, Some(1)), (2, None), (3, None)]);

        let second = sqlx::query("INSERT INTO home (slot, created_at, updated_at) VALUES (1, 'x', 'x')")
            .execute(db.pool())
            .await;
        assert!(second.is_err(), "unique slot index must reject a second live row");
    }

    #[tokio::test]
    async fn write_transactions_wait_for_each_other() {
        let (_dir, db) = open_temp().await;
        db.run_migrations().await.unwrap();

        let mut first = db.begin_write().await.unwrap();
        sqlx::query("INSERT INTO text_entries (content) VALUES ('first')")
            .execute(first.as_mut())
            .await
            .unwrap();

        let other = db.clone();
        let second = tokio::spawn(async move {
            let mut tx = other.begin_write().await?;
            let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM text_entries")
                .fetch_one(tx.as_mut())
                .await?;
            sqlx::query("INSERT INTO text_entries (content) VALUES ('second')")
                .execute(tx.as_mut())
                .await?;
            tx.commit().await?;
            Ok::<i64, AppError>(count)
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        first.commit().await.unwrap();

        // The second writer saw the first one's row, so it started after the commit
        assert_eq!(second.await.unwrap().unwrap(), 1);
    }
}
