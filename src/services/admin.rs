use chrono::Utc;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{AboutEntry, FilesOverview, HomeEntry, TextEntry};
use crate::services::{ContentService, ResourceService};

/// Dashboard helpers that span several content types
pub struct AdminService;

impl AdminService {
    /// Everything the dashboard lists, each group oldest first
    pub async fn files_overview(db: &Database) -> Result<FilesOverview> {
        Ok(FilesOverview {
            homes: ContentService::list::<HomeEntry>(db).await?,
            abouts: ContentService::list::<AboutEntry>(db).await?,
            resources: ResourceService::list(db).await?,
        })
    }

    /// Save a free-form text entry
    pub async fn create_text_entry(db: &Database, content: &str) -> Result<TextEntry> {
        if content.trim().is_empty() {
            return Err(AppError::BadRequest("Content is required".to_string()));
        }

        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "INSERT INTO text_entries (content, created_at, updated_at) VALUES (?, ?, ?)",
        )
        .bind(content)
        .bind(&now)
        .bind(&now)
        .execute(db.pool())
        .await?;

        let entry: TextEntry = sqlx::query_as("SELECT * FROM text_entries WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(db.pool())
            .await?;

        Ok(entry)
    }
}
