use chrono::Utc;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{DeleteResponse, Resource, ResourceFields};
use crate::storage::{LocalStorage, StoredUpload};

/// Resource list management
pub struct ResourceService;

impl ResourceService {
    /// List all resources, oldest first
    pub async fn list(db: &Database) -> Result<Vec<Resource>> {
        let resources: Vec<Resource> = sqlx::query_as("SELECT * FROM resources ORDER BY id ASC")
            .fetch_all(db.pool())
            .await?;
        Ok(resources)
    }

    pub async fn get(db: &Database, id: i64) -> Result<Resource> {
        let resource: Resource = sqlx::query_as("SELECT * FROM resources WHERE id = ?")
            .bind(id)
            .fetch_optional(db.pool())
            .await?
            .ok_or_else(|| AppError::NotFound("Resource not found".to_string()))?;

        Ok(resource)
    }

    /// Create a resource owning the uploaded file
    pub async fn create(
        db: &Database,
        storage: &LocalStorage,
        fields: ResourceFields,
        upload: Option<StoredUpload>,
    ) -> Result<Resource> {
        let upload = upload.ok_or_else(|| AppError::BadRequest("File is required".to_string()))?;
        let now = Utc::now().to_rfc3339();

        let inserted = sqlx::query(
            r#"
            INSERT INTO resources (title, description, file_path, media_type, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(non_blank(fields.title))
        .bind(non_blank(fields.description))
        .bind(&upload.file_name)
        .bind(&upload.media_type)
        .bind(&now)
        .bind(&now)
        .execute(db.pool())
        .await;

        let id = match inserted {
            Ok(result) => result.last_insert_rowid(),
            Err(e) => {
                tracing::error!("Failed to save resource, discarding {}: {}", upload.file_name, e);
                storage.discard(&upload.file_name).await;
                return Err(e.into());
            }
        };

        tracing::info!("Created resource {} with file {}", id, upload.file_name);
        Self::get(db, id).await
    }

    /// Edit a resource. Omitted text fields keep their values; a new upload
    /// replaces the stored file.
    pub async fn update(
        db: &Database,
        storage: &LocalStorage,
        id: i64,
        fields: ResourceFields,
        upload: Option<StoredUpload>,
    ) -> Result<Resource> {
        let existing = match Self::get(db, id).await {
            Ok(existing) => existing,
            Err(e) => {
                if let Some(upload) = &upload {
                    storage.discard(&upload.file_name).await;
                }
                return Err(e);
            }
        };

        let title = fields.title.or(existing.title);
        let description = fields.description.or(existing.description);
        let (file_path, media_type) = match &upload {
            Some(upload) => (upload.file_name.clone(), Some(upload.media_type.clone())),
            None => (existing.file_path.clone(), existing.media_type),
        };
        let now = Utc::now().to_rfc3339();

        let updated = sqlx::query(
            "UPDATE resources SET title = ?, description = ?, file_path = ?, media_type = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&title)
        .bind(&description)
        .bind(&file_path)
        .bind(&media_type)
        .bind(&now)
        .bind(id)
        .execute(db.pool())
        .await;

        if let Err(e) = updated {
            if let Some(upload) = &upload {
                storage.discard(&upload.file_name).await;
            }
            return Err(e.into());
        }

        if upload.is_some() && existing.file_path != file_path {
            storage.discard(&existing.file_path).await;
        }

        Self::get(db, id).await
    }

    /// Delete a resource and, best effort, its file
    pub async fn delete(db: &Database, storage: &LocalStorage, id: i64) -> Result<DeleteResponse> {
        let resource = Self::get(db, id).await?;

        sqlx::query("DELETE FROM resources WHERE id = ?")
            .bind(id)
            .execute(db.pool())
            .await?;

        let file_error = storage.remove(&resource.file_path).await.err().map(|e| {
            tracing::warn!("Resource {} deleted but file remains: {}", id, e);
            e.to_string()
        });

        Ok(DeleteResponse {
            message: "Resource deleted".to_string(),
            file_removed: file_error.is_none(),
            file_error,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
