use chrono::Utc;
use sqlx::SqliteConnection;
use tokio::sync::{Mutex, MutexGuard};

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{ContentFields, ContentSlot, DeleteResponse, PageContent};
use crate::storage::{LocalStorage, StoredUpload};

/// Per-slot writer locks. Singleton writes within this process take the
/// slot's lock before opening their transaction, so uploads, edits and
/// deletes never interleave on the same page.
#[derive(Default)]
pub struct SlotLocks {
    home: Mutex<()>,
    about: Mutex<()>,
}

impl SlotLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, slot: ContentSlot) -> MutexGuard<'_, ()> {
        match slot {
            ContentSlot::Home => self.home.lock().await,
            ContentSlot::About => self.about.lock().await,
        }
    }
}

/// Singleton page content (Home, About)
pub struct ContentService;

impl ContentService {
    /// Current row for the slot: the oldest one
    pub async fn current<T: PageContent>(db: &Database) -> Result<T> {
        let slot = T::SLOT;
        sqlx::query_as::<_, T>(&format!("SELECT * FROM {} ORDER BY id ASC LIMIT 1", slot.table()))
            .fetch_optional(db.pool())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} content not found", slot.label())))
    }

    /// Every row in the slot, oldest first
    pub async fn list<T: PageContent>(db: &Database) -> Result<Vec<T>> {
        let rows = sqlx::query_as::<_, T>(&format!("SELECT * FROM {} ORDER BY id ASC", T::SLOT.table()))
            .fetch_all(db.pool())
            .await?;
        Ok(rows)
    }

    pub async fn get<T: PageContent>(db: &Database, id: i64) -> Result<T> {
        let slot = T::SLOT;
        sqlx::query_as::<_, T>(&format!("SELECT * FROM {} WHERE id = ?", slot.table()))
            .bind(id)
            .fetch_optional(db.pool())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} entry not found", slot.label())))
    }

    /// Create or replace the slot's single row with a new upload.
    ///
    /// Rows beyond the oldest are deleted, the remaining row takes the new
    /// file and any field not supplied keeps its stored value. Files that are
    /// no longer referenced are unlinked only after the commit. On failure
    /// the new upload is removed and the stored row and files are untouched.
    pub async fn upsert<T: PageContent>(
        db: &Database,
        storage: &LocalStorage,
        locks: &SlotLocks,
        fields: ContentFields,
        upload: Option<StoredUpload>,
    ) -> Result<T> {
        let upload = upload.ok_or_else(|| AppError::BadRequest("Image is required".to_string()))?;

        let _guard = locks.lock(T::SLOT).await;
        match Self::upsert_in_transaction::<T>(db, fields, &upload).await {
            Ok((row, orphaned)) => {
                for path in orphaned {
                    storage.discard(&path).await;
                }
                tracing::info!("{} content now references {}", T::SLOT.label(), upload.file_name);
                Ok(row)
            }
            Err(e) => {
                tracing::error!(
                    "{} upsert failed, discarding upload {}: {}",
                    T::SLOT.label(),
                    upload.file_name,
                    e
                );
                storage.discard(&upload.file_name).await;
                Err(e)
            }
        }
    }

    /// Returns the saved row and the files it no longer references
    async fn upsert_in_transaction<T: PageContent>(
        db: &Database,
        fields: ContentFields,
        upload: &StoredUpload,
    ) -> Result<(T, Vec<String>)> {
        let slot = T::SLOT;
        let table = slot.table();
        let mut tx = db.begin_write().await?;
        let mut orphaned = Vec::new();

        let mut rows = sqlx::query_as::<_, T>(&format!("SELECT * FROM {} ORDER BY id ASC", table))
            .fetch_all(tx.as_mut())
            .await?;

        if rows.len() > 1 {
            tracing::warn!(
                "{} has {} rows, removing all but the oldest",
                slot.label(),
                rows.len()
            );
            for stale in rows.drain(1..) {
                sqlx::query(&format!("DELETE FROM {} WHERE id = ?", table))
                    .bind(stale.id())
                    .execute(tx.as_mut())
                    .await?;
                orphaned.extend(stale.image_path().map(String::from));
            }
        }

        let now = Utc::now().to_rfc3339();
        let id = match rows.pop() {
            None => {
                let fields = fields.normalized();
                Self::insert_row(tx.as_mut(), slot, &fields, upload, &now).await?
            }
            Some(existing) => {
                let merged = fields.or_existing(existing.fields());
                Self::update_row(
                    tx.as_mut(),
                    slot,
                    existing.id(),
                    &merged,
                    Some(upload.file_name.as_str()),
                    Some(upload.media_type.as_str()),
                    &now,
                )
                .await?;
                // The kept row may be a legacy drift row without the slot marker
                sqlx::query(&format!("UPDATE {} SET slot = 1 WHERE id = ?", table))
                    .bind(existing.id())
                    .execute(tx.as_mut())
                    .await?;
                if let Some(old) = existing.image_path() {
                    if old != upload.file_name {
                        orphaned.push(old.to_string());
                    }
                }
                existing.id()
            }
        };

        let row = sqlx::query_as::<_, T>(&format!("SELECT * FROM {} WHERE id = ?", table))
            .bind(id)
            .fetch_one(tx.as_mut())
            .await?;

        tx.commit().await?;
        Ok((row, orphaned))
    }

    /// Edit a specific row. Sent fields overwrite (blank clears), an optional
    /// upload replaces the stored file. A sent `media_type` wins over the
    /// upload's own type; blank clears it.
    pub async fn update_by_id<T: PageContent>(
        db: &Database,
        storage: &LocalStorage,
        locks: &SlotLocks,
        id: i64,
        fields: ContentFields,
        media_type: Option<String>,
        upload: Option<StoredUpload>,
    ) -> Result<T> {
        let _guard = locks.lock(T::SLOT).await;
        match Self::update_in_transaction::<T>(db, id, fields, media_type, upload.as_ref()).await {
            Ok((row, replaced)) => {
                if let Some(old) = replaced {
                    storage.discard(&old).await;
                }
                Ok(row)
            }
            Err(e) => {
                if let Some(upload) = &upload {
                    storage.discard(&upload.file_name).await;
                }
                Err(e)
            }
        }
    }

    /// Returns the updated row and the file it stopped referencing, if any
    async fn update_in_transaction<T: PageContent>(
        db: &Database,
        id: i64,
        fields: ContentFields,
        media_type: Option<String>,
        upload: Option<&StoredUpload>,
    ) -> Result<(T, Option<String>)> {
        let slot = T::SLOT;
        let mut tx = db.begin_write().await?;

        let existing = sqlx::query_as::<_, T>(&format!("SELECT * FROM {} WHERE id = ?", slot.table()))
            .bind(id)
            .fetch_optional(tx.as_mut())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} entry not found", slot.label())))?;

        let merged = fields.overlay(existing.fields());
        let image_path = match upload {
            Some(upload) => Some(upload.file_name.clone()),
            None => existing.image_path().map(String::from),
        };
        let media_type = match media_type {
            Some(sent) => Some(sent).filter(|v| !v.trim().is_empty()),
            None => upload
                .map(|u| u.media_type.clone())
                .or_else(|| existing.media_type().map(String::from)),
        };

        let now = Utc::now().to_rfc3339();
        Self::update_row(
            tx.as_mut(),
            slot,
            id,
            &merged,
            image_path.as_deref(),
            media_type.as_deref(),
            &now,
        )
        .await?;

        let row = sqlx::query_as::<_, T>(&format!("SELECT * FROM {} WHERE id = ?", slot.table()))
            .bind(id)
            .fetch_one(tx.as_mut())
            .await?;
        tx.commit().await?;

        let replaced = match (existing.image_path(), upload) {
            (Some(old), Some(new)) if old != new.file_name => Some(old.to_string()),
            _ => None,
        };
        Ok((row, replaced))
    }

    /// Delete a row and, best effort, the file it owns
    pub async fn delete_by_id<T: PageContent>(
        db: &Database,
        storage: &LocalStorage,
        locks: &SlotLocks,
        id: i64,
    ) -> Result<DeleteResponse> {
        let slot = T::SLOT;
        let _guard = locks.lock(slot).await;

        let mut tx = db.begin_write().await?;
        let existing = sqlx::query_as::<_, T>(&format!("SELECT * FROM {} WHERE id = ?", slot.table()))
            .bind(id)
            .fetch_optional(tx.as_mut())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} entry not found", slot.label())))?;

        sqlx::query(&format!("DELETE FROM {} WHERE id = ?", slot.table()))
            .bind(id)
            .execute(tx.as_mut())
            .await?;
        tx.commit().await?;

        let file_error = match existing.image_path() {
            Some(path) => storage.remove(path).await.err().map(|e| {
                tracing::warn!("{} entry {} deleted but file remains: {}", slot.label(), id, e);
                e.to_string()
            }),
            None => None,
        };

        Ok(DeleteResponse {
            message: format!("{} entry deleted", slot.label()),
            file_removed: existing.image_path().is_some() && file_error.is_none(),
            file_error,
        })
    }

    async fn insert_row(
        conn: &mut SqliteConnection,
        slot: ContentSlot,
        fields: &ContentFields,
        upload: &StoredUpload,
        now: &str,
    ) -> Result<i64> {
        let result = if slot.has_description() {
            sqlx::query(&format!(
                "INSERT INTO {} (slot, title, content, description, image_path, media_type, created_at, updated_at) VALUES (1, ?, ?, ?, ?, ?, ?, ?)",
                slot.table()
            ))
            .bind(&fields.title)
            .bind(&fields.content)
            .bind(&fields.description)
            .bind(&upload.file_name)
            .bind(&upload.media_type)
            .bind(now)
            .bind(now)
            .execute(conn)
            .await?
        } else {
            sqlx::query(&format!(
                "INSERT INTO {} (slot, title, content, image_path, media_type, created_at, updated_at) VALUES (1, ?, ?, ?, ?, ?, ?)",
                slot.table()
            ))
            .bind(&fields.title)
            .bind(&fields.content)
            .bind(&upload.file_name)
            .bind(&upload.media_type)
            .bind(now)
            .bind(now)
            .execute(conn)
            .await?
        };

        Ok(result.last_insert_rowid())
    }

    async fn update_row(
        conn: &mut SqliteConnection,
        slot: ContentSlot,
        id: i64,
        fields: &ContentFields,
        image_path: Option<&str>,
        media_type: Option<&str>,
        now: &str,
    ) -> Result<()> {
        if slot.has_description() {
            sqlx::query(&format!(
                "UPDATE {} SET title = ?, content = ?, description = ?, image_path = ?, media_type = ?, updated_at = ? WHERE id = ?",
                slot.table()
            ))
            .bind(&fields.title)
            .bind(&fields.content)
            .bind(&fields.description)
            .bind(image_path)
            .bind(media_type)
            .bind(now)
            .bind(id)
            .execute(conn)
            .await?;
        } else {
            sqlx::query(&format!(
                "UPDATE {} SET title = ?, content = ?, image_path = ?, media_type = ?, updated_at = ? WHERE id = ?",
                slot.table()
            ))
            .bind(&fields.title)
            .bind(&fields.content)
            .bind(image_path)
            .bind(media_type)
            .bind(now)
            .bind(id)
            .execute(conn)
            .await?;
        }
        Ok(())
    }
}
