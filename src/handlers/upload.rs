use axum::extract::Multipart;
use std::collections::HashMap;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{ContentFields, ResourceFields};
use crate::storage::{LocalStorage, StoredUpload};

/// A parsed multipart form: at most one stored file plus its text fields
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<StoredUpload>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    pub fn content_fields(&self) -> ContentFields {
        ContentFields {
            title: self.text("title"),
            content: self.text("content"),
            description: self.text("description"),
        }
    }

    pub fn resource_fields(&self) -> ResourceFields {
        ResourceFields {
            title: self.text("title"),
            description: self.text("description"),
        }
    }

    /// Remove the stored file when the form is being rejected
    pub async fn discard(self, storage: &LocalStorage) {
        if let Some(file) = self.file {
            storage.discard(&file.file_name).await;
        }
    }
}

/// Read a multipart body, streaming the part named `file_field` into the
/// upload directory under a generated name.
///
/// The extension is checked before anything is written and the size limit
/// while streaming. If reading fails after the file exists on disk, the file
/// is removed before the error is returned.
pub async fn read_upload_form(
    mut multipart: Multipart,
    storage: &LocalStorage,
    file_field: &str,
    max_size: u64,
) -> Result<UploadForm> {
    let mut form = UploadForm::default();

    if let Err(e) = read_parts(&mut multipart, storage, file_field, max_size, &mut form).await {
        form.discard(storage).await;
        return Err(e);
    }

    Ok(form)
}

async fn read_parts(
    multipart: &mut Multipart,
    storage: &LocalStorage,
    file_field: &str,
    max_size: u64,
    form: &mut UploadForm,
) -> Result<()> {
    while let Some(mut field) = multipart.next_field().await.map_err(|e| {
        AppError::BadRequest(format!("Failed to process multipart: {}", e))
    })? {
        let name = field.name().unwrap_or("").to_string();

        if name != file_field {
            if field.file_name().is_some() {
                tracing::debug!("Ignoring unexpected file part {}", name);
                continue;
            }
            let text = field.text().await.map_err(|e| {
                AppError::BadRequest(format!("Failed to read field {}: {}", name, e))
            })?;
            form.fields.insert(name, text);
            continue;
        }

        // Browsers send an empty part when no file was chosen
        let original_name = match field.file_name() {
            Some(n) if !n.trim().is_empty() => n.to_string(),
            _ => continue,
        };

        if form.file.is_some() {
            return Err(AppError::BadRequest(
                "Only one file may be uploaded".to_string(),
            ));
        }

        let canonical_mime = LocalStorage::validate_extension(&original_name)?;
        let media_type = field
            .content_type()
            .filter(|ct| !ct.is_empty() && *ct != "application/octet-stream")
            .unwrap_or(canonical_mime)
            .to_string();

        let file_name = LocalStorage::generate_file_name(&original_name);
        let mut file = storage.create(&file_name).await?;
        form.file = Some(StoredUpload {
            file_name,
            original_name,
            media_type,
            size: 0,
        });

        let mut size: u64 = 0;
        while let Some(chunk) = field.chunk().await.map_err(|e| {
            AppError::BadRequest(format!("Failed to read file chunk: {}", e))
        })? {
            size += chunk.len() as u64;
            if size > max_size {
                return Err(AppError::BadRequest(format!(
                    "File too large. Maximum size is {} bytes",
                    max_size
                )));
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        if let Some(stored) = form.file.as_mut() {
            stored.size = size;
            tracing::debug!(
                "Stored upload {} as {} ({} bytes)",
                stored.original_name,
                stored.file_name,
                stored.size
            );
        }
    }

    Ok(())
}
