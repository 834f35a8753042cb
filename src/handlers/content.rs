use axum::{
    extract::{Multipart, Path, State},
    Json,
};

use crate::error::Result;
use crate::handlers::{parse_id, upload::read_upload_form};
use crate::models::{DeleteResponse, PageContent};
use crate::services::ContentService;
use crate::AppState;

/// Get the page's current content
/// GET /api/home, GET /api/about
pub async fn get_current<T: PageContent>(State(state): State<AppState>) -> Result<Json<T>> {
    let entry = ContentService::current::<T>(&state.db).await?;
    Ok(Json(entry))
}

/// Upload new page media, creating or replacing the single row
/// POST /api/home, POST /api/about
pub async fn upsert<T: PageContent>(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<T>> {
    let form = read_upload_form(
        multipart,
        &state.storage,
        "image",
        state.config.server.max_upload_size,
    )
    .await?;
    let fields = form.content_fields();

    let entry = ContentService::upsert::<T>(
        &state.db,
        &state.storage,
        &state.content_locks,
        fields,
        form.file,
    )
    .await?;
    Ok(Json(entry))
}

/// Edit a specific row, optionally replacing its media or overriding its
/// `mediaType`
/// PUT /api/home/:id, PUT /api/about/:id
pub async fn update<T: PageContent>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<T>> {
    let form = read_upload_form(
        multipart,
        &state.storage,
        "image",
        state.config.server.max_upload_size,
    )
    .await?;

    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(e) => {
            form.discard(&state.storage).await;
            return Err(e);
        }
    };

    let fields = form.content_fields();
    let media_type = form.text("mediaType");
    let entry = ContentService::update_by_id::<T>(
        &state.db,
        &state.storage,
        &state.content_locks,
        id,
        fields,
        media_type,
        form.file,
    )
    .await?;
    Ok(Json(entry))
}

/// Delete a row and its media
/// DELETE /api/home/:id, DELETE /api/about/:id
pub async fn delete<T: PageContent>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let id = parse_id(&id)?;
    let response =
        ContentService::delete_by_id::<T>(&state.db, &state.storage, &state.content_locks, id).await?;
    Ok(Json(response))
}
