use axum::{
    extract::{Multipart, Path, State},
    Json,
};

use crate::error::Result;
use crate::handlers::{parse_id, upload::read_upload_form};
use crate::models::{DeleteResponse, Resource};
use crate::services::ResourceService;
use crate::AppState;

/// List resources
/// GET /api/resources
pub async fn list_resources(State(state): State<AppState>) -> Result<Json<Vec<Resource>>> {
    let resources = ResourceService::list(&state.db).await?;
    Ok(Json(resources))
}

/// Get a specific resource
/// GET /api/resources/:id
pub async fn get_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Resource>> {
    let resource = ResourceService::get(&state.db, parse_id(&id)?).await?;
    Ok(Json(resource))
}

/// Create a resource from an upload
/// POST /api/resources
pub async fn create_resource(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Resource>> {
    let form = read_upload_form(
        multipart,
        &state.storage,
        "file",
        state.config.server.max_upload_size,
    )
    .await?;
    let fields = form.resource_fields();

    let resource = ResourceService::create(&state.db, &state.storage, fields, form.file).await?;
    Ok(Json(resource))
}

/// Edit a resource, optionally replacing its file
/// PUT /api/resources/:id
pub async fn update_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Resource>> {
    let form = read_upload_form(
        multipart,
        &state.storage,
        "file",
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

    let fields = form.resource_fields();
    let resource = ResourceService::update(&state.db, &state.storage, id, fields, form.file).await?;
    Ok(Json(resource))
}

/// Delete a resource and its file
/// DELETE /api/resources/:id
pub async fn delete_resource(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let response = ResourceService::delete(&state.db, &state.storage, parse_id(&id)?).await?;
    Ok(Json(response))
}
