use axum::{
    extract::{Multipart, State},
    Extension, Json,
};

use crate::error::{AppError, Result};
use crate::handlers::upload::read_upload_form;
use crate::models::{
    AboutEntry, CreateTextRequest, CurrentAdmin, FilesOverview, HomeEntry,
    LoginRequest, LoginResponse, TextEntry, UploadResponse,
};
use crate::services::{AdminService, AuthService, ContentService, ResourceService};
use crate::AppState;

/// Admin login
/// POST /admin/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let response = AuthService::login(&state.db, &state.config, req).await?;
    Ok(Json(response))
}

/// Dashboard upload routed by the `type` field
/// POST /admin/upload
pub async fn upload(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentAdmin>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let form = read_upload_form(
        multipart,
        &state.storage,
        "file",
        state.config.server.max_upload_size,
    )
    .await?;

    let kind = form.text("type").unwrap_or_default().trim().to_lowercase();
    let Some(filename) = form.file.as_ref().map(|f| f.file_name.clone()) else {
        return Err(AppError::BadRequest("No file uploaded".to_string()));
    };

    tracing::info!("Admin {} uploading {} as {}", admin.username, filename, kind);

    match kind.as_str() {
        "home" => {
            let fields = form.content_fields();
            ContentService::upsert::<HomeEntry>(
                &state.db,
                &state.storage,
                &state.content_locks,
                fields,
                form.file,
            )
            .await?;
        }
        "about" => {
            let fields = form.content_fields();
            ContentService::upsert::<AboutEntry>(
                &state.db,
                &state.storage,
                &state.content_locks,
                fields,
                form.file,
            )
            .await?;
        }
        "resources" => {
            let fields = form.resource_fields();
            ResourceService::create(&state.db, &state.storage, fields, form.file).await?;
        }
        _ => {
            form.discard(&state.storage).await;
            return Err(AppError::BadRequest(
                "Invalid content type. Expected home, about or resources".to_string(),
            ));
        }
    }

    Ok(Json(UploadResponse {
        message: "File uploaded successfully".to_string(),
        filename,
        kind,
    }))
}

/// Every stored content row
/// GET /admin/files
pub async fn list_files(State(state): State<AppState>) -> Result<Json<FilesOverview>> {
    let overview = AdminService::files_overview(&state.db).await?;
    Ok(Json(overview))
}

/// Save a free-form text entry
/// POST /admin/text
pub async fn create_text(
    State(state): State<AppState>,
    Json(req): Json<CreateTextRequest>,
) -> Result<Json<TextEntry>> {
    let entry = AdminService::create_text_entry(&state.db, &req.content).await?;
    Ok(Json(entry))
}
