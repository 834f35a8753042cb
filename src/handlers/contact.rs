use axum::{extract::State, Json};

use crate::error::Result;
use crate::models::{ContactRequest, ContactResponse};
use crate::services::ContactService;
use crate::AppState;

/// Relay the contact form by email
/// POST /api/contact
pub async fn submit_contact(
    State(state): State<AppState>,
    Json(req): Json<ContactRequest>,
) -> Result<Json<ContactResponse>> {
    let response = ContactService::submit(state.mailer.as_ref(), req).await?;
    Ok(Json(response))
}
