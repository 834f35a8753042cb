use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::services::AuthService;
use crate::AppState;

/// Admin authentication middleware
/// Requires a valid bearer token for an admin that still exists
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) if !token.trim().is_empty() => token.trim().to_string(),
        _ => {
            return Err(AppError::Unauthorized(
                "Missing or invalid Authorization header".to_string(),
            ));
        }
    };

    let admin = AuthService::authenticate(&state.db, &state.config, &token).await?;
    tracing::debug!("Authorized admin {} for {}", admin.username, request.uri().path());

    request.extensions_mut().insert(admin);

    Ok(next.run(request).await)
}
