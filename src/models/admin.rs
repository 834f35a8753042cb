use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::{AboutEntry, HomeEntry, Resource};

/// Admin account
#[derive(Debug, Clone, FromRow)]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Login response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Authenticated admin (extracted from the bearer token)
#[derive(Debug, Clone)]
pub struct CurrentAdmin {
    pub id: i64,
    pub username: String,
}

/// JWT Claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // admin username
    pub jti: String,
    pub exp: usize,
    pub iat: usize,
}

/// Everything the dashboard lists
#[derive(Debug, Serialize)]
pub struct FilesOverview {
    pub homes: Vec<HomeEntry>,
    pub abouts: Vec<AboutEntry>,
    pub resources: Vec<Resource>,
}

/// Result of a dashboard upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
    #[serde(rename = "type")]
    pub kind: String,
}
