use serde::Serialize;
use sqlx::FromRow;

/// Downloadable resource listed on the Resources page
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub file_path: String,
    pub media_type: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Text fields sent with a resource create or edit
#[derive(Debug, Clone, Default)]
pub struct ResourceFields {
    pub title: Option<String>,
    pub description: Option<String>,
}
