use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Free-form text saved from the admin dashboard
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextEntry {
    pub id: i64,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTextRequest {
    #[serde(default)]
    pub content: String,
}
