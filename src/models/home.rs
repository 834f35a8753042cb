use serde::Serialize;
use sqlx::FromRow;

use super::{ContentFields, ContentSlot, PageContent};

/// Home page singleton row
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeEntry {
    pub id: i64,
    pub title: Option<String>,
    pub content: Option<String>,
    pub description: Option<String>,
    pub image_path: Option<String>,
    pub media_type: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl PageContent for HomeEntry {
    const SLOT: ContentSlot = ContentSlot::Home;

    fn id(&self) -> i64 {
        self.id
    }

    fn image_path(&self) -> Option<&str> {
        self.image_path.as_deref()
    }

    fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    fn fields(&self) -> ContentFields {
        ContentFields {
            title: self.title.clone(),
            content: self.content.clone(),
            description: self.description.clone(),
        }
    }
}
