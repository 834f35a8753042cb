use serde::Serialize;
use sqlx::FromRow;

use super::{ContentFields, ContentSlot, PageContent};

/// About page singleton row. Unlike Home it always carries media and has no
/// description.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutEntry {
    pub id: i64,
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_path: String,
    pub media_type: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl PageContent for AboutEntry {
    const SLOT: ContentSlot = ContentSlot::About;

    fn id(&self) -> i64 {
        self.id
    }

    fn image_path(&self) -> Option<&str> {
        Some(&self.image_path)
    }

    fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    fn fields(&self) -> ContentFields {
        ContentFields {
            title: self.title.clone(),
            content: self.content.clone(),
            description: None,
        }
    }
}
