use serde::Serialize;
use sqlx::{sqlite::SqliteRow, FromRow};

/// Content types that hold exactly one live row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentSlot {
    Home,
    About,
}

impl ContentSlot {
    pub fn table(&self) -> &'static str {
        match self {
            ContentSlot::Home => "home",
            ContentSlot::About => "about",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContentSlot::Home => "Home",
            ContentSlot::About => "About",
        }
    }

    pub fn has_description(&self) -> bool {
        matches!(self, ContentSlot::Home)
    }
}

/// A row type backing a singleton page
pub trait PageContent: for<'r> FromRow<'r, SqliteRow> + Serialize + Send + Sync + Unpin {
    const SLOT: ContentSlot;

    fn id(&self) -> i64;
    fn image_path(&self) -> Option<&str>;
    fn media_type(&self) -> Option<&str>;
    fn fields(&self) -> ContentFields;
}

/// Text fields submitted with page content.
///
/// `None` means the field was not sent at all. A sent but blank value is kept
/// as `Some("")` so the merge rules below can tell the two apart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentFields {
    pub title: Option<String>,
    pub content: Option<String>,
    pub description: Option<String>,
}

impl ContentFields {
    /// Upload semantics: anything absent or blank falls back to `existing`.
    pub fn or_existing(self, existing: ContentFields) -> ContentFields {
        ContentFields {
            title: filled(self.title).or(existing.title),
            content: filled(self.content).or(existing.content),
            description: filled(self.description).or(existing.description),
        }
    }

    /// Edit semantics: absent keeps `existing`, blank clears the field.
    pub fn overlay(self, existing: ContentFields) -> ContentFields {
        ContentFields {
            title: overlay_field(self.title, existing.title),
            content: overlay_field(self.content, existing.content),
            description: overlay_field(self.description, existing.description),
        }
    }

    /// Blank values become `None`
    pub fn normalized(self) -> ContentFields {
        ContentFields {
            title: filled(self.title),
            content: filled(self.content),
            description: filled(self.description),
        }
    }
}

fn filled(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn overlay_field(value: Option<String>, existing: Option<String>) -> Option<String> {
    match value {
        None => existing,
        Some(v) => filled(Some(v)),
    }
}

/// Result of deleting a row that owns an upload. The row deletion always
/// succeeded when this is returned; file removal is reported on its own.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub message: String,
    pub file_removed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_error: Option<String>,
}
