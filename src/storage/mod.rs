pub mod local;

pub use local::*;

/// A file accepted from a multipart upload and already written to the upload
/// directory.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    /// Generated name inside the upload directory (what rows reference)
    pub file_name: String,
    /// Name the client sent
    pub original_name: String,
    pub media_type: String,
    pub size: u64,
}
