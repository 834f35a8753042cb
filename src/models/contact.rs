use serde::{Deserialize, Serialize};

/// Contact form submission. Missing fields deserialize as empty so the
/// service can answer with a validation error instead of a parse failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: String,
}
