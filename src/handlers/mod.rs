pub mod admin;
pub mod contact;
pub mod content;
pub mod resource;
pub mod upload;

use axum::Json;

use crate::error::{AppError, MessageResponse, Result};

/// Path ids are integers; anything else is a client error
pub fn parse_id(raw: &str) -> Result<i64> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest("Invalid id".to_string()))
}

/// API welcome message
/// GET /api
pub async fn welcome() -> Json<MessageResponse> {
    Json(MessageResponse::new("Welcome to the AI Learning API"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_integers() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert_eq!(parse_id(" 7 ").unwrap(), 7);
        assert!(parse_id("abc").is_err());
        assert!(parse_id("1.5").is_err());
    }
}
