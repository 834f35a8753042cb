use crate::error::{AppError, Result};
use crate::mailer::{Mailer, OutgoingEmail};
use crate::models::{ContactRequest, ContactResponse};

/// Contact form relay. Nothing is persisted.
pub struct ContactService;

impl ContactService {
    pub async fn submit(mailer: &dyn Mailer, req: ContactRequest) -> Result<ContactResponse> {
        let email = Self::build_email(req)?;
        mailer.send(email).await?;

        Ok(ContactResponse {
            success: true,
            message: "Email sent successfully".to_string(),
        })
    }

    /// Validate a submission and turn it into the message sent to the owner
    pub fn build_email(req: ContactRequest) -> Result<OutgoingEmail> {
        let name = req.name.trim();
        let email = req.email.trim();
        let message = req.message.trim();

        if name.is_empty() || email.is_empty() || message.is_empty() {
            return Err(AppError::BadRequest("All fields are required".to_string()));
        }
        if !email.contains('@') {
            return Err(AppError::BadRequest("Invalid email format".to_string()));
        }

        Ok(OutgoingEmail {
            reply_to: email.to_string(),
            subject: format!("Contact Form Submission from {}", name),
            body: format!("Name: {}\nEmail: {}\nMessage: {}", name, email, message),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, email: &str, message: &str) -> ContactRequest {
        ContactRequest {
            name: name.into(),
            email: email.into(),
            message: message.into(),
        }
    }

    #[test]
    fn builds_subject_and_body_from_submission() {
        let email = ContactService::build_email(request(" Ada ", "ada@example.com", "Hi there")).unwrap();
        assert_eq!(email.subject, "Contact Form Submission from Ada");
        assert_eq!(email.reply_to, "ada@example.com");
        assert_eq!(email.body, "Name: Ada\nEmail: ada@example.com\nMessage: Hi there");
    }

    #[test]
    fn whitespace_only_fields_count_as_missing() {
        let err = ContactService::build_email(request("Ada", "ada@example.com", "   ")).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "All fields are required"));
    }

    #[test]
    fn email_without_at_sign_is_rejected() {
        let err = ContactService::build_email(request("Ada", "ada.example.com", "Hi")).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Invalid email format"));
    }
}
