use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use uuid::Uuid;

use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{AdminUser, Claims, CurrentAdmin, LoginRequest, LoginResponse};

/// Hash compared against when the username does not exist
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| AuthService::hash_password("ailearn-unknown-admin").ok());

/// Admin authentication service
pub struct AuthService;

impl AuthService {
    /// Check credentials and issue a signed token
    pub async fn login(db: &Database, config: &Config, req: LoginRequest) -> Result<LoginResponse> {
        // Same answer for unknown users and wrong passwords
        let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

        let admin: Option<AdminUser> = sqlx::query_as("SELECT * FROM admins WHERE username = ?")
            .bind(req.username.trim())
            .fetch_optional(db.pool())
            .await?;

        let Some(admin) = admin else {
            // Unknown users still pay for one hash check
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = Self::verify_password(&req.password, dummy);
            }
            return Err(invalid());
        };

        if !Self::verify_password(&req.password, &admin.password_hash)? {
            tracing::warn!("Failed login for admin {}", admin.username);
            return Err(invalid());
        }

        let token = Self::generate_token(&admin.username, config)?;
        tracing::info!("Admin {} logged in", admin.username);

        Ok(LoginResponse {
            success: true,
            token,
            token_type: "Bearer".to_string(),
            expires_in: config.jwt.expire_minutes * 60,
        })
    }

    /// Resolve a bearer token to the admin it was issued for
    pub async fn authenticate(db: &Database, config: &Config, token: &str) -> Result<CurrentAdmin> {
        let claims = Self::validate_token(token, config)?;

        let (id, username): (i64, String) =
            sqlx::query_as("SELECT id, username FROM admins WHERE username = ?")
                .bind(&claims.sub)
                .fetch_optional(db.pool())
                .await?
                .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;

        Ok(CurrentAdmin { id, username })
    }

    /// Create an admin, or reset the password of an existing one
    pub async fn create_admin(db: &Database, username: &str, password: &str) -> Result<i64> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::BadRequest("Username is required".to_string()));
        }
        if password.len() < 6 {
            return Err(AppError::BadRequest(
                "Password must be at least 6 characters".to_string(),
            ));
        }

        let password_hash = Self::hash_password(password)?;
        let now = Utc::now().to_rfc3339();

        let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM admins WHERE username = ?")
            .bind(username)
            .fetch_optional(db.pool())
            .await?;

        let id = match existing {
            Some((id,)) => {
                sqlx::query("UPDATE admins SET password_hash = ?, updated_at = ? WHERE id = ?")
                    .bind(&password_hash)
                    .bind(&now)
                    .bind(id)
                    .execute(db.pool())
                    .await?;
                tracing::info!("Reset password for admin {}", username);
                id
            }
            None => {
                let result = sqlx::query(
                    "INSERT INTO admins (username, password_hash, created_at, updated_at) VALUES (?, ?, ?, ?)",
                )
                .bind(username)
                .bind(&password_hash)
                .bind(&now)
                .bind(&now)
                .execute(db.pool())
                .await?;
                tracing::info!("Created admin {}", username);
                result.last_insert_rowid()
            }
        };

        Ok(id)
    }

    /// Remove every admin except `keep`; returns how many were removed
    pub async fn remove_other_admins(db: &Database, keep: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM admins WHERE username <> ?")
            .bind(keep.trim())
            .execute(db.pool())
            .await?;
        Ok(result.rows_affected())
    }

    /// Generate access token (JWT)
    fn generate_token(username: &str, config: &Config) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::minutes(config.jwt.expire_minutes as i64);

        let claims = Claims {
            sub: username.to_string(),
            jti: Uuid::new_v4().to_string(),
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt.secret.as_bytes()),
        )?;

        Ok(token)
    }

    /// Validate a token's signature and expiry, trying the current secret
    /// first and then any rotated-out ones
    pub fn validate_token(token: &str, config: &Config) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let keys = std::iter::once(config.jwt.secret.as_str())
            .chain(config.jwt.previous_secrets.iter().map(|s| s.as_str()));

        for secret in keys {
            if let Ok(token_data) = decode::<Claims>(
                token,
                &DecodingKey::from_secret(secret.as_bytes()),
                &validation,
            ) {
                return Ok(token_data.claims);
            }
        }

        Err(AppError::Unauthorized("Invalid token".to_string()))
    }

    /// Hash password using Argon2
    pub fn hash_password(password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?
            .to_string();

        Ok(password_hash)
    }

    /// Verify password against hash
    pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}
