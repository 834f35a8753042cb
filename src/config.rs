use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub jwt: JwtConfig,
    #[serde(default)]
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origin; any origin when unset
    #[serde(default)]
    pub cors_origin: Option<String>,
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
    /// Built SPA bundle served for non-API paths
    #[serde(default)]
    pub frontend_dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    #[serde(default = "default_jwt_secret")]
    pub secret: String,
    #[serde(default)]
    pub previous_secrets: Vec<String>,
    #[serde(default = "default_token_expire")]
    pub expire_minutes: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Mailbox receiving contact form submissions
    #[serde(default)]
    pub contact_email: Option<String>,
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_max_upload_size() -> u64 {
    50 * 1024 * 1024
}

fn default_db_path() -> String {
    "data/ailearn.db".to_string()
}

fn default_uploads_dir() -> String {
    "data/uploads".to_string()
}

fn default_jwt_secret() -> String {
    "change-me-admin-token-secret".to_string()
}

fn default_token_expire() -> u64 {
    12 * 60
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    465
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: None,
            max_upload_size: default_max_upload_size(),
            frontend_dir: None,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_dir: default_uploads_dir(),
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: default_jwt_secret(),
            previous_secrets: Vec::new(),
            expire_minutes: default_token_expire(),
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            username: None,
            password: None,
            contact_email: None,
        }
    }
}

impl MailConfig {
    /// True when every setting needed to relay mail is present
    pub fn is_configured(&self) -> bool {
        [&self.username, &self.password, &self.contact_email]
            .iter()
            .all(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from_file()?;
        config.apply_env_overrides();
        config.ensure_directories()?;
        config.ensure_jwt_secret()?;
        tracing::info!(
            "Storage config: database={}, uploads={}, max_upload_size={}",
            config.database.path,
            config.storage.uploads_dir,
            config.server.max_upload_size
        );
        Ok(config)
    }

    /// Ensure the token secret is not the placeholder, persisting a generated one
    fn ensure_jwt_secret(&mut self) -> anyhow::Result<()> {
        if self.jwt.secret == default_jwt_secret() || self.jwt.secret.trim().is_empty() {
            let secret_path = self.secret_path();

            if secret_path.exists() {
                let secret = fs::read_to_string(&secret_path)?;
                self.jwt.secret = secret.trim().to_string();
                tracing::info!("Loaded persisted token secret from {:?}", secret_path);
            } else {
                let secret = format!("{}{}", uuid::Uuid::new_v4(), uuid::Uuid::new_v4()).replace('-', "");

                if let Some(parent) = secret_path.parent() {
                    fs::create_dir_all(parent)?;
                }

                fs::write(&secret_path, &secret)?;
                self.jwt.secret = secret;
                tracing::info!("Generated and persisted new token secret to {:?}", secret_path);
            }
        }
        Ok(())
    }

    /// The generated secret lives next to the database file
    fn secret_path(&self) -> PathBuf {
        Path::new(&self.database.path)
            .parent()
            .map(|p| p.join(".jwt_secret"))
            .unwrap_or_else(|| PathBuf::from(".jwt_secret"))
    }

    /// Load configuration from conf.toml or config.toml
    fn load_from_file() -> anyhow::Result<Self> {
        let config_paths = ["conf.toml", "config.toml", "data/conf.toml", "data/config.toml"];

        for path in config_paths {
            if Path::new(path).exists() {
                let content = fs::read_to_string(path)?;
                let config: Config = toml::from_str(&content)?;
                tracing::info!("Loaded configuration from {}", path);
                return Ok(config);
            }
        }

        tracing::info!("No configuration file found, using defaults");
        Ok(Config::default())
    }

    /// Apply environment variable overrides
    /// Format: AIL_CONF_<SECTION>_<KEY>
    fn apply_env_overrides(&mut self) {
        // Server overrides
        if let Ok(val) = env::var("AIL_CONF_SERVER_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = env::var("AIL_CONF_SERVER_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = env::var("AIL_CONF_SERVER_CORS_ORIGIN") {
            self.server.cors_origin = non_empty(val);
        }
        if let Ok(val) = env::var("AIL_CONF_SERVER_MAX_UPLOAD_SIZE") {
            if let Ok(size) = val.parse() {
                self.server.max_upload_size = size;
            }
        }
        if let Ok(val) = env::var("AIL_CONF_SERVER_FRONTEND_DIR") {
            self.server.frontend_dir = non_empty(val);
        }

        // Database overrides
        if let Ok(val) = env::var("AIL_CONF_DATABASE_PATH") {
            self.database.path = val;
        }

        // Storage overrides
        if let Ok(val) = env::var("AIL_CONF_STORAGE_UPLOADS_DIR") {
            self.storage.uploads_dir = val;
        }

        // JWT overrides
        if let Ok(val) = env::var("AIL_CONF_JWT_SECRET") {
            self.jwt.secret = val;
        }
        if let Ok(val) = env::var("AIL_CONF_JWT_PREVIOUS_SECRETS") {
            self.jwt.previous_secrets = val
                .split(',')
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
                .collect();
        }
        if let Ok(val) = env::var("AIL_CONF_JWT_EXPIRE_MINUTES") {
            if let Ok(minutes) = val.parse() {
                self.jwt.expire_minutes = minutes;
            }
        }

        // Mail overrides
        if let Ok(val) = env::var("AIL_CONF_MAIL_SMTP_HOST") {
            if !val.trim().is_empty() {
                self.mail.smtp_host = val;
            }
        }
        if let Ok(val) = env::var("AIL_CONF_MAIL_SMTP_PORT") {
            if let Ok(port) = val.parse() {
                self.mail.smtp_port = port;
            }
        }
        if let Ok(val) = env::var("AIL_CONF_MAIL_USERNAME") {
            self.mail.username = non_empty(val);
        }
        if let Ok(val) = env::var("AIL_CONF_MAIL_PASSWORD") {
            self.mail.password = non_empty(val);
        }
        if let Ok(val) = env::var("AIL_CONF_MAIL_CONTACT_EMAIL") {
            self.mail.contact_email = non_empty(val);
        }
    }

    /// Ensure required directories exist
    fn ensure_directories(&self) -> anyhow::Result<()> {
        if let Some(parent) = Path::new(&self.database.path).parent() {
            fs::create_dir_all(parent)?;
        }

        fs::create_dir_all(&self.storage.uploads_dir)?;

        Ok(())
    }
}

fn non_empty(val: String) -> Option<String> {
    if val.trim().is_empty() {
        None
    } else {
        Some(val)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.server.max_upload_size, 52_428_800);
        assert_eq!(config.storage.uploads_dir, "data/uploads");
        assert!(config.server.cors_origin.is_none());
        assert!(!config.mail.is_configured());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 8080
            cors_origin = "https://ailearning.example"

            [mail]
            username = "site@example.com"
            password = "app-password"
            contact_email = "owner@example.com"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(
            config.server.cors_origin.as_deref(),
            Some("https://ailearning.example")
        );
        assert_eq!(config.mail.smtp_host, "smtp.gmail.com");
        assert!(config.mail.is_configured());
    }

    #[test]
    fn blank_mail_credentials_are_not_configured() {
        let mail = MailConfig {
            username: Some("site@example.com".into()),
            password: Some("  ".into()),
            contact_email: Some("owner@example.com".into()),
            ..MailConfig::default()
        };
        assert!(!mail.is_configured());
    }

    #[test]
    fn secret_is_stored_beside_database() {
        let mut config = Config::default();
        config.database.path = "/var/lib/ailearn/site.db".into();
        assert_eq!(config.secret_path(), PathBuf::from("/var/lib/ailearn/.jwt_secret"));
    }
}
