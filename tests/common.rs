#![allow(dead_code)]

use ailearn::{
    config::Config,
    create_router,
    db::Database,
    error::{AppError, Result},
    mailer::{Mailer, OutgoingEmail},
    services::AuthService,
    AppState,
};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "password123";

/// Captures outgoing mail instead of relaying it
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub fail: bool,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<()> {
        if self.fail {
            return Err(AppError::Mail("relay refused the message".to_string()));
        }
        self.sent.lock().expect("mailer lock").push(email);
        Ok(())
    }
}

pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    pub db: Database,
    pub mailer: Arc<RecordingMailer>,
    uploads_dir: PathBuf,
    _root: TempDir,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with_mailer(RecordingMailer::default()).await
    }

    pub async fn start_with_mailer(mailer: RecordingMailer) -> Self {
        let root = tempfile::tempdir().expect("tempdir");
        let uploads_dir = root.path().join("uploads");
        std::fs::create_dir_all(&uploads_dir).expect("uploads dir");

        let mut config = Config::default();
        config.database.path = root.path().join("test.db").to_string_lossy().into_owned();
        config.storage.uploads_dir = uploads_dir.to_string_lossy().into_owned();
        config.jwt.secret = "integration-test-secret".to_string();
        config.server.max_upload_size = 1024 * 1024;

        let db = Database::new(&config.database.path).await.expect("open db");
        db.run_migrations().await.expect("migrations");
        AuthService::create_admin(&db, ADMIN_USER, ADMIN_PASSWORD)
            .await
            .expect("seed admin");

        let mailer = Arc::new(mailer);
        let state = AppState::new(db.clone(), Arc::new(config), mailer.clone());
        let app = create_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server");
        });

        Self {
            base_url: format!("http://{}", addr),
            client: reqwest::Client::new(),
            db,
            mailer,
            uploads_dir,
            _root: root,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn upload_exists(&self, name: &str) -> bool {
        self.uploads_dir.join(name).exists()
    }

    pub fn write_upload(&self, name: &str, bytes: &[u8]) {
        std::fs::write(self.uploads_dir.join(name), bytes).expect("write upload");
    }

    pub fn upload_count(&self) -> usize {
        std::fs::read_dir(&self.uploads_dir)
            .expect("read uploads")
            .count()
    }

    pub async fn login(&self) -> String {
        let res = self
            .client
            .post(self.url("/admin/login"))
            .json(&serde_json::json!({ "username": ADMIN_USER, "password": ADMIN_PASSWORD }))
            .send()
            .await
            .expect("login request");
        assert_eq!(res.status(), 200);
        let body: Value = res.json().await.expect("login body");
        body["token"].as_str().expect("token").to_string()
    }

    /// Send a multipart form with the given method and optional bearer token
    pub async fn send_form(
        &self,
        method: reqwest::Method,
        path: &str,
        token: Option<&str>,
        form: Form,
    ) -> reqwest::Response {
        let mut req = self.client.request(method, self.url(path)).multipart(form);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.expect("multipart request")
    }

    pub async fn get_json(&self, path: &str) -> (u16, Value) {
        let res = self.client.get(self.url(path)).send().await.expect("get");
        let status = res.status().as_u16();
        let body = res.json().await.unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn row_count(&self, table: &str) -> i64 {
        let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(self.db.pool())
            .await
            .expect("count rows");
        count
    }
}

/// A form with one file part plus text fields
pub fn file_form(field: &str, file_name: &str, mime: &str, bytes: &[u8], text: &[(&str, &str)]) -> Form {
    let part = Part::bytes(bytes.to_vec())
        .file_name(file_name.to_string())
        .mime_str(mime)
        .expect("mime");
    text.iter().fold(Form::new().part(field.to_string(), part), |form, (k, v)| {
        form.text(k.to_string(), v.to_string())
    })
}

pub fn text_form(text: &[(&str, &str)]) -> Form {
    text.iter().fold(Form::new(), |form, (k, v)| {
        form.text(k.to_string(), v.to_string())
    })
}
