pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod mailer;
pub mod middleware;
pub mod models;
pub mod services;
pub mod static_files;
pub mod storage;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Database;
use crate::mailer::Mailer;
use crate::models::{AboutEntry, HomeEntry};
use crate::services::SlotLocks;
use crate::storage::LocalStorage;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub storage: Arc<LocalStorage>,
    pub mailer: Arc<dyn Mailer>,
    pub content_locks: Arc<SlotLocks>,
}

impl AppState {
    pub fn new(db: Database, config: Arc<Config>, mailer: Arc<dyn Mailer>) -> Self {
        let storage = Arc::new(LocalStorage::new(&config.storage.uploads_dir));
        Self {
            db,
            config,
            storage,
            mailer,
            content_locks: Arc::new(SlotLocks::new()),
        }
    }
}

/// Multipart bodies carry text fields next to the file
const FORM_OVERHEAD_BYTES: u64 = 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    let cors = match config.server.cors_origin.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => CorsLayer::new().allow_origin(AllowOrigin::exact(origin)),
        Some(Err(e)) => {
            tracing::warn!("Ignoring invalid CORS origin: {}", e);
            CorsLayer::new().allow_origin(Any)
        }
        None => CorsLayer::new().allow_origin(Any),
    }
    .allow_methods(Any)
    .allow_headers(Any);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api", get(handlers::welcome))
        .route("/api/home", get(handlers::content::get_current::<HomeEntry>))
        .route("/api/about", get(handlers::content::get_current::<AboutEntry>))
        .route("/api/resources", get(handlers::resource::list_resources))
        .route("/api/resources/:id", get(handlers::resource::get_resource))
        .route("/api/contact", post(handlers::contact::submit_contact))
        .route("/admin/login", post(handlers::admin::login));

    // Admin routes (bearer token required)
    let admin_routes = Router::new()
        .route("/api/home", post(handlers::content::upsert::<HomeEntry>))
        .route(
            "/api/home/:id",
            put(handlers::content::update::<HomeEntry>).delete(handlers::content::delete::<HomeEntry>),
        )
        .route("/api/about", post(handlers::content::upsert::<AboutEntry>))
        .route(
            "/api/about/:id",
            put(handlers::content::update::<AboutEntry>).delete(handlers::content::delete::<AboutEntry>),
        )
        .route("/api/resources", post(handlers::resource::create_resource))
        .route(
            "/api/resources/:id",
            put(handlers::resource::update_resource).delete(handlers::resource::delete_resource),
        )
        .route("/admin/upload", post(handlers::admin::upload))
        .route("/admin/files", get(handlers::admin::list_files))
        .route("/admin/text", post(handlers::admin::create_text))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_admin,
        ));

    let body_limit = (config.server.max_upload_size + FORM_OVERHEAD_BYTES) as usize;

    let router = Router::new()
        .merge(public_routes)
        .merge(admin_routes)
        .nest_service(
            "/uploads",
            static_files::uploads_service(&config.storage.uploads_dir),
        );

    let router = with_frontend(router, &config);

    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(not(feature = "embed-frontend"))]
fn with_frontend(router: Router<AppState>, config: &Config) -> Router<AppState> {
    match config.server.frontend_dir.as_deref() {
        Some(dist) => {
            tracing::info!("Serving frontend from {}", dist);
            router.fallback_service(static_files::spa_service(dist))
        }
        None => router,
    }
}

#[cfg(feature = "embed-frontend")]
fn with_frontend(router: Router<AppState>, _config: &Config) -> Router<AppState> {
    router
        .route("/", get(static_files::embedded::spa_root_handler))
        .route("/*path", get(static_files::embedded::spa_handler))
}
