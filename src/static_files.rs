use tower_http::services::{ServeDir, ServeFile};

/// Serve uploaded media under /uploads
pub fn uploads_service(uploads_dir: &str) -> ServeDir {
    ServeDir::new(uploads_dir)
}

/// Serve the built SPA from disk, falling back to index.html so client-side
/// routes resolve
pub fn spa_service(dist: &str) -> ServeDir<ServeFile> {
    let index = std::path::Path::new(dist).join("index.html");
    ServeDir::new(dist).fallback(ServeFile::new(index))
}

#[cfg(feature = "embed-frontend")]
pub mod embedded {
    use axum::{
        body::Body,
        extract::Path,
        http::{header, HeaderValue, StatusCode},
        response::{IntoResponse, Response},
    };
    use include_dir::{include_dir, Dir};
    use mime_guess::MimeGuess;

    static FRONTEND_DIST: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/frontend/dist");

    fn cache_control_for(path: &str) -> HeaderValue {
        if path == "index.html" {
            HeaderValue::from_static("no-store")
        } else if path.starts_with("assets/") {
            HeaderValue::from_static("public, max-age=31536000, immutable")
        } else {
            HeaderValue::from_static("public, max-age=3600")
        }
    }

    fn build_response(path: &str, bytes: &'static [u8]) -> Response {
        let mime = MimeGuess::from_path(path).first_or_octet_stream();
        let content_type = HeaderValue::from_str(mime.as_ref())
            .unwrap_or(HeaderValue::from_static("application/octet-stream"));
        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type),
                (header::CACHE_CONTROL, cache_control_for(path)),
            ],
            Body::from(bytes),
        )
            .into_response()
    }

    fn index() -> Response {
        match FRONTEND_DIST.get_file("index.html") {
            Some(file) => build_response("index.html", file.contents()),
            None => StatusCode::NOT_FOUND.into_response(),
        }
    }

    pub async fn spa_handler(Path(path): Path<String>) -> Response {
        let req_path = path.trim_start_matches('/');
        if req_path.is_empty() {
            return index();
        }

        if let Some(file) = FRONTEND_DIST.get_file(req_path) {
            return build_response(req_path, file.contents());
        }

        // Missing assets are real 404s; anything else is a client route
        if req_path.contains('.') {
            return StatusCode::NOT_FOUND.into_response();
        }

        index()
    }

    pub async fn spa_root_handler() -> Response {
        index()
    }
}
