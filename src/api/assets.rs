//! Embedded browser page
//!
//! The files under `ui/` are compiled into the binary.

use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use rust_embed::Embed;

#[derive(Embed)]
#[folder = "ui"]
struct Assets;

/// Serve one embedded file under `/assets/`
pub async fn serve_static(Path(path): Path<String>) -> Response {
    let path = path.trim_start_matches('/');

    match Assets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref().to_string())],
                content.data.into_owned(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

/// The page itself
pub fn get_index_html() -> Option<String> {
    let content = Assets::get("index.html")?;
    String::from_utf8(content.data.into_owned()).ok()
}
