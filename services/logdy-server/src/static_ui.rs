//! Serves the bundled web UI. With `embed-ui`, serves a `rust_embed`d SPA
//! build with a fallback to `index.html`; without it, a placeholder page.

#[cfg(feature = "embed-ui")]
use axum::http::header;
use axum::http::{Method, StatusCode, Uri};
#[cfg(not(feature = "embed-ui"))]
use axum::response::Html;
use axum::response::{IntoResponse, Response};
#[cfg(feature = "embed-ui")]
use std::path::Path;

#[cfg(feature = "embed-ui")]
#[derive(rust_embed::Embed)]
#[folder = "ui/dist"]
struct UiAssets;

pub async fn serve_ui(method: Method, uri: Uri) -> Response {
    let raw_path = uri.path();

    if raw_path.starts_with("/api/") || raw_path.starts_with("/ws") {
        return StatusCode::NOT_FOUND.into_response();
    }

    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let path = raw_path.trim_start_matches('/');

    #[cfg(feature = "embed-ui")]
    {
        if let Some(file) = UiAssets::get(path) {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            return (StatusCode::OK, [(header::CONTENT_TYPE, mime.as_ref())], file.data).into_response();
        }

        if Path::new(path).extension().is_none() {
            if let Some(index) = UiAssets::get("index.html") {
                return (StatusCode::OK, [(header::CONTENT_TYPE, "text/html")], index.data).into_response();
            }
        }

        StatusCode::NOT_FOUND.into_response()
    }

    #[cfg(not(feature = "embed-ui"))]
    {
        let _ = path;
        Html(
            "<html><body>\
             <h1>logdy UI not embedded</h1>\
             <p>Rebuild with <code>--features embed-ui</code> to include the web UI.</p>\
             </body></html>",
        )
        .into_response()
    }
}
