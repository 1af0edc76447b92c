use std::path::{Component, Path, PathBuf};

use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, Uri, header},
    response::{IntoResponse, Redirect, Response},
};
use utils_assets::frontend_dir;

const HASHED_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";
const DEFAULT_CACHE_CONTROL: &str = "public, max-age=300";
const INDEX_CACHE_CONTROL: &str = "no-cache";
const ADMIN_HOME: &str = "/admin/editais";

/// Client-side routes rendered by `index.html`.
const APP_ROUTES: &[&str] = &[
    "/",
    "/editais",
    "/login",
    "/admin/editais",
    "/admin/noticias",
    "/admin/patrimonio",
    "/admin/patrimonio/relatorio",
];

/// Prefixes followed by exactly one id segment.
const APP_DETAIL_PREFIXES: &[&str] = &["/admin/patrimonio/", "/noticia/"];

fn normalize_route(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

fn is_app_route(path: &str) -> bool {
    let path = normalize_route(path);
    APP_ROUTES.contains(&path)
        || APP_DETAIL_PREFIXES.iter().any(|prefix| {
            path.strip_prefix(prefix)
                .is_some_and(|id| !id.is_empty() && !id.contains('/'))
        })
}

fn cache_control_for_path(path: &str) -> &'static str {
    if is_hashed_asset(path) {
        HASHED_CACHE_CONTROL
    } else {
        DEFAULT_CACHE_CONTROL
    }
}

fn is_hashed_asset(path: &str) -> bool {
    let Some(file_name) = Path::new(path).file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    let stem = file_name.split('.').next().unwrap_or(file_name);
    let Some((_, hash)) = stem.rsplit_once('-') else {
        return false;
    };
    hash.len() >= 8 && hash.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Relative file path inside the frontend directory, if the request path
/// stays inside it.
fn static_file_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = request_path.trim_start_matches('/');
    if relative.is_empty() {
        return None;
    }
    let relative = Path::new(relative);
    if !relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)))
    {
        return None;
    }
    Some(root.join(relative))
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "404 Not Found").into_response()
}

fn file_response(bytes: Vec<u8>, path: &Path, cache_control: &'static str) -> Response {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    let mut response = Response::new(Body::from(bytes));
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(cache_control),
    );
    response
}

async fn serve_index() -> Response {
    let index = frontend_dir().join("index.html");
    match tokio::fs::read(&index).await {
        Ok(bytes) => file_response(bytes, &index, INDEX_CACHE_CONTROL),
        Err(err) => {
            tracing::warn!(path = %index.display(), error = %err, "Frontend build not found");
            not_found()
        }
    }
}

pub async fn serve_frontend_root() -> Response {
    serve_index().await
}

pub async fn serve_frontend(uri: Uri) -> Response {
    let path = uri.path();
    if normalize_route(path) == "/admin" {
        return Redirect::temporary(ADMIN_HOME).into_response();
    }
    if is_app_route(path) {
        return serve_index().await;
    }

    let Some(file) = static_file_path(&frontend_dir(), path) else {
        return not_found();
    };
    match tokio::fs::read(&file).await {
        Ok(bytes) => file_response(bytes, &file, cache_control_for_path(path)),
        Err(_) => not_found(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_hashed_assets() {
        assert!(is_hashed_asset("/assets/index-3f9a2b1c.js"));
        assert!(is_hashed_asset("assets/logo-ABCDEF12.svg"));
        assert!(!is_hashed_asset("/favicon.ico"));
        assert!(!is_hashed_asset("/assets/index-abc.js"));
        assert!(!is_hashed_asset("/assets/logo-caritas.png"));
    }

    #[test]
    fn cache_control_depends_on_hash() {
        assert_eq!(
            cache_control_for_path("/assets/index-3f9a2b1c.js"),
            HASHED_CACHE_CONTROL
        );
        assert_eq!(cache_control_for_path("/robots.txt"), DEFAULT_CACHE_CONTROL);
    }

    #[test]
    fn app_routes_cover_detail_pages() {
        for path in [
            "/",
            "/editais",
            "/editais/",
            "/login",
            "/admin/noticias",
            "/admin/patrimonio/relatorio",
            "/admin/patrimonio/7f1c",
            "/noticia/abc",
        ] {
            assert!(is_app_route(path), "{path} should be an app route");
        }
        for path in ["/noticia", "/noticia/a/b", "/admin/usuarios", "/sobre"] {
            assert!(!is_app_route(path), "{path} should not be an app route");
        }
    }

    #[test]
    fn static_paths_stay_inside_root() {
        let root = Path::new("/srv/frontend");
        assert_eq!(
            static_file_path(root, "/assets/app.js"),
            Some(root.join("assets/app.js"))
        );
        assert_eq!(static_file_path(root, "/../secret"), None);
        assert_eq!(static_file_path(root, "/"), None);
    }
}
