use axum::{Router, middleware::from_fn_with_state, routing::get};
use tower_http::{services::ServeDir, trace::TraceLayer};
use utils_assets::storage_dir;

use crate::{DeploymentImpl, routes};

pub mod auth;
mod frontend;

pub fn router(deployment: DeploymentImpl) -> Router {
    let admin_routes = Router::new()
        .merge(routes::editais::router(&deployment))
        .merge(routes::noticias::router(&deployment))
        .merge(routes::patrimonio::router(&deployment))
        .merge(routes::uploads::router())
        .layer(from_fn_with_state(
            deployment.clone(),
            auth::require_admin_session,
        ));

    let api_routes = Router::new()
        .merge(routes::site::router())
        .merge(routes::editais::public_router())
        .merge(routes::noticias::public_router())
        .merge(routes::auth::router(&deployment))
        .nest("/admin", admin_routes);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/", get(frontend::serve_frontend_root))
        .route("/{*path}", get(frontend::serve_frontend))
        .nest("/api", api_routes)
        .nest_service("/storage", ServeDir::new(storage_dir()))
        .layer(TraceLayer::new_for_http())
        .with_state(deployment)
}
