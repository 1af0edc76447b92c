use axum::{
    Json, Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post},
};
use deployment::Deployment;
use services::services::{
    config::SiteConfig,
    contact::{ContactLink, ContactMessage, whatsapp_link},
};
use utils_core::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

pub async fn get_site(
    State(deployment): State<DeploymentImpl>,
) -> ResponseJson<ApiResponse<SiteConfig>> {
    let site = deployment.config().read().await.site.clone();
    ResponseJson(ApiResponse::success(site))
}

pub async fn create_contact_link(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<ContactMessage>,
) -> Result<ResponseJson<ApiResponse<ContactLink>>, ApiError> {
    let site = deployment.config().read().await.site.clone();
    let link = whatsapp_link(&site, &payload)?;
    tracing::debug!("Composed contact link");
    Ok(ResponseJson(ApiResponse::success(link)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/site", get(get_site))
        .route("/contact/link", post(create_contact_link))
}
