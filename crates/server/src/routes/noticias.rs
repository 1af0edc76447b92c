use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, patch},
};
use db::models::{
    noticia::{
        CAROUSEL_LIMIT, CreateNoticia, Noticia, NoticiaError, NoticiaFilter, PublicNoticia,
        UpdateNoticia,
    },
    pagination::{Page, PageRequest},
};
use deployment::Deployment;
use serde::Deserialize;
use utils_core::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl, error::ApiError, middleware::load_noticia_middleware,
    routes::DeleteConfirmation,
};

const MAX_CAROUSEL_LIMIT: u64 = 50;

#[derive(Debug, Default, Deserialize)]
pub struct NoticiaListQuery {
    pub search: Option<String>,
    pub ativo: Option<bool>,
    pub page: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CarouselQuery {
    pub limit: Option<u64>,
}

impl CarouselQuery {
    fn effective_limit(&self) -> u64 {
        self.limit
            .unwrap_or(CAROUSEL_LIMIT)
            .clamp(1, MAX_CAROUSEL_LIMIT)
    }
}

#[derive(Debug, Deserialize)]
pub struct SetAtivo {
    pub ativo: bool,
}

pub async fn get_noticias(
    State(deployment): State<DeploymentImpl>,
    Query(query): Query<NoticiaListQuery>,
) -> Result<ResponseJson<ApiResponse<Page<Noticia>>>, ApiError> {
    let filter = NoticiaFilter {
        search: query.search,
        ativo: query.ativo,
    };
    let request = PageRequest::new(query.page, deployment.page_size().await);
    let pool = deployment.db().pool.clone();
    let page = deployment
        .cache()
        .noticias_admin
        .get_or_load((filter.clone(), request), move || async move {
            Noticia::list_admin(&pool, &filter, request).await
        })
        .await?;
    Ok(ResponseJson(ApiResponse::success(page.as_ref().clone())))
}

pub async fn get_noticia(
    Extension(noticia): Extension<Noticia>,
) -> Result<ResponseJson<ApiResponse<Noticia>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(noticia)))
}

pub async fn create_noticia(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<CreateNoticia>,
) -> Result<ResponseJson<ApiResponse<Noticia>>, ApiError> {
    let noticia = Noticia::create(&deployment.db().pool, &payload, Uuid::new_v4()).await?;
    deployment.cache().invalidate_noticias();
    tracing::info!(noticia_id = %noticia.id, ativo = noticia.ativo, "Created noticia");
    Ok(ResponseJson(ApiResponse::success(noticia)))
}

pub async fn update_noticia(
    Extension(existing): Extension<Noticia>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<UpdateNoticia>,
) -> Result<ResponseJson<ApiResponse<Noticia>>, ApiError> {
    let noticia = Noticia::update(&deployment.db().pool, existing.id, &payload).await?;
    deployment.cache().invalidate_noticias();
    tracing::info!(noticia_id = %noticia.id, "Updated noticia");
    Ok(ResponseJson(ApiResponse::success(noticia)))
}

pub async fn set_noticia_ativo(
    Extension(existing): Extension<Noticia>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<SetAtivo>,
) -> Result<ResponseJson<ApiResponse<Noticia>>, ApiError> {
    let noticia = Noticia::set_ativo(&deployment.db().pool, existing.id, payload.ativo).await?;
    deployment.cache().invalidate_noticias();
    tracing::info!(noticia_id = %noticia.id, ativo = noticia.ativo, "Toggled noticia");
    Ok(ResponseJson(ApiResponse::success(noticia)))
}

pub async fn delete_noticia(
    Extension(existing): Extension<Noticia>,
    State(deployment): State<DeploymentImpl>,
    Query(confirmation): Query<DeleteConfirmation>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    confirmation.require()?;
    let rows_affected = Noticia::delete(&deployment.db().pool, existing.id).await?;
    if rows_affected == 0 {
        return Err(NoticiaError::NotFound.into());
    }
    deployment.cache().invalidate_noticias();
    tracing::info!(noticia_id = %existing.id, "Deleted noticia");
    Ok(ResponseJson(ApiResponse::success(())))
}

/// Carousel feed: newest active items first.
pub async fn get_public_noticias(
    State(deployment): State<DeploymentImpl>,
    Query(query): Query<CarouselQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<PublicNoticia>>>, ApiError> {
    let limit = query.effective_limit();
    let pool = deployment.db().pool.clone();
    let items = deployment
        .cache()
        .noticias_public
        .get_or_load(limit, move || async move {
            Noticia::list_active(&pool, limit)
                .await
                .map(|items| items.into_iter().map(Noticia::into_public).collect())
        })
        .await?;
    Ok(ResponseJson(ApiResponse::success(items.as_ref().clone())))
}

pub async fn get_public_noticia(
    State(deployment): State<DeploymentImpl>,
    Path(noticia_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<PublicNoticia>>, ApiError> {
    let noticia = Noticia::find_active_by_id(&deployment.db().pool, noticia_id)
        .await?
        .ok_or(NoticiaError::NotFound)?;
    Ok(ResponseJson(ApiResponse::success(noticia.into_public())))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let noticia_router = Router::new()
        .route(
            "/",
            get(get_noticia).put(update_noticia).delete(delete_noticia),
        )
        .route("/ativo", patch(set_noticia_ativo))
        .layer(from_fn_with_state(
            deployment.clone(),
            load_noticia_middleware::<DeploymentImpl>,
        ));

    let inner = Router::new()
        .route("/", get(get_noticias).post(create_noticia))
        .nest("/{noticia_id}", noticia_router);

    Router::new().nest("/noticias", inner)
}

pub fn public_router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/noticias", get(get_public_noticias))
        .route("/noticias/{noticia_id}", get(get_public_noticia))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carousel_limit_defaults_and_caps() {
        assert_eq!(CarouselQuery::default().effective_limit(), CAROUSEL_LIMIT);
        assert_eq!(CarouselQuery { limit: Some(3) }.effective_limit(), 3);
        assert_eq!(CarouselQuery { limit: Some(500) }.effective_limit(), 50);
        assert_eq!(CarouselQuery { limit: Some(0) }.effective_limit(), 1);
    }
}
