use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::{
    models::{
        edital::{
            CreateEdital, Edital, EditalFilter, PublicEdital, StatusOptions, UpdateEdital,
            status_options,
        },
        pagination::{Page, PageRequest},
    },
    types::EditalStatus,
};
use deployment::Deployment;
use serde::Deserialize;
use utils_core::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl, error::ApiError, middleware::load_edital_middleware,
    routes::DeleteConfirmation,
};

#[derive(Debug, Default, Deserialize)]
pub struct EditalListQuery {
    pub search: Option<String>,
    pub status: Option<EditalStatus>,
    pub page: Option<u64>,
}

impl EditalListQuery {
    fn into_parts(self, page_size: u64) -> (EditalFilter, PageRequest) {
        (
            EditalFilter {
                search: self.search,
                status: self.status,
            },
            PageRequest::new(self.page, page_size),
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusOptionsQuery {
    pub status: Option<EditalStatus>,
    pub data_finalizacao: Option<String>,
}

pub async fn get_editais(
    State(deployment): State<DeploymentImpl>,
    Query(query): Query<EditalListQuery>,
) -> Result<ResponseJson<ApiResponse<Page<Edital>>>, ApiError> {
    let today = deployment.clock().await.today();
    let (filter, request) = query.into_parts(deployment.page_size().await);
    let pool = deployment.db().pool.clone();
    let page = deployment
        .cache()
        .editais_admin
        .get_or_load((filter.clone(), request, today), move || async move {
            Edital::list_admin(&pool, &filter, request, today).await
        })
        .await?;
    Ok(ResponseJson(ApiResponse::success(page.as_ref().clone())))
}

pub async fn get_edital(
    State(deployment): State<DeploymentImpl>,
    Extension(edital): Extension<Edital>,
) -> Result<ResponseJson<ApiResponse<Edital>>, ApiError> {
    let today = deployment.clock().await.today();
    Ok(ResponseJson(ApiResponse::success(edital.derived(today))))
}

pub async fn create_edital(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<CreateEdital>,
) -> Result<ResponseJson<ApiResponse<Edital>>, ApiError> {
    let today = deployment.clock().await.today();
    let edital = Edital::create(&deployment.db().pool, &payload, Uuid::new_v4(), today).await?;
    deployment.cache().invalidate_editais();
    tracing::info!(edital_id = %edital.id, status = %edital.status, "Created edital");
    Ok(ResponseJson(ApiResponse::success(edital)))
}

pub async fn update_edital(
    Extension(existing): Extension<Edital>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<UpdateEdital>,
) -> Result<ResponseJson<ApiResponse<Edital>>, ApiError> {
    let today = deployment.clock().await.today();
    let edital = Edital::update(&deployment.db().pool, existing.id, &payload, today).await?;
    deployment.cache().invalidate_editais();
    tracing::info!(edital_id = %edital.id, status = %edital.status, "Updated edital");
    Ok(ResponseJson(ApiResponse::success(edital)))
}

pub async fn delete_edital(
    Extension(existing): Extension<Edital>,
    State(deployment): State<DeploymentImpl>,
    Query(confirmation): Query<DeleteConfirmation>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    confirmation.require()?;
    let rows_affected = Edital::delete(&deployment.db().pool, existing.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Edital não encontrado.".to_string()));
    }
    deployment.cache().invalidate_editais();
    tracing::info!(edital_id = %existing.id, "Deleted edital");
    Ok(ResponseJson(ApiResponse::success(())))
}

/// Statuses an editor may pick for the given deadline today, plus how the
/// chosen one would be displayed. A missing or malformed date counts as no
/// deadline.
pub async fn get_status_options(
    State(deployment): State<DeploymentImpl>,
    Query(query): Query<StatusOptionsQuery>,
) -> ResponseJson<ApiResponse<StatusOptions>> {
    let today = deployment.clock().await.today();
    ResponseJson(ApiResponse::success(status_options(
        query.status,
        query.data_finalizacao.as_deref(),
        today,
    )))
}

pub async fn get_public_editais(
    State(deployment): State<DeploymentImpl>,
    Query(query): Query<EditalListQuery>,
) -> Result<ResponseJson<ApiResponse<Page<PublicEdital>>>, ApiError> {
    let today = deployment.clock().await.today();
    let (filter, request) = query.into_parts(deployment.page_size().await);
    let pool = deployment.db().pool.clone();
    let page = deployment
        .cache()
        .editais_public
        .get_or_load((filter.clone(), request, today), move || async move {
            Edital::list_public(&pool, &filter, request, today).await
        })
        .await?;
    Ok(ResponseJson(ApiResponse::success(page.as_ref().clone())))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let edital_router = Router::new()
        .route(
            "/",
            get(get_edital).put(update_edital).delete(delete_edital),
        )
        .layer(from_fn_with_state(
            deployment.clone(),
            load_edital_middleware::<DeploymentImpl>,
        ));

    let inner = Router::new()
        .route("/", get(get_editais).post(create_edital))
        .route("/status-options", get(get_status_options))
        .nest("/{edital_id}", edital_router);

    Router::new().nest("/editais", inner)
}

pub fn public_router() -> Router<DeploymentImpl> {
    Router::new().route("/editais", get(get_public_editais))
}
