use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::{
    models::{
        bem_patrimonial::{
            BemError, BemFilter, BemPatrimonial, CreateBem, RelatorioFilter, RelatorioPatrimonio,
            UpdateBem,
        },
        movimentacao::{Movimentacao, MovimentacaoRegistrada, RegisterMovimentacao},
        pagination::{Page, PageRequest},
    },
    types::EstadoBem,
};
use deployment::Deployment;
use serde::Deserialize;
use utils_core::response::ApiResponse;
use uuid::Uuid;

use crate::{
    DeploymentImpl, error::ApiError, middleware::load_bem_middleware, routes::DeleteConfirmation,
};

#[derive(Debug, Default, Deserialize)]
pub struct BemListQuery {
    pub search: Option<String>,
    pub estado: Option<EstadoBem>,
    pub page: Option<u64>,
}

pub async fn get_bens(
    State(deployment): State<DeploymentImpl>,
    Query(query): Query<BemListQuery>,
) -> Result<ResponseJson<ApiResponse<Page<BemPatrimonial>>>, ApiError> {
    let filter = BemFilter {
        search: query.search,
        estado: query.estado,
    };
    let request = PageRequest::new(query.page, deployment.page_size().await);
    let pool = deployment.db().pool.clone();
    let page = deployment
        .cache()
        .bens
        .get_or_load((filter.clone(), request), move || async move {
            BemPatrimonial::list(&pool, &filter, request).await
        })
        .await?;
    Ok(ResponseJson(ApiResponse::success(page.as_ref().clone())))
}

pub async fn get_bem(
    Extension(bem): Extension<BemPatrimonial>,
) -> Result<ResponseJson<ApiResponse<BemPatrimonial>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(bem)))
}

pub async fn create_bem(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<CreateBem>,
) -> Result<ResponseJson<ApiResponse<BemPatrimonial>>, ApiError> {
    let bem = BemPatrimonial::create(&deployment.db().pool, &payload, Uuid::new_v4()).await?;
    deployment.cache().invalidate_bens();
    tracing::info!(
        bem_id = %bem.id,
        tombamento = %bem.numero_tombamento,
        "Created bem patrimonial"
    );
    Ok(ResponseJson(ApiResponse::success(bem)))
}

pub async fn update_bem(
    Extension(existing): Extension<BemPatrimonial>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<UpdateBem>,
) -> Result<ResponseJson<ApiResponse<BemPatrimonial>>, ApiError> {
    let bem = BemPatrimonial::update(&deployment.db().pool, existing.id, &payload).await?;
    deployment.cache().invalidate_bens();
    tracing::info!(bem_id = %bem.id, "Updated bem patrimonial");
    Ok(ResponseJson(ApiResponse::success(bem)))
}

pub async fn delete_bem(
    Extension(existing): Extension<BemPatrimonial>,
    State(deployment): State<DeploymentImpl>,
    Query(confirmation): Query<DeleteConfirmation>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    confirmation.require()?;
    let rows_affected = BemPatrimonial::delete(&deployment.db().pool, existing.id).await?;
    if rows_affected == 0 {
        return Err(BemError::NotFound.into());
    }
    deployment.cache().invalidate_bens();
    tracing::info!(bem_id = %existing.id, "Deleted bem patrimonial");
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn get_movimentacoes(
    Extension(bem): Extension<BemPatrimonial>,
    State(deployment): State<DeploymentImpl>,
) -> Result<ResponseJson<ApiResponse<Vec<Movimentacao>>>, ApiError> {
    let history = Movimentacao::list_for_bem(&deployment.db().pool, bem.id).await?;
    Ok(ResponseJson(ApiResponse::success(history)))
}

pub async fn register_movimentacao(
    Extension(bem): Extension<BemPatrimonial>,
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<RegisterMovimentacao>,
) -> Result<ResponseJson<ApiResponse<MovimentacaoRegistrada>>, ApiError> {
    let today = deployment.clock().await.today();
    let registered = Movimentacao::register(
        &deployment.db().pool,
        bem.id,
        &payload,
        Uuid::new_v4(),
        today,
    )
    .await?;
    deployment.cache().invalidate_bens();
    tracing::info!(
        bem_id = %bem.id,
        movimentacao_id = %registered.movimentacao.id,
        setor = %registered.movimentacao.setor,
        "Registered movimentacao"
    );
    Ok(ResponseJson(ApiResponse::success(registered)))
}

pub async fn get_relatorio(
    State(deployment): State<DeploymentImpl>,
    Query(filter): Query<RelatorioFilter>,
) -> Result<ResponseJson<ApiResponse<RelatorioPatrimonio>>, ApiError> {
    let relatorio = BemPatrimonial::relatorio(&deployment.db().pool, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(relatorio)))
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    let bem_router = Router::new()
        .route("/", get(get_bem).put(update_bem).delete(delete_bem))
        .route(
            "/movimentacoes",
            get(get_movimentacoes).post(register_movimentacao),
        )
        .layer(from_fn_with_state(
            deployment.clone(),
            load_bem_middleware::<DeploymentImpl>,
        ));

    let inner = Router::new()
        .route("/", get(get_bens).post(create_bem))
        .nest("/{bem_id}", bem_router);

    Router::new()
        .nest("/bens", inner)
        .route("/relatorio", get(get_relatorio))
}
