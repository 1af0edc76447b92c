use std::future::Future;

use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use db::{
    DBService, DbErr,
    models::{
        bem_patrimonial::{BemError, BemPatrimonial},
        edital::{Edital, EditalError},
        noticia::{Noticia, NoticiaError},
    },
};
use deployment::Deployment;
use uuid::Uuid;

use crate::error::ApiError;

pub trait ModelLoaderDeps {
    fn db_service(&self) -> &DBService;
}

impl<D> ModelLoaderDeps for D
where
    D: Deployment,
{
    fn db_service(&self) -> &DBService {
        self.db()
    }
}

/// Resolves the row behind `/{id}` or the error the handler would have
/// produced for it.
async fn resolve_row<M, Fut, F>(
    kind: &'static str,
    id: Uuid,
    lookup: Fut,
    missing: F,
) -> Result<M, ApiError>
where
    Fut: Future<Output = Result<Option<M>, DbErr>>,
    F: FnOnce() -> ApiError,
{
    match lookup.await {
        Ok(Some(row)) => Ok(row),
        Ok(None) => {
            tracing::debug!(%id, "{kind} not found");
            Err(missing())
        }
        Err(err) => {
            tracing::error!(%id, "Failed to load {kind}: {err}");
            Err(ApiError::Database(err))
        }
    }
}

async fn attach_row<M, Fut>(
    mut request: Request,
    next: Next,
    kind: &'static str,
    id: Uuid,
    lookup: Fut,
    missing: impl FnOnce() -> ApiError,
) -> Result<Response, ApiError>
where
    M: Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<M>, DbErr>>,
{
    let row = resolve_row(kind, id, lookup, missing).await?;
    request.extensions_mut().insert(row);
    Ok(next.run(request).await)
}

pub async fn load_edital_middleware<S>(
    State(deployment): State<S>,
    Path(edital_id): Path<Uuid>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    S: ModelLoaderDeps,
{
    let lookup = Edital::find_by_id(&deployment.db_service().pool, edital_id);
    attach_row(request, next, "edital", edital_id, lookup, || {
        EditalError::NotFound.into()
    })
    .await
}

pub async fn load_noticia_middleware<S>(
    State(deployment): State<S>,
    Path(noticia_id): Path<Uuid>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    S: ModelLoaderDeps,
{
    let lookup = Noticia::find_by_id(&deployment.db_service().pool, noticia_id);
    attach_row(request, next, "noticia", noticia_id, lookup, || {
        NoticiaError::NotFound.into()
    })
    .await
}

pub async fn load_bem_middleware<S>(
    State(deployment): State<S>,
    Path(bem_id): Path<Uuid>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    S: ModelLoaderDeps,
{
    let lookup = BemPatrimonial::find_by_id(&deployment.db_service().pool, bem_id);
    attach_row(request, next, "bem patrimonial", bem_id, lookup, || {
        BemError::NotFound.into()
    })
    .await
}

#[cfg(test)]
mod tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use super::*;

    #[tokio::test]
    async fn missing_row_uses_domain_not_found() {
        let err = resolve_row::<u32, _, _>("edital", Uuid::nil(), async { Ok(None) }, || {
            EditalError::NotFound.into()
        })
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Edital(EditalError::NotFound)));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn lookup_failure_is_a_database_error() {
        let err = resolve_row::<u32, _, _>(
            "noticia",
            Uuid::nil(),
            async { Err(DbErr::Custom("boom".to_string())) },
            || NoticiaError::NotFound.into(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
