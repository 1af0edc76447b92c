use std::str::FromStr;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    response::Json as ResponseJson,
    routing::post,
};
use deployment::Deployment;
use services::services::storage::{Bucket, ObjectStorage, StoredObject, UploadError};
use utils_core::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

/// Transport ceiling for multipart bodies. Per-bucket limits are enforced by
/// the storage backend.
const UPLOAD_BODY_LIMIT: usize = 64 * 1024 * 1024;
const FILE_FIELD: &str = "file";

pub async fn upload_file(
    State(deployment): State<DeploymentImpl>,
    Path(bucket): Path<String>,
    mut multipart: Multipart,
) -> Result<ResponseJson<ApiResponse<StoredObject>>, ApiError> {
    let bucket = Bucket::from_str(&bucket)
        .map_err(|_| ApiError::NotFound(format!("Destino de upload desconhecido: {bucket}")))?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        let stored = deployment
            .storage()
            .put(bucket, &file_name, &bytes)
            .await?;
        return Ok(ResponseJson(ApiResponse::success(stored)));
    }

    Err(UploadError::Empty.into())
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/uploads/{bucket}", post(upload_file))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}
