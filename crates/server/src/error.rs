use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::{
    DbErr,
    models::{
        bem_patrimonial::BemError,
        edital::EditalError,
        movimentacao::MovimentacaoError,
        noticia::NoticiaError,
        validation::{FieldError, ValidationErrors},
    },
};
use deployment::DeploymentError;
use services::services::{auth::AuthError, config::ConfigError, storage::UploadError};
use thiserror::Error;
use utils_core::response::ApiResponse;

#[derive(Debug, Error, ts_rs::TS)]
#[ts(type = "string")]
pub enum ApiError {
    #[error(transparent)]
    Edital(#[from] EditalError),
    #[error(transparent)]
    Noticia(#[from] NoticiaError),
    #[error(transparent)]
    Bem(#[from] BemError),
    #[error(transparent)]
    Movimentacao(#[from] MovimentacaoError),
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Deployment(#[from] DeploymentError),
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Confirmation required")]
    ConfirmationRequired,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<&'static str> for ApiError {
    fn from(msg: &'static str) -> Self {
        ApiError::BadRequest(msg.to_string())
    }
}

impl ApiError {
    fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Edital(err) => match err {
                EditalError::NotFound => (StatusCode::NOT_FOUND, "EditalError"),
                EditalError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "ValidationError"),
                EditalError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "EditalError"),
            },
            ApiError::Noticia(err) => match err {
                NoticiaError::NotFound => (StatusCode::NOT_FOUND, "NoticiaError"),
                NoticiaError::Validation(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "ValidationError")
                }
                NoticiaError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "NoticiaError"),
            },
            ApiError::Bem(err) => match err {
                BemError::NotFound => (StatusCode::NOT_FOUND, "BemError"),
                BemError::DuplicateTombamento(_) => (StatusCode::CONFLICT, "BemError"),
                BemError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "ValidationError"),
                BemError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "BemError"),
            },
            ApiError::Movimentacao(err) => match err {
                MovimentacaoError::BemNotFound => (StatusCode::NOT_FOUND, "MovimentacaoError"),
                MovimentacaoError::Validation(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "ValidationError")
                }
                MovimentacaoError::Database(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "MovimentacaoError")
                }
            },
            ApiError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "ValidationError"),
            ApiError::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::SessionNotFound => {
                    (StatusCode::UNAUTHORIZED, "AuthError")
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "AuthError"),
            },
            ApiError::Upload(err) => match err {
                UploadError::UnsupportedType(_) => {
                    (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UploadError")
                }
                UploadError::TooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "UploadError"),
                UploadError::Empty => (StatusCode::BAD_REQUEST, "UploadError"),
                UploadError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "UploadError"),
            },
            ApiError::Deployment(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DeploymentError"),
            ApiError::Database(db_err) => match db_err {
                DbErr::RecordNotFound(_) => (StatusCode::NOT_FOUND, "DatabaseError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
            },
            ApiError::Config(err) => match err {
                ConfigError::ValidationError(_) => (StatusCode::BAD_REQUEST, "ConfigError"),
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "ConfigError"),
            },
            ApiError::Multipart(_) => (StatusCode::BAD_REQUEST, "MultipartError"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IoError"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::ConfirmationRequired => {
                (StatusCode::PRECONDITION_REQUIRED, "ConfirmationRequired")
            }
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
        }
    }

    fn field_errors(&self) -> Option<&[FieldError]> {
        let errors = match self {
            ApiError::Validation(errors)
            | ApiError::Edital(EditalError::Validation(errors))
            | ApiError::Noticia(NoticiaError::Validation(errors))
            | ApiError::Bem(BemError::Validation(errors))
            | ApiError::Movimentacao(MovimentacaoError::Validation(errors)) => errors,
            _ => return None,
        };
        Some(&errors.errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = self.status_and_type();

        let error_message = match &self {
            ApiError::Edital(EditalError::NotFound) => "Edital não encontrado.".to_string(),
            ApiError::Noticia(NoticiaError::NotFound) => "Notícia não encontrada.".to_string(),
            ApiError::Bem(BemError::NotFound)
            | ApiError::Movimentacao(MovimentacaoError::BemNotFound) => {
                "Bem patrimonial não encontrado.".to_string()
            }
            ApiError::Bem(BemError::DuplicateTombamento(tombamento)) => {
                format!("O número de tombamento {tombamento} já está cadastrado.")
            }
            ApiError::Auth(AuthError::InvalidCredentials) => "Email ou senha inválidos.".to_string(),
            ApiError::Auth(AuthError::SessionNotFound) | ApiError::Unauthorized => {
                "Sessão expirada. Entre novamente.".to_string()
            }
            ApiError::Upload(
                err @ (UploadError::UnsupportedType(_)
                | UploadError::TooLarge { .. }
                | UploadError::Empty),
            ) => err.to_string(),
            ApiError::Multipart(_) => {
                "Falha ao enviar o arquivo. Verifique o arquivo e tente novamente.".to_string()
            }
            ApiError::ConfirmationRequired => {
                "Confirme a exclusão com confirm=true.".to_string()
            }
            ApiError::NotFound(msg) | ApiError::Internal(msg) | ApiError::BadRequest(msg) => {
                msg.clone()
            }
            _ if self.field_errors().is_some() => "Verifique os campos informados.".to_string(),
            _ => format!("{}: {}", error_type, self),
        };

        if status_code.is_server_error() {
            tracing::error!(
                status = %status_code,
                error_type,
                error = %self,
                "API request failed"
            );
        }

        if let Some(fields) = self.field_errors() {
            let response =
                ApiResponse::<(), Vec<FieldError>>::error_with_data(&error_message, fields.to_vec());
            return (status_code, Json(response)).into_response();
        }
        let response = ApiResponse::<()>::error(&error_message);
        (status_code, Json(response)).into_response()
    }
}
