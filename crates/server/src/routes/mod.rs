use serde::Deserialize;

use crate::error::ApiError;

pub mod auth;
pub mod editais;
pub mod health;
pub mod noticias;
pub mod patrimonio;
pub mod site;
pub mod uploads;

/// `?confirm=true` guard for destructive endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteConfirmation {
    pub confirm: Option<bool>,
}

impl DeleteConfirmation {
    pub fn require(&self) -> Result<(), ApiError> {
        if self.confirm == Some(true) {
            Ok(())
        } else {
            Err(ApiError::ConfirmationRequired)
        }
    }
}
