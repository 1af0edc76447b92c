use std::fmt;

use serde::Serialize;
use ts_rs::TS;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Field-level rejections collected while checking an editor payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|error| error.field == field)
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    pub fn require_min_chars(&mut self, field: &str, value: &str, min: usize, message: &str) {
        if value.trim().chars().count() < min {
            self.push(field, message);
        }
    }

    /// Accepts absolute http(s) URLs and site-relative paths such as the
    /// ones returned by the local object store.
    pub fn optional_link(&mut self, field: &str, value: Option<&str>) {
        let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
            return;
        };
        if !is_link(value) {
            self.push(field, "URL inválida");
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.errors.iter().map(|e| e.field.as_str()).collect();
        write!(f, "Invalid fields: {}", fields.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

pub fn is_link(value: &str) -> bool {
    if value.starts_with('/') && !value.starts_with("//") {
        return true;
    }
    Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false)
}

/// Trims and collapses blank strings to `None`.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_field_messages() {
        let mut errors = ValidationErrors::new();
        errors.require_min_chars("nome", " ab ", 3, "Nome é obrigatório");
        errors.optional_link("documento_url", Some("not a url"));
        errors.optional_link("url", Some(""));
        errors.optional_link("foto_url", None);

        assert!(errors.has_field("nome"));
        assert!(errors.has_field("documento_url"));
        assert!(!errors.has_field("url"));
        assert_eq!(errors.to_string(), "Invalid fields: nome, documento_url");
        assert!(errors.into_result().is_err());
    }

    #[test]
    fn links_accept_absolute_and_storage_paths() {
        assert!(is_link("https://example.com/doc.pdf"));
        assert!(is_link("/storage/editais/edital-1.pdf"));
        assert!(!is_link("//example.com"));
        assert!(!is_link("ftp://example.com/file"));
        assert!(!is_link("example.com"));
    }

    #[test]
    fn non_blank_trims() {
        assert_eq!(non_blank(Some("  x ")), Some("x".to_string()));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(None), None);
    }
}
