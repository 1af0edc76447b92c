use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use rand::{Rng, distributions::Alphanumeric};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;
use ts_rs::TS;

use super::config::UploadConfig;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Tipo de arquivo não permitido: {0}")]
    UnsupportedType(String),
    #[error("Arquivo excede o limite de {limit} bytes")]
    TooLarge { limit: u64 },
    #[error("Arquivo vazio")]
    Empty,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Bucket {
    Editais,
    Noticias,
    Patrimonio,
}

impl Bucket {
    pub fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            Bucket::Editais => &["pdf"],
            Bucket::Noticias => &["jpg", "jpeg", "png", "webp", "gif"],
            Bucket::Patrimonio => &["jpg", "jpeg", "png", "webp"],
        }
    }

    pub fn max_bytes(&self, limits: &UploadConfig) -> u64 {
        match self {
            Bucket::Editais => limits.max_document_bytes,
            Bucket::Noticias | Bucket::Patrimonio => limits.max_image_bytes,
        }
    }

    fn object_prefix(&self) -> &'static str {
        match self {
            Bucket::Editais => "edital",
            Bucket::Noticias => "noticia",
            Bucket::Patrimonio => "bem",
        }
    }

    /// Lower-cased extension of `file_name` if this bucket accepts it.
    pub fn accepted_extension(&self, file_name: &str) -> Result<String, UploadError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        if self.allowed_extensions().contains(&extension.as_str()) {
            Ok(extension)
        } else {
            Err(UploadError::UnsupportedType(file_name.to_string()))
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct StoredObject {
    pub bucket: Bucket,
    pub name: String,
    pub url: String,
    pub size: u64,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put(
        &self,
        bucket: Bucket,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredObject, UploadError>;

    fn public_url(&self, bucket: Bucket, name: &str) -> String;
}

/// Bucketed files under a local directory, served by the HTTP layer at
/// `/storage/{bucket}/{name}`.
#[derive(Debug, Clone)]
pub struct LocalObjectStorage {
    root: PathBuf,
    public_base_url: Option<String>,
    limits: UploadConfig,
}

impl LocalObjectStorage {
    pub fn new(root: PathBuf, public_base_url: Option<String>, limits: UploadConfig) -> Self {
        Self {
            root,
            public_base_url,
            limits,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_name(bucket: Bucket, extension: &str) -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(8)
            .map(char::from)
            .collect::<String>()
            .to_ascii_lowercase();
        format!(
            "{}-{}-{}.{}",
            bucket.object_prefix(),
            Utc::now().timestamp_millis(),
            suffix,
            extension
        )
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn put(
        &self,
        bucket: Bucket,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<StoredObject, UploadError> {
        let extension = bucket.accepted_extension(original_name)?;
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        let limit = bucket.max_bytes(&self.limits);
        if bytes.len() as u64 > limit {
            return Err(UploadError::TooLarge { limit });
        }

        let dir = self.root.join(bucket.to_string());
        tokio::fs::create_dir_all(&dir).await?;
        let name = Self::object_name(bucket, &extension);
        tokio::fs::write(dir.join(&name), bytes).await?;

        tracing::info!(%bucket, name = %name, size = bytes.len(), "Stored upload");
        Ok(StoredObject {
            bucket,
            url: self.public_url(bucket, &name),
            name,
            size: bytes.len() as u64,
        })
    }

    fn public_url(&self, bucket: Bucket, name: &str) -> String {
        format!(
            "{}/storage/{}/{}",
            self.public_base_url.as_deref().unwrap_or(""),
            bucket,
            name
        )
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn storage(root: &Path) -> LocalObjectStorage {
        LocalObjectStorage::new(
            root.to_path_buf(),
            None,
            UploadConfig {
                max_document_bytes: 16,
                max_image_bytes: 8,
            },
        )
    }

    #[test]
    fn buckets_parse_and_filter_extensions() {
        assert_eq!(Bucket::from_str("editais").unwrap(), Bucket::Editais);
        assert!(Bucket::from_str("outros").is_err());
        assert_eq!(Bucket::Editais.accepted_extension("Edital.PDF").unwrap(), "pdf");
        assert!(Bucket::Editais.accepted_extension("edital.docx").is_err());
        assert!(Bucket::Noticias.accepted_extension("capa.gif").is_ok());
        assert!(Bucket::Patrimonio.accepted_extension("foto.gif").is_err());
        assert!(Bucket::Patrimonio.accepted_extension("sem_extensao").is_err());
    }

    #[tokio::test]
    async fn put_writes_file_and_returns_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path());

        let stored = storage
            .put(Bucket::Editais, "chamada.pdf", b"%PDF-1.7")
            .await
            .unwrap();

        assert!(stored.name.starts_with("edital-"));
        assert!(stored.name.ends_with(".pdf"));
        assert_eq!(stored.url, format!("/storage/editais/{}", stored.name));
        let written = std::fs::read(dir.path().join("editais").join(&stored.name)).unwrap();
        assert_eq!(written, b"%PDF-1.7");
    }

    #[tokio::test]
    async fn put_enforces_bucket_limits() {
        let dir = tempfile::tempdir().unwrap();
        let storage = storage(dir.path());

        let too_large = storage
            .put(Bucket::Patrimonio, "foto.png", &[0u8; 9])
            .await
            .unwrap_err();
        assert!(matches!(too_large, UploadError::TooLarge { limit: 8 }));

        let empty = storage.put(Bucket::Noticias, "capa.png", &[]).await.unwrap_err();
        assert!(matches!(empty, UploadError::Empty));

        let with_base = LocalObjectStorage::new(
            dir.path().to_path_buf(),
            Some("https://caritas.example.org".to_string()),
            UploadConfig::default(),
        );
        assert_eq!(
            with_base.public_url(Bucket::Noticias, "noticia-1.png"),
            "https://caritas.example.org/storage/noticias/noticia-1.png"
        );
    }
}
