use std::sync::Arc;

use async_trait::async_trait;
use db::{DBService, DbErr};
use services::services::{
    auth::{AuthError, AuthService},
    config::{Config, ConfigError},
    query_cache::QueryCache,
    storage::ObjectStorage,
};
use thiserror::Error;
use tokio::sync::RwLock;
use utils_core::calendar::ReferenceClock;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait Deployment: Clone + Send + Sync + 'static {
    async fn new() -> Result<Self, DeploymentError>;

    fn config(&self) -> &Arc<RwLock<Config>>;

    fn db(&self) -> &DBService;

    fn auth(&self) -> &AuthService;

    fn storage(&self) -> &impl ObjectStorage;

    fn cache(&self) -> &QueryCache;

    /// Reference clock for the configured timezone.
    async fn clock(&self) -> ReferenceClock {
        self.config().read().await.clock()
    }

    async fn page_size(&self) -> u64 {
        self.config().read().await.page_size
    }
}
