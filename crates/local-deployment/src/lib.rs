use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use db::DBService;
use deployment::{Deployment, DeploymentError};
use services::services::{
    auth::AuthService,
    config::{Config, load_config_from_file, save_config_to_file},
    query_cache::QueryCache,
    storage::{LocalObjectStorage, ObjectStorage},
};
use tokio::sync::RwLock;
use utils_assets::{config_path, storage_dir};

const ADMIN_EMAIL_ENV: &str = "ADMIN_EMAIL";
const ADMIN_PASSWORD_ENV: &str = "ADMIN_PASSWORD";

#[derive(Clone)]
pub struct LocalDeployment {
    config: Arc<RwLock<Config>>,
    db: DBService,
    auth: AuthService,
    storage: LocalObjectStorage,
    cache: QueryCache,
}

#[async_trait]
impl Deployment for LocalDeployment {
    async fn new() -> Result<Self, DeploymentError> {
        let config = Self::load_runtime_config().await?;
        let snapshot = config.read().await.clone();

        let db = DBService::new().await?;
        let auth = AuthService::new(db.pool.clone(), snapshot.auth.session_ttl_hours);
        Self::bootstrap_admin(&auth).await?;
        Self::spawn_session_sweeper(
            auth.clone(),
            Duration::from_secs(snapshot.auth.sweep_interval_secs),
        );

        let storage = LocalObjectStorage::new(
            storage_dir(),
            snapshot.public_base_url.clone(),
            snapshot.uploads.clone(),
        );
        let cache = QueryCache::new(&snapshot.cache);

        Ok(Self {
            config,
            db,
            auth,
            storage,
            cache,
        })
    }

    fn config(&self) -> &Arc<RwLock<Config>> {
        &self.config
    }

    fn db(&self) -> &DBService {
        &self.db
    }

    fn auth(&self) -> &AuthService {
        &self.auth
    }

    fn storage(&self) -> &impl ObjectStorage {
        &self.storage
    }

    fn cache(&self) -> &QueryCache {
        &self.cache
    }
}

impl LocalDeployment {
    async fn load_runtime_config() -> Result<Arc<RwLock<Config>>, DeploymentError> {
        let raw_config = load_config_from_file(&config_path()).await;
        save_config_to_file(&raw_config, &config_path()).await?;
        Ok(Arc::new(RwLock::new(raw_config)))
    }

    async fn bootstrap_admin(auth: &AuthService) -> Result<(), DeploymentError> {
        let Some((email, password)) = bootstrap_credentials_with(|name| std::env::var(name).ok())
        else {
            return Ok(());
        };
        auth.ensure_bootstrap_admin(&email, &password).await?;
        Ok(())
    }

    fn spawn_session_sweeper(auth: AuthService, interval: Duration) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(err) = auth.expire_stale().await {
                    tracing::warn!(error = %err, "Session sweep failed");
                }
            }
        });
    }

    pub async fn log_cache_settings(&self) {
        let config = self.config.read().await;
        tracing::info!(
            max_entries = config.cache.max_entries,
            ttl_secs = config.cache.ttl_secs,
            "Query cache budget"
        );
        tracing::info!(
            session_ttl_hours = config.auth.session_ttl_hours,
            sweep_interval_secs = config.auth.sweep_interval_secs,
            timezone = %config.timezone,
            "Session settings"
        );
    }
}

/// Admin credentials to seed an empty store with, when both are set.
fn bootstrap_credentials_with<F>(get_env: F) -> Option<(String, String)>
where
    F: Fn(&str) -> Option<String>,
{
    let email = get_env(ADMIN_EMAIL_ENV)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())?;
    let password = get_env(ADMIN_PASSWORD_ENV).filter(|value| !value.is_empty())?;
    Some((email, password))
}
