use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use utils_assets::database_path;

pub mod entities;
pub mod models;
mod retry;
pub mod types;

pub use sea_orm::{DbErr, TransactionTrait};

pub type DbPool = DatabaseConnection;

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

#[derive(Clone)]
pub struct DBService {
    pub pool: DbPool,
}

fn default_database_url() -> String {
    format!("sqlite://{}?mode=rwc", database_path().to_string_lossy())
}

impl DBService {
    /// Connects to `DATABASE_URL` (falling back to the SQLite file in the
    /// asset directory) and brings the schema up to date.
    pub async fn new() -> Result<DBService, DbErr> {
        let database_url = std::env::var(DATABASE_URL_ENV)
            .ok()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(default_database_url);
        Self::connect(&database_url).await
    }

    pub async fn connect(database_url: &str) -> Result<DBService, DbErr> {
        let mut options = ConnectOptions::new(database_url.to_string());
        options
            .connect_timeout(Duration::from_secs(30))
            .acquire_timeout(Duration::from_secs(30))
            .sqlx_logging(false);

        let pool = Database::connect(options).await?;
        db_migration::Migrator::up(&pool, None).await?;
        tracing::debug!(backend = ?pool.get_database_backend(), "Database ready");
        Ok(DBService { pool })
    }
}
