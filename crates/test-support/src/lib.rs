use std::{
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard, OnceLock},
};

use tempfile::TempDir;

const ASSET_DIR_ENV: &str = "CARITAS_ASSET_DIR";
const DATABASE_URL_ENV: &str = "DATABASE_URL";

pub fn test_lock() -> &'static Mutex<()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
}

/// Points the asset directory and database at a fresh temporary root for the
/// lifetime of the guard, restoring the previous environment on drop.
pub struct TestEnvGuard {
    root: TempDir,
    prev_database_url: Option<String>,
    prev_asset_dir: Option<String>,
    _lock: MutexGuard<'static, ()>,
}

impl TestEnvGuard {
    pub fn new() -> Self {
        let lock = test_lock().lock().unwrap_or_else(|err| err.into_inner());
        let root = tempfile::Builder::new()
            .prefix("caritas-test-")
            .tempdir()
            .expect("create temporary asset root");
        let db_url = format!(
            "sqlite://{}?mode=rwc",
            root.path().join("db.sqlite").to_string_lossy()
        );
        let prev_database_url = std::env::var(DATABASE_URL_ENV).ok();
        let prev_asset_dir = std::env::var(ASSET_DIR_ENV).ok();

        // SAFETY: tests using TestEnvGuard are serialized by test_lock.
        unsafe {
            std::env::set_var(ASSET_DIR_ENV, root.path());
            std::env::set_var(DATABASE_URL_ENV, db_url);
        }

        Self {
            root,
            prev_database_url,
            prev_asset_dir,
            _lock: lock,
        }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.root.path().join("storage")
    }
}

impl Default for TestEnvGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TestEnvGuard {
    fn drop(&mut self) {
        // SAFETY: tests using TestEnvGuard are serialized by test_lock.
        unsafe {
            match &self.prev_database_url {
                Some(value) => std::env::set_var(DATABASE_URL_ENV, value),
                None => std::env::remove_var(DATABASE_URL_ENV),
            }
            match &self.prev_asset_dir {
                Some(value) => std::env::set_var(ASSET_DIR_ENV, value),
                None => std::env::remove_var(ASSET_DIR_ENV),
            }
        }
    }
}
