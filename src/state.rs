use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::ftp::{FileStore, FtpPool, SuppaFtpConnector};

/// Shared handles every handler can reach through `State<AppState>`
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub files: FileStore,
}

impl AppState {
    pub fn new(db: PgPool, files: FileStore) -> Self {
        Self { db, files }
    }

    /// Wire the FTP pool from config; no connection is opened until first use
    pub fn from_config(db: PgPool, config: &AppConfig) -> Self {
        let pool = FtpPool::new(
            SuppaFtpConnector::new(config.ftp.clone()),
            config.ftp.max_connections,
            config.ftp.acquire_timeout_secs.map(Duration::from_secs),
        );
        Self::new(db, FileStore::new(Arc::new(pool)))
    }
}
