use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::errors::AppError;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(conn: Connection, config: AppConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            config,
        }
    }

    /// Locks the shared connection for the duration of one operation.
    pub fn conn(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.db
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("database mutex poisoned")))
    }
}
