use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tokio_rusqlite::Connection;

use crate::core::AppConfig;

pub struct AppState {
    pub db: Connection,
    pub config: AppConfig,
    // Shared "stop generating" flag. Set by the stop endpoint,
    // cleared when a new stream starts, polled between stream reads.
    pub stop_streaming: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(db: Connection, config: AppConfig) -> Self {
        Self {
            db,
            config,
            stop_streaming: Arc::new(AtomicBool::new(false)),
        }
    }
}
