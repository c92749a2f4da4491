use anyhow::Result;
use std::fs;

use crate::core::AppConfig;
use crate::core::db::{async_db, initialize_db};

/// Create the storage layout and database schema
pub async fn run() -> Result<()> {
    let config = AppConfig::default();

    fs::create_dir_all(&config.upload_path)?;
    fs::create_dir_all(&config.db_path)?;

    let db = async_db(&config.db_path).await?;
    db.call(|conn| {
        initialize_db(conn).expect("Failed to initialize db schema");
        Ok(())
    })
    .await?;

    println!("Initialized storage at {}", config.storage_path);
    Ok(())
}
