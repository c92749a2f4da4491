//! Database connection and schema setup

use anyhow::{Error, Result};
use rusqlite::Connection;
use tokio_rusqlite::Connection as AsyncConnection;

/// Open the sqlite database used for conversations and document
/// indexes. The path is a directory, the file name is fixed.
pub async fn async_db(db_path: &str) -> Result<AsyncConnection, Error> {
    let db = AsyncConnection::open(format!("{}/docchat.sqlite3", db_path)).await?;
    Ok(db)
}

/// Create tables if they don't already exist. Safe to run more than
/// once.
pub fn initialize_db(conn: &mut Connection) -> Result<(), Error> {
    let tx = conn.transaction()?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS conversation (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            index_id TEXT,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // Messages are stored as JSON blobs ordered by position within a
    // conversation. Edits update a row in place, they never reorder.
    tx.execute(
        "CREATE TABLE IF NOT EXISTS message (
            conversation_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            data TEXT NOT NULL,
            PRIMARY KEY (conversation_id, position)
        )",
        [],
    )?;

    tx.execute(
        "CREATE TABLE IF NOT EXISTS doc_index (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            questions TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    tx.commit()?;
    Ok(())
}
