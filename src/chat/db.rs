//! Database queries for conversations, messages and document indexes

use anyhow::{Error, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_rusqlite::Connection;

use crate::llm::Message;

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Conversation {
    pub id: String,
    pub name: String,
    pub index_id: Option<String>,
    pub created_at: String,
    pub messages: Vec<Message>,
}

#[derive(Clone, Serialize, Debug)]
pub struct ConversationSummary {
    pub id: String,
    pub name: String,
    pub index_id: Option<String>,
    pub created_at: String,
}

/// A named document collection associated with a conversation, used
/// to scope chat queries and suggested questions.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct DocIndex {
    pub id: String,
    pub name: String,
    pub questions: Vec<String>,
    pub created_at: String,
}

/// Rows that fail to map are skipped with a warning so one corrupt
/// row doesn't take down a whole listing
fn ok_or_warn<T>(row: rusqlite::Result<T>, what: &str) -> Option<T> {
    match row {
        Ok(row) => Some(row),
        Err(e) => {
            tracing::warn!("Skipping unreadable {} row: {}", what, e);
            None
        }
    }
}

pub async fn create_conversation(
    db: &Connection,
    id: &str,
    name: &str,
) -> Result<Conversation, Error> {
    let conversation = Conversation {
        id: id.to_owned(),
        name: name.to_owned(),
        index_id: None,
        created_at: Utc::now().to_rfc3339(),
        messages: vec![],
    };
    let row = conversation.clone();
    db.call(move |conn| {
        conn.execute(
            "INSERT OR IGNORE INTO conversation (id, name, created_at) VALUES (?, ?, ?)",
            [&row.id, &row.name, &row.created_at],
        )?;
        Ok(())
    })
    .await?;
    Ok(conversation)
}

pub async fn list_conversations(db: &Connection) -> Result<Vec<ConversationSummary>, Error> {
    let rows = db
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, index_id, created_at FROM conversation ORDER BY created_at",
            )?;
            let rows = stmt
                .query_map([], |i| {
                    Ok(ConversationSummary {
                        id: i.get(0)?,
                        name: i.get(1)?,
                        index_id: i.get(2)?,
                        created_at: i.get(3)?,
                    })
                })?
                .filter_map(|row| ok_or_warn(row, "conversation"))
                .collect::<Vec<ConversationSummary>>();
            Ok(rows)
        })
        .await?;
    Ok(rows)
}

pub async fn find_conversation(
    db: &Connection,
    id: &str,
) -> Result<Option<Conversation>, Error> {
    let conversation_id = id.to_owned();
    let result = db
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, index_id, created_at FROM conversation WHERE id = ?",
            )?;
            let mut rows = stmt
                .query_map([&conversation_id], |i| {
                    Ok(ConversationSummary {
                        id: i.get(0)?,
                        name: i.get(1)?,
                        index_id: i.get(2)?,
                        created_at: i.get(3)?,
                    })
                })?
                .filter_map(|row| ok_or_warn(row, "conversation"));
            let Some(summary) = rows.next() else {
                return Ok(None);
            };

            let mut stmt = conn.prepare(
                "SELECT data FROM message WHERE conversation_id = ? ORDER BY position",
            )?;
            let messages = stmt
                .query_map([&conversation_id], |i| {
                    let data: String = i.get(0)?;
                    Ok(data)
                })?
                .filter_map(|row| ok_or_warn(row, "message"))
                .filter_map(|data| match serde_json::from_str::<Message>(&data) {
                    Ok(msg) => Some(msg),
                    Err(e) => {
                        tracing::warn!("Skipping corrupt message data: {}", e);
                        None
                    }
                })
                .collect::<Vec<Message>>();

            Ok(Some(Conversation {
                id: summary.id,
                name: summary.name,
                index_id: summary.index_id,
                created_at: summary.created_at,
                messages,
            }))
        })
        .await?;
    Ok(result)
}

/// Append a message at the end of the conversation's ordered message
/// list. Returns the position it was written at.
pub async fn append_message(
    db: &Connection,
    conversation_id: &str,
    msg: &Message,
) -> Result<usize, Error> {
    let c_id = conversation_id.to_owned();
    let data = json!(msg).to_string();
    let position = db
        .call(move |conn| {
            let position: i64 = conn.query_row(
                "SELECT COALESCE(MAX(position) + 1, 0) FROM message WHERE conversation_id = ?",
                [&c_id],
                |row| row.get(0),
            )?;
            conn.execute(
                "INSERT INTO message (conversation_id, position, data) VALUES (?, ?, ?)",
                [&c_id, &position.to_string(), &data],
            )?;
            Ok(position)
        })
        .await?;
    Ok(position as usize)
}

/// Replace the message at a position in place. Returns false when no
/// message exists at that position.
pub async fn replace_message(
    db: &Connection,
    conversation_id: &str,
    position: usize,
    msg: &Message,
) -> Result<bool, Error> {
    let c_id = conversation_id.to_owned();
    let data = json!(msg).to_string();
    let updated = db
        .call(move |conn| {
            let updated = conn.execute(
                "UPDATE message SET data = ? WHERE conversation_id = ? AND position = ?",
                [&data, &c_id, &position.to_string()],
            )?;
            Ok(updated)
        })
        .await?;
    Ok(updated > 0)
}

pub async fn clear_messages(db: &Connection, conversation_id: &str) -> Result<(), Error> {
    let c_id = conversation_id.to_owned();
    db.call(move |conn| {
        conn.execute("DELETE FROM message WHERE conversation_id = ?", [&c_id])?;
        Ok(())
    })
    .await?;
    Ok(())
}

pub async fn set_conversation_index(
    db: &Connection,
    conversation_id: &str,
    index_id: &str,
) -> Result<bool, Error> {
    let c_id = conversation_id.to_owned();
    let i_id = index_id.to_owned();
    let updated = db
        .call(move |conn| {
            let updated = conn.execute(
                "UPDATE conversation SET index_id = ? WHERE id = ?",
                [&i_id, &c_id],
            )?;
            Ok(updated)
        })
        .await?;
    Ok(updated > 0)
}

pub async fn delete_conversation(db: &Connection, id: &str) -> Result<bool, Error> {
    let c_id = id.to_owned();
    let deleted = db
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM message WHERE conversation_id = ?", [&c_id])?;
            let deleted = tx.execute("DELETE FROM conversation WHERE id = ?", [&c_id])?;
            tx.commit()?;
            Ok(deleted)
        })
        .await?;
    Ok(deleted > 0)
}

pub async fn delete_all_conversations(db: &Connection) -> Result<(), Error> {
    db.call(|conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM message", [])?;
        tx.execute("DELETE FROM conversation", [])?;
        tx.commit()?;
        Ok(())
    })
    .await?;
    Ok(())
}

pub async fn create_index(
    db: &Connection,
    id: &str,
    name: &str,
    questions: &[String],
) -> Result<DocIndex, Error> {
    let index = DocIndex {
        id: id.to_owned(),
        name: name.to_owned(),
        questions: questions.to_vec(),
        created_at: Utc::now().to_rfc3339(),
    };
    let row = index.clone();
    db.call(move |conn| {
        conn.execute(
            "INSERT OR REPLACE INTO doc_index (id, name, questions, created_at) VALUES (?, ?, ?, ?)",
            [
                &row.id,
                &row.name,
                &json!(row.questions).to_string(),
                &row.created_at,
            ],
        )?;
        Ok(())
    })
    .await?;
    Ok(index)
}

pub async fn list_indexes(db: &Connection) -> Result<Vec<DocIndex>, Error> {
    let rows = db
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, questions, created_at FROM doc_index ORDER BY created_at",
            )?;
            let rows = stmt
                .query_map([], |i| {
                    let questions: String = i.get(2)?;
                    Ok(DocIndex {
                        id: i.get(0)?,
                        name: i.get(1)?,
                        questions: serde_json::from_str(&questions).unwrap_or_default(),
                        created_at: i.get(3)?,
                    })
                })?
                .filter_map(|row| ok_or_warn(row, "index"))
                .collect::<Vec<DocIndex>>();
            Ok(rows)
        })
        .await?;
    Ok(rows)
}

pub async fn find_index(db: &Connection, id: &str) -> Result<Option<DocIndex>, Error> {
    let index_id = id.to_owned();
    let result = db
        .call(move |conn| {
            let mut stmt = conn
                .prepare("SELECT id, name, questions, created_at FROM doc_index WHERE id = ?")?;
            let row = stmt
                .query_map([&index_id], |i| {
                    let questions: String = i.get(2)?;
                    Ok(DocIndex {
                        id: i.get(0)?,
                        name: i.get(1)?,
                        questions: serde_json::from_str(&questions).unwrap_or_default(),
                        created_at: i.get(3)?,
                    })
                })?
                .filter_map(|row| ok_or_warn(row, "index"))
                .next();
            Ok(row)
        })
        .await?;
    Ok(result)
}

pub async fn delete_index(db: &Connection, id: &str) -> Result<bool, Error> {
    let index_id = id.to_owned();
    let deleted = db
        .call(move |conn| {
            let deleted = conn.execute("DELETE FROM doc_index WHERE id = ?", [&index_id])?;
            Ok(deleted)
        })
        .await?;
    Ok(deleted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::initialize_db;
    use crate::llm::Role;

    async fn test_db() -> Connection {
        let db = Connection::open_in_memory().await.unwrap();
        db.call(|conn| {
            initialize_db(conn).expect("Failed to initialize db schema");
            Ok(())
        })
        .await
        .unwrap();
        db
    }

    #[tokio::test]
    async fn test_find_conversation_skips_corrupt_message_rows() {
        let db = test_db().await;
        create_conversation(&db, "c1", "test").await.unwrap();
        append_message(&db, "c1", &Message::new(Role::User, "hi"))
            .await
            .unwrap();

        // A row whose data isn't valid message JSON
        db.call(|conn| {
            conn.execute(
                "INSERT INTO message (conversation_id, position, data) VALUES ('c1', 1, 'not json')",
                [],
            )?;
            Ok(())
        })
        .await
        .unwrap();

        append_message(&db, "c1", &Message::new(Role::Assistant, "hello"))
            .await
            .unwrap();

        let conversation = find_conversation(&db, "c1").await.unwrap().unwrap();
        assert_eq!(conversation.messages.len(), 2);
        assert_eq!(conversation.messages[0].content, "hi");
        assert_eq!(conversation.messages[1].content, "hello");
    }
}
