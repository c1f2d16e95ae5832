//! The append-only message log.
//!
//! Ids come from `INTEGER PRIMARY KEY AUTOINCREMENT`: assignment is atomic
//! on the connection, strictly increasing, and never reused, which defines
//! a total order over all messages regardless of participant pair.

use rusqlite::params;

use crate::database::{timestamp_now, Database};
use crate::error::{Result, StoreError};
use crate::models::{MessageKind, StoredMessage};

impl Database {
    /// Append a message to the log, assigning the next id and stamping the
    /// server-side timestamp.
    pub fn append_message(
        &self,
        sender: &str,
        receiver: &str,
        kind: MessageKind,
        payload: &str,
    ) -> Result<StoredMessage> {
        let timestamp = timestamp_now();

        self.conn().execute(
            "INSERT INTO messages (sender, receiver, kind, payload, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![sender, receiver, kind.as_str(), payload, timestamp],
        )?;

        let id = self.conn().last_insert_rowid();

        Ok(StoredMessage {
            id,
            sender: sender.to_string(),
            receiver: receiver.to_string(),
            kind,
            payload: payload.to_string(),
            timestamp,
        })
    }

    /// Page through the conversation between `a` and `b` (either direction).
    ///
    /// Pagination walks backward from the newest message (`ORDER BY id DESC`
    /// with `offset`), but each page is returned oldest-first so callers can
    /// render it top-to-bottom.  No matching messages yields an empty page,
    /// not an error.
    pub fn page_conversation(
        &self,
        a: &str,
        b: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<StoredMessage>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, sender, receiver, kind, payload, timestamp
             FROM messages
             WHERE (sender = ?1 AND receiver = ?2) OR (sender = ?2 AND receiver = ?1)
             ORDER BY id DESC
             LIMIT ?3 OFFSET ?4",
        )?;

        let rows = stmt.query_map(params![a, b, limit, offset], row_to_message)?;

        let mut page = rows
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)?;
        page.reverse();
        Ok(page)
    }
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredMessage> {
    let kind_str: String = row.get(3)?;
    let kind = match kind_str.as_str() {
        "text" => MessageKind::Text,
        "media" => MessageKind::Media,
        other => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                format!("unknown message kind '{other}'").into(),
            ))
        }
    };

    Ok(StoredMessage {
        id: row.get(0)?,
        sender: row.get(1)?,
        receiver: row.get(2)?,
        kind,
        payload: row.get(4)?,
        timestamp: row.get(5)?,
    })
}
