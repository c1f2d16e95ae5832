//! Recent-chat bookmarks: one row per (owner, peer) pair.

use rusqlite::params;

use crate::database::{date_now, Database};
use crate::error::{Result, StoreError};
use crate::models::RecentChat;

impl Database {
    /// Bookmark a conversation for `owner`.  Duplicate pairs are suppressed.
    pub fn add_recent_chat(&self, owner: &str, peer: &str) -> Result<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO recent_chats (owner, peer, last_opened)
             VALUES (?1, ?2, ?3)",
            params![owner, peer, date_now()],
        )?;
        Ok(())
    }

    /// Bookmarks for `owner`, newest first.
    pub fn list_recent_chats(&self, owner: &str) -> Result<Vec<RecentChat>> {
        let mut stmt = self.conn().prepare(
            "SELECT owner, peer, last_opened FROM recent_chats
             WHERE owner = ?1
             ORDER BY rowid DESC",
        )?;

        let rows = stmt.query_map(params![owner], |row| {
            Ok(RecentChat {
                owner: row.get(0)?,
                peer: row.get(1)?,
                last_opened: row.get(2)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Remove a bookmark.  Removing a pair that was never added is still
    /// success.
    pub fn remove_recent_chat(&self, owner: &str, peer: &str) -> Result<()> {
        self.conn().execute(
            "DELETE FROM recent_chats WHERE owner = ?1 AND peer = ?2",
            params![owner, peer],
        )?;
        Ok(())
    }
}
