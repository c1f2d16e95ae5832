//! Presence records: coarse online/offline plus last-seen.
//!
//! Deliberately decoupled from the relay's connection lifecycle -- a
//! channel closing never touches these rows.  Only explicit presence calls
//! do.

use rusqlite::{params, OptionalExtension};

use crate::database::{timestamp_now, Database};
use crate::error::Result;
use crate::models::PresenceRecord;

impl Database {
    /// Upsert the presence record, stamping `last_seen` with the current
    /// time.
    pub fn set_presence(&self, identity: &str, online: bool) -> Result<PresenceRecord> {
        let last_seen = timestamp_now();

        self.conn().execute(
            "INSERT INTO presence (identity, is_online, last_seen)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(identity) DO UPDATE
             SET is_online = excluded.is_online, last_seen = excluded.last_seen",
            params![identity, online, last_seen],
        )?;

        Ok(PresenceRecord {
            identity: identity.to_string(),
            is_online: online,
            last_seen,
        })
    }

    /// Fetch the presence record, if one exists.
    pub fn get_presence(&self, identity: &str) -> Result<Option<PresenceRecord>> {
        let record = self
            .conn()
            .query_row(
                "SELECT identity, is_online, last_seen FROM presence WHERE identity = ?1",
                params![identity],
                |row| {
                    Ok(PresenceRecord {
                        identity: row.get(0)?,
                        is_online: row.get(1)?,
                        last_seen: row.get(2)?,
                    })
                },
            )
            .optional()?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> (Database, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("test.db")).unwrap();
        (db, dir)
    }

    #[test]
    fn set_creates_then_updates() {
        let (db, _dir) = test_db();

        let online = db.set_presence("alice", true).unwrap();
        assert!(online.is_online);

        let offline = db.set_presence("alice", false).unwrap();
        assert!(!offline.is_online);

        let fetched = db.get_presence("alice").unwrap().unwrap();
        assert_eq!(fetched, offline);
    }

    #[test]
    fn unknown_identity_is_absent() {
        let (db, _dir) = test_db();
        assert!(db.get_presence("ghost").unwrap().is_none());
    }
}
