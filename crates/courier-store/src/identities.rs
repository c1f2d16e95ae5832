//! Reads over the identities table, plus the insert hook the auth
//! collaborator calls after a successful signup.
//!
//! Username uniqueness and credential validation live at that (external)
//! signup boundary; this module trusts what it is given.

use rusqlite::params;

use crate::database::{timestamp_now, Database};
use crate::error::{Result, StoreError};
use crate::friends::derive_relation;
use crate::models::IdentityMatch;

impl Database {
    /// Register an identity and seed its presence record (offline).
    ///
    /// Idempotent: re-registering an existing username changes nothing.
    pub fn create_identity(&self, username: &str) -> Result<()> {
        let now = timestamp_now();

        self.conn().execute(
            "INSERT OR IGNORE INTO identities (username, created_at) VALUES (?1, ?2)",
            params![username, now],
        )?;

        // Presence exists from signup on; only explicit presence calls
        // mutate it afterwards.
        self.conn().execute(
            "INSERT OR IGNORE INTO presence (identity, is_online, last_seen)
             VALUES (?1, 0, ?2)",
            params![username, now],
        )?;

        Ok(())
    }

    /// Case-insensitive substring search over all identities, excluding the
    /// searcher, each hit paired with its derived relationship status.
    pub fn search_identities(&self, viewer: &str, query: &str) -> Result<Vec<IdentityMatch>> {
        let mut stmt = self.conn().prepare(
            "SELECT username FROM identities
             WHERE LOWER(username) LIKE '%' || LOWER(?2) || '%' AND username != ?1
             ORDER BY username ASC",
        )?;

        let rows = stmt.query_map(params![viewer, query], |row| row.get::<_, String>(0))?;
        let names = rows
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)?;

        // One edge fetch for the viewer covers every hit.
        let edges = self.edges_for(viewer)?;

        Ok(names
            .into_iter()
            .map(|username| {
                let status = derive_relation(viewer, &username, &edges);
                IdentityMatch { username, status }
            })
            .collect())
    }
}
