//! The friendship graph: a directed-edge state machine over identity pairs.
//!
//! Per ordered pair the states are `None`, `Pending(from -> to)`, and
//! `Friend`.  The graph itself does not enforce pair uniqueness -- repeated
//! requests insert additional rows, and every operation works on "any
//! matching edge" rather than assuming one.

use rusqlite::params;

use crate::database::{date_now, Database};
use crate::error::{Result, StoreError};
use crate::models::{EdgeStatus, FriendEdge, RelationStatus};

impl Database {
    /// Record a friend request: inserts `Pending(requester -> target)`.
    ///
    /// No existing-edge check is made; duplicate requests coexist.
    pub fn request_friend(&self, requester: &str, target: &str) -> Result<()> {
        self.conn().execute(
            "INSERT INTO friend_edges (from_identity, to_identity, status, date)
             VALUES (?1, ?2, 'pending', ?3)",
            params![requester, target, date_now()],
        )?;
        Ok(())
    }

    /// Flip every pending `(requester -> acceptor)` edge to `Friend`,
    /// re-stamping the date.
    ///
    /// Zero matching rows is still success: callers cannot distinguish
    /// "accepted" from "nothing to accept".
    pub fn accept_friend(&self, acceptor: &str, requester: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE friend_edges
             SET status = 'friend', date = ?3
             WHERE from_identity = ?1 AND to_identity = ?2 AND status = 'pending'",
            params![requester, acceptor, date_now()],
        )?;
        Ok(())
    }

    /// Delete every edge between the two identities, both directions, any
    /// status.
    pub fn unfriend(&self, a: &str, b: &str) -> Result<()> {
        self.conn().execute(
            "DELETE FROM friend_edges
             WHERE (from_identity = ?1 AND to_identity = ?2)
                OR (from_identity = ?2 AND to_identity = ?1)",
            params![a, b],
        )?;
        Ok(())
    }

    /// All edges touching `identity`, in either direction.
    pub fn edges_for(&self, identity: &str) -> Result<Vec<FriendEdge>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, from_identity, to_identity, status, date
             FROM friend_edges
             WHERE from_identity = ?1 OR to_identity = ?1
             ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(params![identity], row_to_edge)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// All edges between `a` and `b`, in either direction.
    pub fn edges_between(&self, a: &str, b: &str) -> Result<Vec<FriendEdge>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, from_identity, to_identity, status, date
             FROM friend_edges
             WHERE (from_identity = ?1 AND to_identity = ?2)
                OR (from_identity = ?2 AND to_identity = ?1)
             ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(params![a, b], row_to_edge)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// The relationship between `viewer` and `other`, derived from both
    /// edge directions.
    pub fn relation_status(&self, viewer: &str, other: &str) -> Result<RelationStatus> {
        let edges = self.edges_between(viewer, other)?;
        Ok(derive_relation(viewer, other, &edges))
    }

    /// Identities `viewer` is friends with, deduplicated and sorted.
    pub fn list_friends(&self, viewer: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn().prepare(
            "SELECT DISTINCT
                 CASE WHEN from_identity = ?1 THEN to_identity ELSE from_identity END AS peer
             FROM friend_edges
             WHERE (from_identity = ?1 OR to_identity = ?1) AND status = 'friend'
             ORDER BY peer ASC",
        )?;

        let rows = stmt.query_map(params![viewer], |row| row.get(0))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Incoming pending edges: requests awaiting `identity`'s decision.
    pub fn list_pending_incoming(&self, identity: &str) -> Result<Vec<FriendEdge>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, from_identity, to_identity, status, date
             FROM friend_edges
             WHERE to_identity = ?1 AND status = 'pending'
             ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(params![identity], row_to_edge)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }
}

/// Project both edge directions onto a single pairwise status.
///
/// Precedence: `CanAccept > PendingSent > Friend > None`.  Mutual
/// simultaneous requests therefore surface as `CanAccept` on both sides,
/// so either party can resolve the pair.
pub fn derive_relation(viewer: &str, other: &str, edges: &[FriendEdge]) -> RelationStatus {
    let pending = |from: &str, to: &str| {
        edges
            .iter()
            .any(|e| e.from == from && e.to == to && e.status == EdgeStatus::Pending)
    };

    if pending(other, viewer) {
        return RelationStatus::CanAccept;
    }
    if pending(viewer, other) {
        return RelationStatus::PendingSent;
    }

    let friends = edges.iter().any(|e| {
        e.status == EdgeStatus::Friend
            && ((e.from == viewer && e.to == other) || (e.from == other && e.to == viewer))
    });

    if friends {
        RelationStatus::Friend
    } else {
        RelationStatus::None
    }
}

fn row_to_edge(row: &rusqlite::Row<'_>) -> rusqlite::Result<FriendEdge> {
    let status_str: String = row.get(3)?;
    let status = match status_str.as_str() {
        "pending" => EdgeStatus::Pending,
        "friend" => EdgeStatus::Friend,
        other => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                format!("unknown edge status '{other}'").into(),
            ))
        }
    };

    Ok(FriendEdge {
        id: row.get(0)?,
        from: row.get(1)?,
        to: row.get(2)?,
        status,
        date: row.get(4)?,
    })
}
