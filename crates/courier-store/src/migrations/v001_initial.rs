//! v001 -- Initial schema creation.
//!
//! Creates the five core tables: `identities`, `friend_edges`,
//! `recent_chats`, `messages`, and `presence`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Identities
-- ----------------------------------------------------------------
-- Owned by the signup boundary; courier only reads it (search) and
-- provides an insert hook for the auth collaborator.
CREATE TABLE IF NOT EXISTS identities (
    username   TEXT PRIMARY KEY NOT NULL,
    created_at TEXT NOT NULL                 -- "YYYY-MM-DD HH:MM:SS" (UTC)
);

-- ----------------------------------------------------------------
-- Friend edges
-- ----------------------------------------------------------------
-- Directed: a pending edge records who asked whom.  No UNIQUE constraint
-- on the pair; duplicate requests produce additional rows.
CREATE TABLE IF NOT EXISTS friend_edges (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    from_identity TEXT NOT NULL,
    to_identity   TEXT NOT NULL,
    status        TEXT NOT NULL,             -- 'pending' | 'friend'
    date          TEXT NOT NULL              -- "YYYY-MM-DD" (UTC)
);

CREATE INDEX IF NOT EXISTS idx_friend_edges_pair
    ON friend_edges(from_identity, to_identity);
CREATE INDEX IF NOT EXISTS idx_friend_edges_to
    ON friend_edges(to_identity);

-- ----------------------------------------------------------------
-- Recent chats
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS recent_chats (
    owner       TEXT NOT NULL,
    peer        TEXT NOT NULL,
    last_opened TEXT NOT NULL,               -- "YYYY-MM-DD" (UTC)

    UNIQUE(owner, peer)
);

-- ----------------------------------------------------------------
-- Messages
-- ----------------------------------------------------------------
-- AUTOINCREMENT keeps ids strictly increasing and never reused, which is
-- what pagination and client-side ordering rely on.
CREATE TABLE IF NOT EXISTS messages (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    sender    TEXT NOT NULL,
    receiver  TEXT NOT NULL,
    kind      TEXT NOT NULL,                 -- 'text' | 'media'
    payload   TEXT NOT NULL,                 -- raw text, or blob filename
    timestamp TEXT NOT NULL                  -- "YYYY-MM-DD HH:MM:SS" (UTC)
);

CREATE INDEX IF NOT EXISTS idx_messages_pair
    ON messages(sender, receiver, id DESC);

-- ----------------------------------------------------------------
-- Presence
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS presence (
    identity  TEXT PRIMARY KEY NOT NULL,
    is_online INTEGER NOT NULL DEFAULT 0,    -- boolean 0/1
    last_seen TEXT NOT NULL                  -- "YYYY-MM-DD HH:MM:SS" (UTC)
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
