//! SQL schema for the Motif SQLite store.
//!
//! Runs at every store open. `CREATE TABLE IF NOT EXISTS` keeps it
//! idempotent, and `PRAGMA user_version` records the installed revision so
//! future migrations have something to gate on.

/// Full schema DDL.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS videos (
    id           TEXT PRIMARY KEY,  -- 11-char YouTube id
    title        TEXT,
    upload_date  TEXT,              -- ISO 8601 date or NULL
    last_updated TEXT NOT NULL,     -- RFC 3339 UTC; server-assigned
    embedding    BLOB               -- little-endian f32s or NULL
);

-- AUTOINCREMENT keeps topic ids monotonic; an id is never reused.
CREATE TABLE IF NOT EXISTS topics (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name       TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

-- The vote ledger: at most one row per (video, topic, user), and the stored
-- vote is always +1 or -1. A cleared vote is an absent row, never a zero.
-- video_id and user_id deliberately carry no foreign keys: votes may arrive
-- for videos that were never POSTed, and the user row is created in the
-- same transaction as the vote.
CREATE TABLE IF NOT EXISTS video_topics (
    video_id   TEXT    NOT NULL,
    topic_id   INTEGER NOT NULL REFERENCES topics(id),
    user_id    TEXT    NOT NULL,
    vote       INTEGER NOT NULL CHECK (vote IN (-1, 1)),
    created_at TEXT    NOT NULL,   -- refreshed when the polarity changes
    PRIMARY KEY (video_id, topic_id, user_id)
);

CREATE TABLE IF NOT EXISTS users (
    id         TEXT PRIMARY KEY,
    username   TEXT UNIQUE,
    reputation INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS video_topics_video_idx ON video_topics(video_id);
CREATE INDEX IF NOT EXISTS video_topics_topic_idx ON video_topics(topic_id);
CREATE INDEX IF NOT EXISTS video_topics_user_idx  ON video_topics(user_id);

PRAGMA user_version = 1;
";
