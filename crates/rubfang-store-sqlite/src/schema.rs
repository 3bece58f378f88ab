//! SQL schema for the Rubfang SQLite store.
//!
//! One table per collection. Each row is a whole JSON document; `position`
//! preserves the order the collection was written in.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS feedback (
    record_key    TEXT PRIMARY KEY,      -- feedback id
    line_user_id  TEXT NOT NULL UNIQUE,
    position      INTEGER NOT NULL,
    body          TEXT NOT NULL          -- camelCase JSON document
);

CREATE TABLE IF NOT EXISTS registrations (
    record_key    TEXT PRIMARY KEY,      -- lineUserId
    line_user_id  TEXT NOT NULL UNIQUE,
    position      INTEGER NOT NULL,
    body          TEXT NOT NULL
);

PRAGMA user_version = 1;
";
