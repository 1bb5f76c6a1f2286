use rusqlite::{Connection, OptionalExtension};

use crate::error::SitlyError;

pub const SCHEMA_VERSION: &str = "1";

pub const CREATE_SCHEMA_SQL: &str = r#"
BEGIN TRANSACTION;

CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

INSERT OR REPLACE INTO meta (key, value) VALUES ('schema_version', '1');

-- Places a profile can be located in
CREATE TABLE IF NOT EXISTS places (
    place_id INTEGER PRIMARY KEY AUTOINCREMENT,
    place_name TEXT NOT NULL UNIQUE COLLATE NOCASE
);

-- Marketplace members. role is one of 'parent', 'babysitter', 'childminder'
CREATE TABLE IF NOT EXISTS users (
    user_id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    role TEXT NOT NULL
);

-- One profile per user
CREATE TABLE IF NOT EXISTS profiles (
    user_id INTEGER PRIMARY KEY,
    place_id INTEGER DEFAULT NULL,
    has_references BOOLEAN NOT NULL DEFAULT 0,
    has_first_aid BOOLEAN NOT NULL DEFAULT 0,
    FOREIGN KEY (user_id) REFERENCES users(user_id),
    FOREIGN KEY (place_id) REFERENCES places(place_id)
);

-- Conversation messages; a rating hangs off the message it was given in
CREATE TABLE IF NOT EXISTS messages (
    message_id INTEGER PRIMARY KEY AUTOINCREMENT,
    sender_id INTEGER NOT NULL,
    receiver_id INTEGER NOT NULL,
    created_at INTEGER NOT NULL,       -- UTC unix seconds
    FOREIGN KEY (sender_id) REFERENCES users(user_id),
    FOREIGN KEY (receiver_id) REFERENCES users(user_id)
);

CREATE INDEX IF NOT EXISTS idx_messages_sender ON messages (sender_id);

CREATE TABLE IF NOT EXISTS ratings (
    rating_id INTEGER PRIMARY KEY AUTOINCREMENT,
    message_id INTEGER NOT NULL,
    active BOOLEAN NOT NULL DEFAULT 1,
    rating INTEGER DEFAULT NULL,       -- 1-5 stars, NULL until the rating is given
    delivered INTEGER DEFAULT NULL,    -- UTC unix seconds, NULL until delivered
    comment TEXT DEFAULT NULL,
    FOREIGN KEY (message_id) REFERENCES messages(message_id)
);

CREATE INDEX IF NOT EXISTS idx_ratings_active_delivered ON ratings (active, delivered);

COMMIT;
"#;

/// Creates the schema on an empty database, or verifies the stored version on an existing one.
pub fn ensure_schema(conn: &Connection) -> Result<(), SitlyError> {
    let table_exists: bool = conn
        .query_row(
            "SELECT count(*) FROM sqlite_master WHERE type='table' AND name='meta'",
            [],
            |row| row.get::<_, i32>(0),
        )
        .map(|count| count > 0)?;

    if !table_exists {
        conn.execute_batch(CREATE_SCHEMA_SQL)?;
        return Ok(());
    }

    match get_schema_version(conn)?.as_deref() {
        Some(SCHEMA_VERSION) => Ok(()),
        Some(other) => Err(SitlyError::Error(format!(
            "Schema version mismatch: database has '{other}', expected '{SCHEMA_VERSION}'"
        ))),
        None => Err(SitlyError::Error("Schema version missing".to_string())),
    }
}

pub fn get_schema_version(conn: &Connection) -> Result<Option<String>, SitlyError> {
    let version = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    Ok(version)
}
