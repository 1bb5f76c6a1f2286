//! In-memory ratings store for unit tests.

use rusqlite::{params, Connection};

use crate::ratings::Role;
use crate::schema;

/// Parent in Amsterdam, has references, no first aid
pub const ADA: i64 = 1;
/// Babysitter in Utrecht, has references and first aid
pub const BEA: i64 = 2;
/// Childminder in Amsterdam, first aid only
pub const CAS: i64 = 3;
/// Receives every rating
const RECEIVER: i64 = 4;

pub struct FeedBuilder {
    conn: Connection,
}

impl FeedBuilder {
    pub fn new() -> Self {
        let conn = open_test_conn();

        conn.execute_batch(
            r#"
            INSERT INTO places (place_id, place_name) VALUES (1, 'Amsterdam'), (2, 'Utrecht');
            INSERT INTO users (user_id, first_name, role) VALUES
                (1, 'Ada', 'parent'),
                (2, 'Bea', 'babysitter'),
                (3, 'Cas', 'childminder'),
                (4, 'Rae', 'parent');
            INSERT INTO profiles (user_id, place_id, has_references, has_first_aid) VALUES
                (1, 1, 1, 0),
                (2, 2, 1, 1),
                (3, 1, 0, 1),
                (4, 2, 0, 0);
            "#,
        )
        .unwrap();

        FeedBuilder { conn }
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn user_without_profile(&mut self, first_name: &str, role: Role) -> i64 {
        self.conn
            .execute(
                "INSERT INTO users (first_name, role) VALUES (?, ?)",
                params![first_name, role],
            )
            .unwrap();
        self.conn.last_insert_rowid()
    }

    /// Adds an active rating sent by `sender_id` and returns its id.
    pub fn rating(&mut self, sender_id: i64, rating: Option<i64>, delivered: Option<i64>) -> i64 {
        self.conn
            .execute(
                "INSERT INTO messages (sender_id, receiver_id, created_at) VALUES (?, ?, ?)",
                params![sender_id, RECEIVER, delivered.unwrap_or(0)],
            )
            .unwrap();
        let message_id = self.conn.last_insert_rowid();

        self.conn
            .execute(
                "INSERT INTO ratings (message_id, active, rating, delivered) VALUES (?, 1, ?, ?)",
                params![message_id, rating, delivered],
            )
            .unwrap();
        self.conn.last_insert_rowid()
    }

    pub fn deactivate(&mut self, rating_id: i64) {
        self.conn
            .execute("UPDATE ratings SET active = 0 WHERE rating_id = ?", [rating_id])
            .unwrap();
    }
}

pub fn open_test_conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.pragma_update(None, "foreign_keys", true).unwrap();
    schema::ensure_schema(&conn).unwrap();
    conn
}
