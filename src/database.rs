use std::fs;
use std::path::Path;
use std::time::Duration;

use log::info;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;

use crate::error::SitlyError;
use crate::schema;

pub const DB_FILENAME: &str = "sitly.db";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub type PooledConn = PooledConnection<SqliteConnectionManager>;

/// Pooled handle to the ratings store. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Opens (creating if needed) the database at `db_path` and makes sure the schema is current.
    pub fn open(db_path: &Path, pool_size: u32) -> Result<Self, SitlyError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
            conn.pragma_update(None, "foreign_keys", true)?;
            conn.busy_timeout(BUSY_TIMEOUT)
        });

        let pool = Pool::builder().max_size(pool_size).build(manager)?;
        let db = Database { pool };

        let conn = db.conn()?;
        schema::ensure_schema(&conn)?;

        info!("Database opened at: {}", db_path.display());

        Ok(db)
    }

    pub fn conn(&self) -> Result<PooledConn, SitlyError> {
        Ok(self.pool.get()?)
    }

    pub fn schema_version(&self) -> Result<String, SitlyError> {
        let conn = self.conn()?;
        schema::get_schema_version(&conn)?
            .ok_or_else(|| SitlyError::Error("Schema version missing".to_string()))
    }
}
