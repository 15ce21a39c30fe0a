pub mod error;
pub mod migrations;
pub mod password;
pub mod queries;

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{error, info};

pub use error::{Result, StoreError};

/// SQLite-backed store for users and posts.
///
/// A single connection behind a mutex; every operation is one statement (or
/// an unguarded sequence of them) and never holds the lock across requests.
/// A file database that could not be opened is retried on the next use.
pub struct Database {
    path: PathBuf,
    conn: Mutex<Option<Connection>>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = connect(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Like `open`, but a failure is logged instead of returned. Every
    /// operation then fails until the file becomes openable.
    pub fn open_deferred(path: &Path) -> Self {
        let conn = match connect(path) {
            Ok(conn) => Some(conn),
            Err(e) => {
                error!("Database at {} unavailable, will retry on use: {}", path.display(), e);
                None
            }
        };
        Self {
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
        }
    }

    /// Private, throwaway database. Used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init(&conn)?;
        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(Some(conn)),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut slot = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let conn = match slot.take() {
            Some(conn) => conn,
            None => connect(&self.path)?,
        };
        f(slot.insert(conn))
    }
}

fn connect(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;

    // WAL mode for concurrent reads
    conn.pragma_update(None, "journal_mode", "WAL")?;

    init(&conn)?;
    info!("Database opened at {}", path.display());
    Ok(conn)
}

fn init(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    migrations::run(conn)
}
