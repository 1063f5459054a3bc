//! Database layer for interviewer.
//!
//! Provides a unified `Database` struct that owns the SQLite connection
//! and provides access to domain-specific stores.

mod conversations;

pub use conversations::{ConversationRecord, Conversations};
pub use rusqlite::Error as DbError;

use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::Mutex;

/// The main database struct that owns the SQLite connection.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the default location.
    ///
    /// The default location is `~/.local/share/interviewer/interviewer.db`.
    pub fn open() -> Result<Self, DbError> {
        let db_path = Self::default_path();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        Self::open_at(&db_path)
    }

    /// Open or create a database at a specific path.
    pub fn open_at(path: &std::path::Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (useful for testing).
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Get the default database path.
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("interviewer")
            .join("interviewer.db")
    }

    /// Access the conversations store.
    pub fn conversations(&self) -> Conversations<'_> {
        // A poisoned lock still guards a usable connection
        let conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        Conversations::new(conn)
    }

    /// Initialize the database schema.
    fn init_schema(conn: &Connection) -> Result<(), DbError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                status TEXT NOT NULL,
                interview_type TEXT NOT NULL,
                state TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_conversations_created_at ON conversations(created_at DESC);
            "#,
        )
    }
}
