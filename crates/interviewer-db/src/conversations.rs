//! Conversations store for persistent interview records.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::sync::MutexGuard;
use uuid::Uuid;

/// A stored conversation record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    pub id: String,
    pub email: String,
    pub status: String,
    pub interview_type: String,
    pub state: Option<String>, // JSON blob of interview state
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Conversations store with a borrowed connection.
pub struct Conversations<'db> {
    conn: MutexGuard<'db, Connection>,
}

const COLUMNS: &str = "id, email, status, interview_type, state, created_at, updated_at";

impl<'db> Conversations<'db> {
    pub(crate) fn new(conn: MutexGuard<'db, Connection>) -> Self {
        Self { conn }
    }

    /// Create a new active conversation, returning the stored record.
    pub fn create(&self, email: &str) -> Result<ConversationRecord, rusqlite::Error> {
        let now = Utc::now();
        let record = ConversationRecord {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            status: "active".to_string(),
            interview_type: "excel".to_string(),
            state: None,
            created_at: now,
            updated_at: now,
        };
        self.save(&record)?;
        Ok(record)
    }

    /// Save a conversation record (insert or update).
    pub fn save(&self, record: &ConversationRecord) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            r#"
            INSERT INTO conversations (id, email, status, interview_type, state, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                email = excluded.email,
                status = excluded.status,
                interview_type = excluded.interview_type,
                state = excluded.state,
                updated_at = excluded.updated_at
            "#,
            params![
                record.id,
                record.email,
                record.status,
                record.interview_type,
                record.state,
                record.created_at.to_rfc3339(),
                record.updated_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// Get a conversation by ID.
    pub fn get(&self, id: &str) -> Result<Option<ConversationRecord>, rusqlite::Error> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM conversations WHERE id = ?1", COLUMNS),
                params![id],
                Self::row_to_record,
            )
            .optional()
    }

    /// List conversations, newest first.
    pub fn list(&self) -> Result<Vec<ConversationRecord>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM conversations ORDER BY created_at DESC",
            COLUMNS
        ))?;
        let rows = stmt.query_map([], Self::row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }

        Ok(records)
    }

    /// Update only the status column. Returns false if no such conversation.
    pub fn update_status(&self, id: &str, status: &str) -> Result<bool, rusqlite::Error> {
        let rows_affected = self.conn.execute(
            "UPDATE conversations SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status, Utc::now().to_rfc3339(), id],
        )?;
        Ok(rows_affected > 0)
    }

    fn row_to_record(row: &rusqlite::Row) -> Result<ConversationRecord, rusqlite::Error> {
        let created_at_str: String = row.get(5)?;
        let updated_at_str: String = row.get(6)?;

        Ok(ConversationRecord {
            id: row.get(0)?,
            email: row.get(1)?,
            status: row.get(2)?,
            interview_type: row.get(3)?,
            state: row.get(4)?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
            updated_at: DateTime::parse_from_rfc3339(&updated_at_str)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}
