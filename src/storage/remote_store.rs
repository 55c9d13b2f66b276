use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{NoteStore, StorageMode};
use crate::entity::{NewNote, Note, NotesState, ProgressCategory};
use crate::error::{Result, TrackerError};

/// Signed-in notes, one row per note, always filtered by owner.
pub struct RemoteStore {
    conn: Mutex<Connection>,
}

/// Raw column values of a `notes` row.
struct NoteRow {
    id: String,
    text: String,
    date: String,
    category: String,
    shot_type: String,
    shot_category: String,
    user_id: String,
}

impl NoteRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            text: row.get(1)?,
            date: row.get(2)?,
            category: row.get(3)?,
            shot_type: row.get(4)?,
            shot_category: row.get(5)?,
            user_id: row.get(6)?,
        })
    }

    fn into_note(self) -> Option<Note> {
        let date = DateTime::parse_from_rfc3339(&self.date)
            .ok()?
            .with_timezone(&Utc);
        Some(Note {
            id: self.id,
            text: self.text,
            date,
            category: self.category.parse().ok()?,
            shot_category: self.shot_category.parse().ok()?,
            shot_type: self.shot_type.parse().ok()?,
            user_id: self.user_id,
        })
    }
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn write_error(e: rusqlite::Error) -> TrackerError {
    TrackerError::RemoteWrite(e.to_string())
}

impl RemoteStore {
    /// Open or create the notes database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Database that lives only as long as the store; used by tests.
    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS notes (
                id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                date TEXT NOT NULL,
                category TEXT NOT NULL,
                shot_type TEXT NOT NULL,
                shot_category TEXT NOT NULL,
                user_id TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_notes_user ON notes(user_id)",
            [],
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| TrackerError::Storage("remote store connection poisoned".to_string()))
    }

    /// Flat rows of one user in insertion order.
    pub fn select_by_user(&self, user_id: &str) -> Result<Vec<Note>> {
        let read_error = |e: rusqlite::Error| TrackerError::RemoteRead(e.to_string());

        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, text, date, category, shot_type, shot_category, user_id
                 FROM notes WHERE user_id = ?1 ORDER BY rowid",
            )
            .map_err(read_error)?;

        let rows = stmt
            .query_map([user_id], NoteRow::from_row)
            .map_err(read_error)?;

        let mut notes = Vec::new();
        for row in rows {
            let row = row.map_err(read_error)?;
            let id = row.id.clone();
            match row.into_note() {
                Some(note) => notes.push(note),
                None => warn!("Skipping unreadable note row {}", id),
            }
        }
        Ok(notes)
    }

    fn execute_scoped(&self, sql: &str, params: impl rusqlite::Params) -> Result<usize> {
        self.conn()?.execute(sql, params).map_err(write_error)
    }
}

impl NoteStore for RemoteStore {
    fn mode(&self) -> StorageMode {
        StorageMode::Remote
    }

    fn load(&self, user_id: &str) -> Result<NotesState> {
        let notes = self.select_by_user(user_id)?;
        debug!("Loaded {} remote notes for {}", notes.len(), user_id);
        Ok(NotesState::from_notes(notes))
    }

    fn insert(&self, note: NewNote) -> Result<Note> {
        let note = note.into_note(Uuid::new_v4().to_string());
        self.execute_scoped(
            "INSERT INTO notes (id, text, date, category, shot_type, shot_category, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                note.id,
                note.text,
                format_date(&note.date),
                note.category.to_string(),
                note.shot_type.to_string(),
                note.shot_category.to_string(),
                note.user_id,
            ],
        )?;
        Ok(note)
    }

    fn update_category(&self, user_id: &str, id: &str, category: ProgressCategory) -> Result<()> {
        self.execute_scoped(
            "UPDATE notes SET category = ?1 WHERE id = ?2 AND user_id = ?3",
            params![category.to_string(), id, user_id],
        )?;
        Ok(())
    }

    fn update_text(&self, user_id: &str, id: &str, text: &str) -> Result<()> {
        self.execute_scoped(
            "UPDATE notes SET text = ?1 WHERE id = ?2 AND user_id = ?3",
            params![text, id, user_id],
        )?;
        Ok(())
    }

    fn delete(&self, user_id: &str, id: &str) -> Result<()> {
        self.execute_scoped(
            "DELETE FROM notes WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        Ok(())
    }

    fn upsert(&self, user_id: &str, notes: &[Note]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(write_error)?;
        let mut written = 0;
        {
            let mut stmt = tx
                .prepare(
                    "INSERT INTO notes (id, text, date, category, shot_type, shot_category, user_id)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT(id) DO UPDATE SET
                        text = excluded.text,
                        date = excluded.date,
                        category = excluded.category,
                        shot_type = excluded.shot_type,
                        shot_category = excluded.shot_category
                     WHERE notes.user_id = excluded.user_id",
                )
                .map_err(write_error)?;

            for note in notes {
                written += stmt
                    .execute(params![
                        note.id,
                        note.text,
                        format_date(&note.date),
                        note.category.to_string(),
                        note.shot_type.to_string(),
                        note.shot_category.to_string(),
                        user_id,
                    ])
                    .map_err(write_error)?;
            }
        }
        tx.commit().map_err(write_error)?;
        Ok(written)
    }

    fn persist(&self, _state: &NotesState) -> Result<()> {
        // Rows are already written one by one.
        Ok(())
    }
}
