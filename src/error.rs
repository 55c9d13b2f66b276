use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Failed to read notes from the remote store: {0}")]
    RemoteRead(String),

    #[error("Failed to write to the remote store: {0}")]
    RemoteWrite(String),

    #[error("Local notes are unreadable: {0}")]
    LocalParse(String),

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Note id '{0}' is ambiguous ({1} notes match)")]
    AmbiguousId(String, usize),

    #[error("Invalid shot: {0}")]
    InvalidShot(String),

    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, TrackerError>;
