mod local_store;
mod remote_store;

pub use local_store::{LocalStore, LOCAL_KEY};
pub use remote_store::RemoteStore;

use crate::entity::{NewNote, Note, NotesState, ProgressCategory};
use crate::error::Result;

/// Where a store keeps its notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Local,
    Remote,
}

impl std::fmt::Display for StorageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageMode::Local => write!(f, "local"),
            StorageMode::Remote => write!(f, "remote"),
        }
    }
}

/// Persistence boundary shared by the local blob and the remote table.
///
/// Row-level writes (`insert`, `update_*`, `delete`) are what a remote store
/// acts on; a store that keeps the whole state as one blob treats them as
/// bookkeeping and does its real write in `persist`. All calls are scoped by
/// `user_id`.
pub trait NoteStore: Send + Sync {
    fn mode(&self) -> StorageMode;

    /// Read every note of `user_id`, grouped by shot.
    fn load(&self, user_id: &str) -> Result<NotesState>;

    /// Store a new note and return it with its assigned id.
    fn insert(&self, note: NewNote) -> Result<Note>;

    fn update_category(&self, user_id: &str, id: &str, category: ProgressCategory) -> Result<()>;

    fn update_text(&self, user_id: &str, id: &str, text: &str) -> Result<()>;

    fn delete(&self, user_id: &str, id: &str) -> Result<()>;

    /// Insert or overwrite rows owned by `user_id`. Returns the number written.
    fn upsert(&self, user_id: &str, notes: &[Note]) -> Result<usize>;

    /// Write the full state back.
    fn persist(&self, state: &NotesState) -> Result<()>;
}
