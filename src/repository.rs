//! Note lifecycle over the two stores.
//!
//! Each operation picks its store once from the caller's [`AuthState`]:
//! signed-in users go to the remote table, everyone else to the local blob.
//! Store failures stop here. They are logged and the caller's state is left
//! exactly as it was, so the view never shows a change the store rejected.

use tracing::{debug, error, info};

use crate::auth::AuthState;
use crate::config::Config;
use crate::entity::{NewNote, Note, NotesState, ProgressCategory, ShotKey};
use crate::error::{Result, TrackerError};
use crate::storage::{LocalStore, NoteStore, RemoteStore, StorageMode};

/// Result of a mutating note operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Store and state were both updated.
    Applied,
    /// Nothing to do: unknown note or blank text.
    NoOp,
    /// The store rejected the write; state is unchanged.
    Failed,
}

pub struct NoteRepository {
    local: Box<dyn NoteStore>,
    remote: Box<dyn NoteStore>,
}

impl NoteRepository {
    pub fn new(local: impl NoteStore + 'static, remote: impl NoteStore + 'static) -> Self {
        Self {
            local: Box::new(local),
            remote: Box::new(remote),
        }
    }

    /// Open both stores at the configured locations.
    pub fn open(config: &Config) -> Result<Self> {
        let local = LocalStore::open(&config.data_dir)?;
        let remote = RemoteStore::open(&config.database_path)?;
        Ok(Self::new(local, remote))
    }

    pub fn store_for(&self, auth: &AuthState) -> &dyn NoteStore {
        if auth.is_signed_in() {
            self.remote.as_ref()
        } else {
            self.local.as_ref()
        }
    }

    pub fn mode_for(&self, auth: &AuthState) -> StorageMode {
        self.store_for(auth).mode()
    }

    /// Read every note visible to `auth`. Failures yield an empty state.
    pub fn load_notes(&self, auth: &AuthState) -> NotesState {
        self.try_load_notes(auth).unwrap_or_else(|e| {
            error!("Error loading notes: {}", e);
            NotesState::new()
        })
    }

    /// Like [`load_notes`](Self::load_notes), for callers that report read failures themselves.
    pub fn try_load_notes(&self, auth: &AuthState) -> Result<NotesState> {
        let store = self.store_for(auth);
        let state = store.load(auth.owner_id())?;
        debug!("Loaded {} notes from {} store", state.len(), store.mode());
        Ok(state)
    }

    /// Write the whole state back. Only the local store does real work here.
    pub fn save_notes(&self, state: &NotesState, auth: &AuthState) -> Result<()> {
        self.store_for(auth).persist(state)
    }

    /// Create a note in "to work on" for `shot`. Blank text is ignored.
    pub fn add_note(
        &self,
        state: &mut NotesState,
        text: &str,
        shot: ShotKey,
        auth: &AuthState,
    ) -> Option<Note> {
        if text.trim().is_empty() {
            debug!("Ignoring blank note for {}", shot);
            return None;
        }

        let draft = NewNote::new(text, shot, auth.owner_id());
        let note = match self.store_for(auth).insert(draft) {
            Ok(note) => note,
            Err(e) => {
                error!("Error saving note: {}", e);
                return None;
            }
        };

        let mut updated = state.clone();
        updated.insert(note.clone());

        match self.commit(state, updated, auth) {
            Outcome::Applied => {
                info!("Added note {} to {}", note.id, shot);
                Some(note)
            }
            _ => None,
        }
    }

    /// Move a note of `shot` from one progress category to another.
    pub fn move_note(
        &self,
        state: &mut NotesState,
        shot: ShotKey,
        id: &str,
        from: ProgressCategory,
        to: ProgressCategory,
        auth: &AuthState,
    ) -> Outcome {
        if !Self::contains(state, shot, from, id) {
            return Outcome::NoOp;
        }

        if let Err(e) = self.store_for(auth).update_category(auth.owner_id(), id, to) {
            error!("Error moving note: {}", e);
            return Outcome::Failed;
        }

        let mut updated = state.clone();
        if let Some(group) = updated.group_mut(&shot) {
            group.move_note(id, from, to);
        }
        self.commit(state, updated, auth)
    }

    /// Remove a note for good. Deleting an unknown id does nothing.
    pub fn delete_note(
        &self,
        state: &mut NotesState,
        shot: ShotKey,
        id: &str,
        category: ProgressCategory,
        auth: &AuthState,
    ) -> Outcome {
        if !Self::contains(state, shot, category, id) {
            return Outcome::NoOp;
        }

        if let Err(e) = self.store_for(auth).delete(auth.owner_id(), id) {
            error!("Error deleting note: {}", e);
            return Outcome::Failed;
        }

        let mut updated = state.clone();
        if let Some(group) = updated.group_mut(&shot) {
            group.remove(category, id);
        }
        self.commit(state, updated, auth)
    }

    /// Replace the text of a note.
    ///
    /// Blank text is ignored and returns [`Outcome::NoOp`]; the stored note
    /// keeps its previous text.
    pub fn edit_note(
        &self,
        state: &mut NotesState,
        shot: ShotKey,
        id: &str,
        category: ProgressCategory,
        new_text: &str,
        auth: &AuthState,
    ) -> Outcome {
        if new_text.trim().is_empty() || !Self::contains(state, shot, category, id) {
            return Outcome::NoOp;
        }

        if let Err(e) = self.store_for(auth).update_text(auth.owner_id(), id, new_text) {
            error!("Error updating note: {}", e);
            return Outcome::Failed;
        }

        let mut updated = state.clone();
        if let Some(group) = updated.group_mut(&shot) {
            group.edit_text(category, id, new_text);
        }
        self.commit(state, updated, auth)
    }

    /// Bulk write rows for a signed-in user, forcing ownership to that user.
    pub fn upsert_notes(&self, notes: &[Note], auth: &AuthState) -> Result<usize> {
        if !auth.is_signed_in() {
            return Err(TrackerError::Storage(
                "bulk upsert requires a signed-in user".to_string(),
            ));
        }
        let written = self.store_for(auth).upsert(auth.owner_id(), notes)?;
        info!("Upserted {} of {} notes for {}", written, notes.len(), auth.owner_id());
        Ok(written)
    }

    fn contains(state: &NotesState, shot: ShotKey, category: ProgressCategory, id: &str) -> bool {
        state
            .group(&shot)
            .and_then(|g| g.find(category, id))
            .is_some()
    }

    /// Persist `updated` and only then make it the caller's state.
    fn commit(&self, state: &mut NotesState, updated: NotesState, auth: &AuthState) -> Outcome {
        match self.save_notes(&updated, auth) {
            Ok(()) => {
                *state = updated;
                Outcome::Applied
            }
            Err(e) => {
                error!("Error persisting notes: {}", e);
                Outcome::Failed
            }
        }
    }
}
