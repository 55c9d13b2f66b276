//! Tracker Controller: the transient state behind the notes view.

use std::sync::Arc;

use tracing::debug;

use crate::auth::AuthState;
use crate::entity::{Note, NotesGroup, NotesState, ProgressCategory, ShotCategory, ShotKey, ShotType};
use crate::error::{Result, TrackerError};
use crate::repository::{NoteRepository, Outcome};

/// Shown while notes only live on this machine.
pub const LOCAL_STORAGE_BANNER: &str =
    "Your notes are stored locally. Sign in to access them from any device.";

pub struct TrackerController {
    repository: Arc<NoteRepository>,
    auth: Option<AuthState>,
    active_shot_category: ShotCategory,
    active_shot_type: ShotType,
    draft_text: String,
    editing_note_id: Option<String>,
    edit_buffer: String,
    is_loading: bool,
    notes: NotesState,
}

impl TrackerController {
    pub fn new(repository: Arc<NoteRepository>) -> Self {
        let shot = ShotKey::default();
        Self {
            repository,
            auth: None,
            active_shot_category: shot.category(),
            active_shot_type: shot.shot_type(),
            draft_text: String::new(),
            editing_note_id: None,
            edit_buffer: String::new(),
            is_loading: true,
            notes: NotesState::new(),
        }
    }

    /// Load notes on first use and again whenever the signed-in user changes.
    ///
    /// Anonymous notes are not carried over on sign-in: the two stores are
    /// never merged.
    pub fn set_auth(&mut self, auth: AuthState) {
        if self.auth.as_ref() == Some(&auth) {
            return;
        }
        self.is_loading = true;
        self.notes = self.repository.load_notes(&auth);
        self.auth = Some(auth);
        self.is_loading = false;
    }

    pub fn auth(&self) -> &AuthState {
        const ANONYMOUS: &AuthState = &AuthState::Anonymous;
        self.auth.as_ref().unwrap_or(ANONYMOUS)
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn notes(&self) -> &NotesState {
        &self.notes
    }

    pub fn active_shot(&self) -> ShotKey {
        ShotKey::new(self.active_shot_category, self.active_shot_type).unwrap_or_default()
    }

    /// Switch category, falling back to its first type if the current one does not apply.
    pub fn select_shot_category(&mut self, category: ShotCategory) {
        self.active_shot_category = category;
        if !category.allows(self.active_shot_type) {
            self.active_shot_type = category.default_shot_type();
        }
    }

    pub fn select_shot_type(&mut self, shot_type: ShotType) -> Result<()> {
        if !self.active_shot_category.allows(shot_type) {
            return Err(TrackerError::InvalidShot(format!(
                "{} is not a {} shot",
                shot_type, self.active_shot_category
            )));
        }
        self.active_shot_type = shot_type;
        Ok(())
    }

    pub fn select_shot(&mut self, shot: ShotKey) {
        self.active_shot_category = shot.category();
        self.active_shot_type = shot.shot_type();
    }

    pub fn active_group(&self) -> Option<&NotesGroup> {
        self.notes.group(&self.active_shot())
    }

    pub fn draft_text(&self) -> &str {
        &self.draft_text
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft_text = text.into();
    }

    /// Add the draft to the active shot. The draft is kept if nothing was added.
    pub fn submit_draft(&mut self) -> Option<Note> {
        let shot = self.active_shot();
        let auth = self.auth().clone();
        let note = self
            .repository
            .add_note(&mut self.notes, &self.draft_text, shot, &auth)?;
        self.draft_text.clear();
        Some(note)
    }

    pub fn editing_note_id(&self) -> Option<&str> {
        self.editing_note_id.as_deref()
    }

    pub fn edit_buffer(&self) -> &str {
        &self.edit_buffer
    }

    /// Start editing a note of the active shot, seeding the buffer with its text.
    pub fn begin_edit(&mut self, id: &str, category: ProgressCategory) -> Result<()> {
        let text = self
            .active_group()
            .and_then(|g| g.find(category, id))
            .map(|n| n.text.clone())
            .ok_or_else(|| TrackerError::NoteNotFound(id.to_string()))?;
        self.editing_note_id = Some(id.to_string());
        self.edit_buffer = text;
        Ok(())
    }

    pub fn set_edit_buffer(&mut self, text: impl Into<String>) {
        self.edit_buffer = text.into();
    }

    pub fn cancel_edit(&mut self) {
        self.editing_note_id = None;
        self.edit_buffer.clear();
    }

    /// Save the edit buffer. Edit mode ends only when the change was applied.
    pub fn commit_edit(&mut self, category: ProgressCategory) -> Outcome {
        let Some(id) = self.editing_note_id.clone() else {
            return Outcome::NoOp;
        };
        let shot = self.active_shot();
        let auth = self.auth().clone();
        let outcome = self.repository.edit_note(
            &mut self.notes,
            shot,
            &id,
            category,
            &self.edit_buffer,
            &auth,
        );
        if outcome == Outcome::Applied {
            self.cancel_edit();
        }
        outcome
    }

    /// Push a note one step along the practice cycle.
    pub fn advance(&mut self, id: &str, from: ProgressCategory) -> Outcome {
        self.move_to(id, from, from.next())
    }

    pub fn move_to(&mut self, id: &str, from: ProgressCategory, to: ProgressCategory) -> Outcome {
        let shot = self.active_shot();
        let auth = self.auth().clone();
        debug!("Moving {} in {} from {} to {}", id, shot, from, to);
        self.repository
            .move_note(&mut self.notes, shot, id, from, to, &auth)
    }

    pub fn delete(&mut self, id: &str, category: ProgressCategory) -> Outcome {
        let shot = self.active_shot();
        let auth = self.auth().clone();
        self.repository
            .delete_note(&mut self.notes, shot, id, category, &auth)
    }

    /// Storage notice for anonymous users; nothing once signed in.
    pub fn storage_banner(&self) -> Option<&'static str> {
        if self.auth().is_signed_in() {
            None
        } else {
            Some(LOCAL_STORAGE_BANNER)
        }
    }
}
