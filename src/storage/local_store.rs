use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use super::{NoteStore, StorageMode};
use crate::entity::{NewNote, Note, NotesGroup, NotesState, ProgressCategory, ShotKey};
use crate::error::{Result, TrackerError};

/// Key of the slot holding the serialized state.
pub const LOCAL_KEY: &str = "tennis-notes";

/// Anonymous notes kept as one JSON blob on disk.
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    /// Open the slot under `data_dir`, creating the directory if needed.
    pub fn open(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)?;
        Ok(Self {
            path: data_dir.join(format!("{}.json", LOCAL_KEY)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_state(&self) -> Result<NotesState> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No local notes at {}", self.path.display());
                return Ok(NotesState::new());
            }
            Err(e) => return Err(TrackerError::LocalParse(e.to_string())),
        };

        if raw.trim().is_empty() {
            return Ok(NotesState::new());
        }

        // Keys are not trusted: every note is placed by its own shot fields.
        let groups: BTreeMap<String, NotesGroup> =
            serde_json::from_str(&raw).map_err(|e| TrackerError::LocalParse(e.to_string()))?;

        let mut misplaced = 0;
        let mut notes = Vec::new();
        for (key, group) in groups {
            let valid_key = key.parse::<ShotKey>().ok();
            for category in ProgressCategory::ALL {
                for note in group.get(category) {
                    if note.category != category || Some(note.shot()) != valid_key {
                        misplaced += 1;
                    }
                }
            }
            notes.extend(group.iter().cloned());
        }

        if misplaced > 0 {
            warn!("Regrouped {} misplaced local notes", misplaced);
        }
        Ok(NotesState::from_notes(notes))
    }
}

impl NoteStore for LocalStore {
    fn mode(&self) -> StorageMode {
        StorageMode::Local
    }

    fn load(&self, _user_id: &str) -> Result<NotesState> {
        self.read_state()
    }

    fn insert(&self, note: NewNote) -> Result<Note> {
        Ok(note.into_note(Uuid::new_v4().to_string()))
    }

    fn update_category(&self, _user_id: &str, _id: &str, _category: ProgressCategory) -> Result<()> {
        Ok(())
    }

    fn update_text(&self, _user_id: &str, _id: &str, _text: &str) -> Result<()> {
        Ok(())
    }

    fn delete(&self, _user_id: &str, _id: &str) -> Result<()> {
        Ok(())
    }

    fn upsert(&self, _user_id: &str, _notes: &[Note]) -> Result<usize> {
        Err(TrackerError::Storage(
            "bulk upsert requires a signed-in user".to_string(),
        ))
    }

    fn persist(&self, state: &NotesState) -> Result<()> {
        let json = serde_json::to_string(state)?;

        // Write aside, then rename over the slot.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;

        debug!("Saved {} local notes to {}", state.len(), self.path.display());
        Ok(())
    }
}
