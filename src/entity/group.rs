use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Note, ProgressCategory, ShotKey};
use crate::error::{Result, TrackerError};

/// Notes of a single shot, one list per progress category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesGroup {
    #[serde(default)]
    pub current_focus: Vec<Note>,
    #[serde(default)]
    pub to_work_on: Vec<Note>,
    #[serde(default)]
    pub mastered: Vec<Note>,
}

impl NotesGroup {
    pub fn get(&self, category: ProgressCategory) -> &[Note] {
        match category {
            ProgressCategory::CurrentFocus => &self.current_focus,
            ProgressCategory::ToWorkOn => &self.to_work_on,
            ProgressCategory::Mastered => &self.mastered,
        }
    }

    pub fn get_mut(&mut self, category: ProgressCategory) -> &mut Vec<Note> {
        match category {
            ProgressCategory::CurrentFocus => &mut self.current_focus,
            ProgressCategory::ToWorkOn => &mut self.to_work_on,
            ProgressCategory::Mastered => &mut self.mastered,
        }
    }

    /// Append a note to the list matching its own category.
    pub fn push(&mut self, note: Note) {
        self.get_mut(note.category).push(note);
    }

    pub fn find(&self, category: ProgressCategory, id: &str) -> Option<&Note> {
        self.get(category).iter().find(|n| n.id == id)
    }

    pub fn remove(&mut self, category: ProgressCategory, id: &str) -> Option<Note> {
        let list = self.get_mut(category);
        let index = list.iter().position(|n| n.id == id)?;
        Some(list.remove(index))
    }

    /// Move a note between categories, rewriting its `category` field.
    ///
    /// Returns `false` when the note is not in `from`.
    pub fn move_note(&mut self, id: &str, from: ProgressCategory, to: ProgressCategory) -> bool {
        let Some(mut note) = self.remove(from, id) else {
            return false;
        };
        note.category = to;
        self.get_mut(to).push(note);
        true
    }

    /// Replace the text of a note; everything else stays as it was.
    pub fn edit_text(&mut self, category: ProgressCategory, id: &str, text: &str) -> bool {
        match self.get_mut(category).iter_mut().find(|n| n.id == id) {
            Some(note) => {
                note.text = text.to_string();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.current_focus.len() + self.to_work_on.len() + self.mastered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every note sits in the list named by its own category.
    pub fn is_consistent(&self) -> bool {
        ProgressCategory::ALL
            .iter()
            .all(|&category| self.get(category).iter().all(|n| n.category == category))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        ProgressCategory::ALL
            .into_iter()
            .flat_map(move |category| self.get(category).iter())
    }
}

/// All notes of one owner, grouped by shot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotesState {
    groups: BTreeMap<ShotKey, NotesGroup>,
}

impl NotesState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a flat list of notes into groups, keeping source order per category.
    pub fn from_notes(notes: impl IntoIterator<Item = Note>) -> Self {
        let mut state = Self::new();
        for note in notes {
            state.insert(note);
        }
        state
    }

    /// Append a note to its group, creating the group on first use.
    pub fn insert(&mut self, note: Note) {
        self.groups.entry(note.shot()).or_default().push(note);
    }

    pub fn group(&self, shot: &ShotKey) -> Option<&NotesGroup> {
        self.groups.get(shot)
    }

    pub fn group_mut(&mut self, shot: &ShotKey) -> Option<&mut NotesGroup> {
        self.groups.get_mut(shot)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&ShotKey, &NotesGroup)> {
        self.groups.iter()
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.groups.values().flat_map(|g| g.iter())
    }

    pub fn into_notes(self) -> Vec<Note> {
        self.groups
            .into_values()
            .flat_map(|g| {
                let NotesGroup {
                    current_focus,
                    to_work_on,
                    mastered,
                } = g;
                current_focus.into_iter().chain(to_work_on).chain(mastered)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.groups.values().map(NotesGroup::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check both the category invariant and that each group holds only its own shot.
    pub fn is_consistent(&self) -> bool {
        self.groups
            .iter()
            .all(|(key, group)| group.is_consistent() && group.iter().all(|n| n.shot() == *key))
    }

    /// Find a note by full id or unique id prefix.
    pub fn resolve(&self, id_or_prefix: &str) -> Result<(ShotKey, ProgressCategory, String)> {
        if id_or_prefix.is_empty() {
            return Err(TrackerError::NoteNotFound(id_or_prefix.to_string()));
        }

        let mut matches = Vec::new();
        for (key, group) in &self.groups {
            for category in ProgressCategory::ALL {
                for note in group.get(category) {
                    if note.id == id_or_prefix {
                        return Ok((*key, category, note.id.clone()));
                    }
                    if note.id.starts_with(id_or_prefix) {
                        matches.push((*key, category, note.id.clone()));
                    }
                }
            }
        }

        match matches.len() {
            0 => Err(TrackerError::NoteNotFound(id_or_prefix.to_string())),
            1 => Ok(matches.remove(0)),
            n => Err(TrackerError::AmbiguousId(id_or_prefix.to_string(), n)),
        }
    }
}
