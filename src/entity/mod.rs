mod group;

pub use group::{NotesGroup, NotesState};

use chrono::{DateTime, SubsecRound, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, TrackerError};

/// Owner id carried by notes that were written without a signed-in user.
pub const ANONYMOUS_USER: &str = "";

/// Progress state of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ProgressCategory {
    CurrentFocus,
    #[default]
    ToWorkOn,
    Mastered,
}

impl ProgressCategory {
    /// Display order used by every listing.
    pub const ALL: [ProgressCategory; 3] = [
        ProgressCategory::CurrentFocus,
        ProgressCategory::ToWorkOn,
        ProgressCategory::Mastered,
    ];

    /// Next step of the practice cycle: to work on -> current focus -> mastered -> to work on.
    pub fn next(self) -> Self {
        match self {
            ProgressCategory::ToWorkOn => ProgressCategory::CurrentFocus,
            ProgressCategory::CurrentFocus => ProgressCategory::Mastered,
            ProgressCategory::Mastered => ProgressCategory::ToWorkOn,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ProgressCategory::CurrentFocus => "Current Focus",
            ProgressCategory::ToWorkOn => "To Work On",
            ProgressCategory::Mastered => "Mastered",
        }
    }

    /// Verb shown for the move out of this category.
    pub fn advance_label(self) -> &'static str {
        match self {
            ProgressCategory::ToWorkOn => "Focus",
            ProgressCategory::CurrentFocus => "Master",
            ProgressCategory::Mastered => "Revise",
        }
    }
}

impl std::fmt::Display for ProgressCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressCategory::CurrentFocus => write!(f, "currentFocus"),
            ProgressCategory::ToWorkOn => write!(f, "toWorkOn"),
            ProgressCategory::Mastered => write!(f, "mastered"),
        }
    }
}

impl std::str::FromStr for ProgressCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "currentfocus" | "focus" => Ok(ProgressCategory::CurrentFocus),
            "toworkon" | "workon" => Ok(ProgressCategory::ToWorkOn),
            "mastered" => Ok(ProgressCategory::Mastered),
            _ => Err(format!("Invalid progress category: {}", s)),
        }
    }
}

/// Top-level stroke classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShotCategory {
    Forehand,
    Backhand,
    Serve,
}

impl ShotCategory {
    pub const ALL: [ShotCategory; 3] = [
        ShotCategory::Forehand,
        ShotCategory::Backhand,
        ShotCategory::Serve,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShotCategory::Forehand => "Forehand",
            ShotCategory::Backhand => "Backhand",
            ShotCategory::Serve => "Serve",
        }
    }

    /// Shot types available under this category, in display order.
    pub fn shot_types(self) -> &'static [ShotType] {
        const GROUNDSTROKES: [ShotType; 4] = [
            ShotType::Baseline,
            ShotType::Approach,
            ShotType::Volley,
            ShotType::Dropshot,
        ];
        const SERVES: [ShotType; 4] = [
            ShotType::Flat,
            ShotType::Slice,
            ShotType::Kick,
            ShotType::Second,
        ];

        match self {
            ShotCategory::Forehand | ShotCategory::Backhand => &GROUNDSTROKES,
            ShotCategory::Serve => &SERVES,
        }
    }

    pub fn default_shot_type(self) -> ShotType {
        self.shot_types()[0]
    }

    pub fn allows(self, shot_type: ShotType) -> bool {
        self.shot_types().contains(&shot_type)
    }
}

impl std::fmt::Display for ShotCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShotCategory::Forehand => write!(f, "forehand"),
            ShotCategory::Backhand => write!(f, "backhand"),
            ShotCategory::Serve => write!(f, "serve"),
        }
    }
}

impl std::str::FromStr for ShotCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "forehand" => Ok(ShotCategory::Forehand),
            "backhand" => Ok(ShotCategory::Backhand),
            "serve" => Ok(ShotCategory::Serve),
            _ => Err(format!("Invalid shot category: {}", s)),
        }
    }
}

/// Sub-classification within a shot category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShotType {
    Baseline,
    Approach,
    Volley,
    Dropshot,
    Flat,
    Slice,
    Kick,
    Second,
}

impl std::fmt::Display for ShotType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ShotType::Baseline => "Baseline",
            ShotType::Approach => "Approach",
            ShotType::Volley => "Volley",
            ShotType::Dropshot => "Dropshot",
            ShotType::Flat => "Flat",
            ShotType::Slice => "Slice",
            ShotType::Kick => "Kick",
            ShotType::Second => "Second",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for ShotType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "baseline" => Ok(ShotType::Baseline),
            "approach" => Ok(ShotType::Approach),
            "volley" => Ok(ShotType::Volley),
            "dropshot" | "drop-shot" | "drop_shot" => Ok(ShotType::Dropshot),
            "flat" => Ok(ShotType::Flat),
            "slice" => Ok(ShotType::Slice),
            "kick" => Ok(ShotType::Kick),
            "second" => Ok(ShotType::Second),
            _ => Err(format!("Invalid shot type: {}", s)),
        }
    }
}

/// A valid `(shot category, shot type)` pair. Rendered as `forehand-Baseline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShotKey {
    category: ShotCategory,
    shot_type: ShotType,
}

impl ShotKey {
    pub fn new(category: ShotCategory, shot_type: ShotType) -> Result<Self> {
        if !category.allows(shot_type) {
            return Err(TrackerError::InvalidShot(format!(
                "{} is not a {} shot",
                shot_type, category
            )));
        }
        Ok(Self {
            category,
            shot_type,
        })
    }

    /// Parse the two halves independently, e.g. from CLI flags.
    pub fn parse(category: &str, shot_type: &str) -> Result<Self> {
        let category: ShotCategory = category.parse().map_err(TrackerError::InvalidShot)?;
        let shot_type: ShotType = shot_type.parse().map_err(TrackerError::InvalidShot)?;
        Self::new(category, shot_type)
    }

    pub fn category(&self) -> ShotCategory {
        self.category
    }

    pub fn shot_type(&self) -> ShotType {
        self.shot_type
    }

    /// Every valid key, in display order.
    pub fn all() -> impl Iterator<Item = ShotKey> {
        ShotCategory::ALL.into_iter().flat_map(|category| {
            category.shot_types().iter().map(move |&shot_type| ShotKey {
                category,
                shot_type,
            })
        })
    }
}

impl Default for ShotKey {
    fn default() -> Self {
        Self {
            category: ShotCategory::Forehand,
            shot_type: ShotType::Baseline,
        }
    }
}

impl std::fmt::Display for ShotKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.category, self.shot_type)
    }
}

impl std::str::FromStr for ShotKey {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self> {
        let (category, shot_type) = s
            .split_once('-')
            .ok_or_else(|| TrackerError::InvalidShot(format!("expected category-type, got {}", s)))?;
        Self::parse(category, shot_type)
    }
}

impl Serialize for ShotKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ShotKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// One observation about a specific shot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub text: String,
    pub date: DateTime<Utc>,
    pub category: ProgressCategory,
    pub shot_category: ShotCategory,
    pub shot_type: ShotType,
    pub user_id: String,
}

impl Note {
    /// Shot key of the note.
    ///
    /// Falls back to the category's default type when the stored pair is
    /// inconsistent, so a bad row still lands in a valid group.
    pub fn shot(&self) -> ShotKey {
        ShotKey::new(self.shot_category, self.shot_type).unwrap_or(ShotKey {
            category: self.shot_category,
            shot_type: self.shot_category.default_shot_type(),
        })
    }

    /// Abbreviated id for terminal output.
    pub fn short_id(&self) -> &str {
        match self.id.char_indices().nth(7) {
            Some((end, _)) => &self.id[..end],
            None => &self.id,
        }
    }
}

/// A note that has not been given an id by a store yet.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub text: String,
    pub date: DateTime<Utc>,
    pub shot: ShotKey,
    pub user_id: String,
}

impl NewNote {
    /// New notes always start in "to work on".
    pub fn new(text: impl Into<String>, shot: ShotKey, user_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            date: Utc::now().trunc_subsecs(3),
            shot,
            user_id: user_id.into(),
        }
    }

    pub fn into_note(self, id: String) -> Note {
        Note {
            id,
            text: self.text,
            date: self.date,
            category: ProgressCategory::ToWorkOn,
            shot_category: self.shot.category(),
            shot_type: self.shot.shot_type(),
            user_id: self.user_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_cycle_returns_to_start() {
        let start = ProgressCategory::ToWorkOn;
        assert_eq!(start.next(), ProgressCategory::CurrentFocus);
        assert_eq!(start.next().next(), ProgressCategory::Mastered);
        assert_eq!(start.next().next().next(), start);
    }

    #[test]
    fn test_progress_category_parsing() {
        assert_eq!(
            "currentFocus".parse::<ProgressCategory>().unwrap(),
            ProgressCategory::CurrentFocus
        );
        assert_eq!(
            "to-work-on".parse::<ProgressCategory>().unwrap(),
            ProgressCategory::ToWorkOn
        );
        assert_eq!(
            "MASTERED".parse::<ProgressCategory>().unwrap(),
            ProgressCategory::Mastered
        );
        assert!("done".parse::<ProgressCategory>().is_err());
    }

    #[test]
    fn test_progress_category_serializes_camel_case() {
        let json = serde_json::to_string(&ProgressCategory::CurrentFocus).unwrap();
        assert_eq!(json, "\"currentFocus\"");
    }

    #[test]
    fn test_shot_types_depend_on_category() {
        assert!(ShotCategory::Forehand.allows(ShotType::Volley));
        assert!(ShotCategory::Backhand.allows(ShotType::Dropshot));
        assert!(ShotCategory::Serve.allows(ShotType::Kick));
        assert!(!ShotCategory::Serve.allows(ShotType::Baseline));
        assert!(!ShotCategory::Forehand.allows(ShotType::Second));
    }

    #[test]
    fn test_shot_key_rejects_mismatched_type() {
        let result = ShotKey::new(ShotCategory::Serve, ShotType::Volley);
        assert!(matches!(result, Err(TrackerError::InvalidShot(_))));
    }

    #[test]
    fn test_shot_key_display_and_parse() {
        let key = ShotKey::new(ShotCategory::Forehand, ShotType::Baseline).unwrap();
        assert_eq!(key.to_string(), "forehand-Baseline");
        assert_eq!("forehand-Baseline".parse::<ShotKey>().unwrap(), key);
        assert_eq!("SERVE-kick".parse::<ShotKey>().unwrap().to_string(), "serve-Kick");
        assert!("forehand".parse::<ShotKey>().is_err());
    }

    #[test]
    fn test_all_shot_keys() {
        let keys: Vec<String> = ShotKey::all().map(|k| k.to_string()).collect();
        assert_eq!(keys.len(), 12);
        assert_eq!(keys[0], "forehand-Baseline");
        assert_eq!(keys[11], "serve-Second");
    }

    #[test]
    fn test_note_uses_snake_case_row_fields() {
        let key = ShotKey::new(ShotCategory::Serve, ShotType::Flat).unwrap();
        let note = NewNote::new("Toss higher", key, ANONYMOUS_USER).into_note("n1".to_string());

        let value = serde_json::to_value(&note).unwrap();
        assert_eq!(value["shot_category"], "serve");
        assert_eq!(value["shot_type"], "Flat");
        assert_eq!(value["category"], "toWorkOn");
        assert_eq!(value["user_id"], "");
    }

    #[test]
    fn test_short_id() {
        let key = ShotKey::default();
        let mut note = NewNote::new("x", key, ANONYMOUS_USER).into_note("abcdef123456".to_string());
        assert_eq!(note.short_id(), "abcdef1");
        note.id = "abc".to_string();
        assert_eq!(note.short_id(), "abc");
    }
}
