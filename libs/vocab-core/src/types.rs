//! Core types for the vocabulary engine.

use crate::error::VocabError;
use serde::{Deserialize, Serialize};

/// User-assigned recall confidence for a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteryLevel {
    Unseen,
    Learning,
    Mastered,
}

impl Default for MasteryLevel {
    fn default() -> Self {
        Self::Unseen
    }
}

impl MasteryLevel {
    pub const ALL: [MasteryLevel; 3] = [Self::Unseen, Self::Learning, Self::Mastered];

    /// Numeric value used in the persisted row format (0-2).
    pub fn to_value(self) -> u8 {
        match self {
            Self::Unseen => 0,
            Self::Learning => 1,
            Self::Mastered => 2,
        }
    }

    /// Create from the persisted numeric value.
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Unseen),
            1 => Some(Self::Learning),
            2 => Some(Self::Mastered),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unseen => "unseen",
            Self::Learning => "learning",
            Self::Mastered => "mastered",
        }
    }

    /// Parse a level name or its numeric value.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unseen" | "0" => Some(Self::Unseen),
            "learning" | "1" => Some(Self::Learning),
            "mastered" | "2" => Some(Self::Mastered),
            _ => None,
        }
    }
}

impl TryFrom<i64> for MasteryLevel {
    type Error = VocabError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .and_then(Self::from_value)
            .ok_or(VocabError::InvalidLevel(value))
    }
}

impl std::fmt::Display for MasteryLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named filter over mastery level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    All,
    Unseen,
    Learning,
    Mastered,
}

impl Default for Category {
    fn default() -> Self {
        Self::All
    }
}

impl Category {
    pub const ALL: [Category; 4] = [Self::All, Self::Unseen, Self::Learning, Self::Mastered];

    /// The level this category selects, or `None` for `All`.
    pub fn level(self) -> Option<MasteryLevel> {
        match self {
            Self::All => None,
            Self::Unseen => Some(MasteryLevel::Unseen),
            Self::Learning => Some(MasteryLevel::Learning),
            Self::Mastered => Some(MasteryLevel::Mastered),
        }
    }

    /// Category predicate over a mastery level.
    pub fn matches(self, level: MasteryLevel) -> bool {
        self.level().map_or(true, |wanted| wanted == level)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Unseen => "unseen",
            Self::Learning => "learning",
            Self::Mastered => "mastered",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Some(Self::All),
            "unseen" => Some(Self::Unseen),
            "learning" => Some(Self::Learning),
            "mastered" => Some(Self::Mastered),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One vocabulary entry, keyed by its word in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordRecord {
    pub meaning: String,
    pub mastery: MasteryLevel,
}

impl WordRecord {
    pub fn new(meaning: impl Into<String>, mastery: MasteryLevel) -> Self {
        Self {
            meaning: meaning.into(),
            mastery,
        }
    }
}

/// Live count of words in one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: Category,
    pub count: usize,
}

/// How the session cursor moves through a working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvanceMode {
    /// `(index + 1) mod size` over the snapshot.
    Sequential,
    /// Like sequential, but skips members whose live level left the filter.
    SequentialSkip,
    /// Uniform draw from a freshly recomputed working set.
    Random,
}

impl Default for AdvanceMode {
    fn default() -> Self {
        Self::SequentialSkip
    }
}

impl AdvanceMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "sequential" => Some(Self::Sequential),
            "sequential_skip" | "skip" => Some(Self::SequentialSkip),
            "random" => Some(Self::Random),
            _ => None,
        }
    }
}

/// Whether mastered words leave rotation only in views that exclude them,
/// or in every view except `Mastered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteredExclusion {
    CategoryScoped,
    Always,
}

impl Default for MasteredExclusion {
    fn default() -> Self {
        Self::CategoryScoped
    }
}

impl MasteredExclusion {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "category_scoped" | "scoped" => Some(Self::CategoryScoped),
            "always" => Some(Self::Always),
            _ => None,
        }
    }
}

/// What to do with a malformed row while loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPolicy {
    Strict,
    SkipMalformed,
}

impl Default for LoadPolicy {
    fn default() -> Self {
        Self::Strict
    }
}

/// Session-wide engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub advance_mode: AdvanceMode,
    pub mastered_exclusion: MasteredExclusion,
    pub load_policy: LoadPolicy,
}
