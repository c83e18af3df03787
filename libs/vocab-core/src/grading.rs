//! Mastery update protocol: the single write path for mastery levels.

use crate::error::Result;
use crate::filter::Filter;
use crate::store::VocabularyStore;
use crate::types::MasteryLevel;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Outcome of grading one word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResult {
    pub word: String,
    pub previous: MasteryLevel,
    pub level: MasteryLevel,
    /// The active working set may no longer reflect the store.
    pub stale: bool,
    /// The word still satisfies the active filter.
    pub still_eligible: bool,
}

impl UpdateResult {
    pub fn changed(&self) -> bool {
        self.previous != self.level
    }
}

/// Write `level` for `word` and report whether the active working set went
/// stale.
///
/// The set is stale when the new level fails the active filter, or when the
/// filter depends on mastery at all. Under `All` with category-scoped
/// exclusion no grade can change membership, so the set stays valid.
pub fn apply_grade(
    store: &mut VocabularyStore,
    word: &str,
    level: MasteryLevel,
    active: Filter,
) -> Result<UpdateResult> {
    let previous = store.set_mastery(word, level).map_err(|err| {
        warn!(%word, "grade for word not in store");
        err
    })?;

    let result = UpdateResult {
        word: word.to_string(),
        previous,
        level,
        stale: !active.matches(level) || active.is_mastery_sensitive(),
        still_eligible: active.matches(level),
    };
    info!(
        %word,
        from = %previous,
        to = %level,
        stale = result.stale,
        "graded word"
    );
    Ok(result)
}

/// Like [`apply_grade`], for a level that arrives as a raw number.
///
/// The level is validated before the store is consulted.
pub fn apply_raw_grade(
    store: &mut VocabularyStore,
    word: &str,
    raw_level: i64,
    active: Filter,
) -> Result<UpdateResult> {
    let level = MasteryLevel::try_from(raw_level)?;
    apply_grade(store, word, level, active)
}
