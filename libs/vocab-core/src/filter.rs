//! Category filtering: derive a working set of words from the store.

use crate::store::VocabularyStore;
use crate::types::{Category, MasteredExclusion, MasteryLevel};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Active selection predicate: a category plus the mastered-word policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Filter {
    pub category: Category,
    pub exclusion: MasteredExclusion,
}

impl Filter {
    pub fn new(category: Category, exclusion: MasteredExclusion) -> Self {
        Self {
            category,
            exclusion,
        }
    }

    pub fn matches(&self, level: MasteryLevel) -> bool {
        if !self.category.matches(level) {
            return false;
        }
        match self.exclusion {
            MasteredExclusion::CategoryScoped => true,
            MasteredExclusion::Always => {
                level != MasteryLevel::Mastered || self.category == Category::Mastered
            }
        }
    }

    /// Whether a change of mastery level can move a word in or out of the set.
    pub fn is_mastery_sensitive(&self) -> bool {
        self.category != Category::All || self.exclusion == MasteredExclusion::Always
    }

    pub fn excludes_mastered(&self) -> bool {
        !self.matches(MasteryLevel::Mastered)
    }
}

impl From<Category> for Filter {
    fn from(category: Category) -> Self {
        Self::new(category, MasteredExclusion::default())
    }
}

/// Snapshot of the words satisfying a filter at selection time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkingSet {
    filter: Filter,
    words: Vec<String>,
}

impl WorkingSet {
    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(String::as_str)
    }

    pub fn position(&self, word: &str) -> Option<usize> {
        self.words.iter().position(|w| w == word)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.position(word).is_some()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// True when a member's live level no longer satisfies the filter, or a
    /// member has disappeared from the store.
    pub fn is_stale(&self, store: &VocabularyStore) -> bool {
        self.words.iter().any(|word| {
            store
                .level_of(word)
                .map_or(true, |level| !self.filter.matches(level))
        })
    }
}

/// Words matching `category`, in store order, with mastered words treated
/// per category only.
pub fn select(store: &VocabularyStore, category: Category) -> WorkingSet {
    select_filtered(store, Filter::from(category))
}

/// Words matching `filter`, in store order.
pub fn select_filtered(store: &VocabularyStore, filter: Filter) -> WorkingSet {
    let words = store
        .iter()
        .filter(|(_, record)| filter.matches(record.mastery))
        .map(|(word, _)| word.to_string())
        .collect();
    WorkingSet { filter, words }
}

/// Same members as [`select_filtered`], shuffled by an explicit seed.
///
/// The same seed over the same store always yields the same order.
pub fn select_shuffled(store: &VocabularyStore, filter: Filter, seed: u64) -> WorkingSet {
    let mut set = select_filtered(store, filter);
    let mut rng = StdRng::seed_from_u64(seed);
    set.words.shuffle(&mut rng);
    set
}
