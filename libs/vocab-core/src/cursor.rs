//! Session cursor: position tracking over a working set.
//!
//! The cursor owns its working set snapshot. Sequential advance walks the
//! snapshot as-is; skip advance re-checks each candidate against the live
//! store and gives up after one full lap; random advance re-filters the
//! store on every draw.

use crate::filter::{select_filtered, Filter, WorkingSet};
use crate::store::VocabularyStore;
use crate::types::AdvanceMode;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where the cursor currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorState {
    /// The working set has no members.
    Empty,
    /// Showing the member at this index.
    Positioned(usize),
    /// No member satisfies the filter any more.
    Exhausted,
}

/// What the UI should display for the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shown<'a> {
    Word(&'a str),
    /// Nothing to show for this category.
    NoWords,
    /// Every candidate has left the category ("all words mastered").
    Exhausted,
}

impl<'a> Shown<'a> {
    pub fn word(self) -> Option<&'a str> {
        match self {
            Self::Word(word) => Some(word),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionCursor {
    set: WorkingSet,
    index: usize,
    state: CursorState,
    mode: AdvanceMode,
}

impl SessionCursor {
    /// Snapshot the words matching `filter` and position on the first one.
    pub fn new(store: &VocabularyStore, filter: Filter, mode: AdvanceMode) -> Self {
        Self::over(store, select_filtered(store, filter), mode)
    }

    /// Use an already-selected working set, e.g. a shuffled one.
    pub fn over(store: &VocabularyStore, set: WorkingSet, mode: AdvanceMode) -> Self {
        let state = resting_state(store, &set);
        Self {
            set,
            index: 0,
            state,
            mode,
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn mode(&self) -> AdvanceMode {
        self.mode
    }

    pub fn filter(&self) -> Filter {
        self.set.filter()
    }

    pub fn working_set(&self) -> &WorkingSet {
        &self.set
    }

    pub fn current(&self) -> Shown<'_> {
        match self.state {
            CursorState::Positioned(index) => {
                self.set.get(index).map_or(Shown::NoWords, Shown::Word)
            }
            CursorState::Empty => Shown::NoWords,
            CursorState::Exhausted => Shown::Exhausted,
        }
    }

    /// Move to the next word according to the cursor's mode.
    pub fn advance(&mut self, store: &VocabularyStore) -> Shown<'_> {
        match self.mode {
            AdvanceMode::Sequential => self.advance_sequential(),
            AdvanceMode::SequentialSkip => self.advance_skipping(store),
            AdvanceMode::Random => self.advance_random(store, &mut rand::rng()),
        }
    }

    /// `(index + 1) mod size` over the snapshot, without consulting the store.
    pub fn advance_sequential(&mut self) -> Shown<'_> {
        let len = self.set.len();
        if len == 0 {
            return self.current();
        }
        self.index = (self.index + 1) % len;
        self.state = CursorState::Positioned(self.index);
        debug!(index = self.index, "advanced");
        self.current()
    }

    /// Advance to the next member whose live level still satisfies the
    /// filter, looking at each member at most once.
    ///
    /// The lap ends on the starting member itself; if that is ineligible as
    /// well the cursor stays there and reports [`Shown::Exhausted`].
    pub fn advance_skipping(&mut self, store: &VocabularyStore) -> Shown<'_> {
        if self.set.is_empty() {
            return self.current();
        }

        let (found, visited) = self.scan(store);
        match found {
            Some(index) => {
                self.index = index;
                self.state = CursorState::Positioned(index);
                debug!(index, visited, "advanced with skip");
            }
            None => {
                self.state = CursorState::Exhausted;
                debug!(visited, "no eligible word left in working set");
            }
        }
        self.current()
    }

    /// One lap starting after the current index. Returns the first eligible
    /// index and how many members were inspected.
    fn scan(&self, store: &VocabularyStore) -> (Option<usize>, usize) {
        let len = self.set.len();
        let mut visited = 0;
        for step in 1..=len {
            let candidate = (self.index + step) % len;
            visited += 1;
            if self.is_eligible(store, candidate) {
                return (Some(candidate), visited);
            }
        }
        (None, visited)
    }

    fn is_eligible(&self, store: &VocabularyStore, index: usize) -> bool {
        let filter = self.set.filter();
        self.set
            .get(index)
            .and_then(|word| store.level_of(word))
            .is_some_and(|level| filter.matches(level))
    }

    /// Draw uniformly from a freshly re-filtered working set.
    pub fn advance_random<R: Rng + ?Sized>(
        &mut self,
        store: &VocabularyStore,
        rng: &mut R,
    ) -> Shown<'_> {
        self.set = select_filtered(store, self.set.filter());
        if self.set.is_empty() {
            self.index = 0;
            self.state = CursorState::Empty;
            return Shown::NoWords;
        }
        self.index = rng.random_range(0..self.set.len());
        self.state = CursorState::Positioned(self.index);
        debug!(index = self.index, size = self.set.len(), "random pick");
        self.current()
    }

    /// Re-snapshot the working set after the store changed.
    ///
    /// The cursor stays on the shown word if it still qualifies; otherwise
    /// it lands on the nearest surviving successor in the old order.
    pub fn refresh(&mut self, store: &VocabularyStore) -> Shown<'_> {
        let fresh = select_filtered(store, self.set.filter());
        let shown = match self.state {
            CursorState::Empty => None,
            _ => self.set.get(self.index),
        };

        let index = shown.and_then(|word| fresh.position(word)).or_else(|| {
            let len = self.set.len();
            (1..=len)
                .filter_map(|step| self.set.get((self.index + step) % len))
                .find_map(|word| fresh.position(word))
        });

        self.state = if fresh.is_empty() {
            resting_state(store, &fresh)
        } else {
            CursorState::Positioned(index.unwrap_or(0))
        };
        self.index = index.unwrap_or(0);
        self.set = fresh;
        debug!(state = ?self.state, size = self.set.len(), "refreshed working set");
        self.current()
    }
}

fn resting_state(store: &VocabularyStore, set: &WorkingSet) -> CursorState {
    if !set.is_empty() {
        CursorState::Positioned(0)
    } else if store.all_mastered() && set.filter().excludes_mastered() {
        CursorState::Exhausted
    } else {
        CursorState::Empty
    }
}
