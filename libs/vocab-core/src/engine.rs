//! Per-session engine: the store, the active filter and its cursor.
//!
//! This is the surface a front end drives. It never renders anything; it
//! hands back words, counts and staleness signals.

use crate::cursor::{SessionCursor, Shown};
use crate::error::{Result, VocabError};
use crate::filter::{Filter, WorkingSet};
use crate::grading::{apply_grade, apply_raw_grade, UpdateResult};
use crate::store::VocabularyStore;
use crate::types::{AdvanceMode, Category, CategoryCount, EngineSettings, MasteryLevel};
use rand::Rng;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct VocabEngine {
    store: VocabularyStore,
    settings: EngineSettings,
    cursor: SessionCursor,
}

impl VocabEngine {
    /// Start a session over `store`, browsing every word.
    pub fn new(store: VocabularyStore, settings: EngineSettings) -> Self {
        let filter = Filter::new(Category::All, settings.mastered_exclusion);
        let cursor = SessionCursor::new(&store, filter, settings.advance_mode);
        let mut engine = Self {
            store,
            settings,
            cursor,
        };
        if engine.settings.advance_mode == AdvanceMode::Random {
            engine.select_category(Category::All);
        }
        engine
    }

    /// Load the word list at `path`.
    ///
    /// A missing or unreadable file yields an empty session. Malformed
    /// content is returned as an error under the strict load policy.
    pub fn initialize<P: AsRef<Path>>(path: P, settings: EngineSettings) -> Result<Self> {
        let store = match VocabularyStore::load(path, settings.load_policy) {
            Ok(store) => store,
            Err(err @ VocabError::SourceUnavailable { .. }) => {
                warn!(error = %err, "starting with an empty word list");
                VocabularyStore::new()
            }
            Err(err) => return Err(err),
        };
        Ok(Self::new(store, settings))
    }

    /// Save the store atomically to `path`.
    pub fn persist<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.store.save(path)
    }

    pub fn store(&self) -> &VocabularyStore {
        &self.store
    }

    pub fn cursor(&self) -> &SessionCursor {
        &self.cursor
    }

    pub fn active_category(&self) -> Category {
        self.cursor.filter().category
    }

    /// Every category with its live count.
    pub fn categories(&self) -> Vec<CategoryCount> {
        self.store.category_counts()
    }

    /// Switch category: take a new snapshot and start from its first word,
    /// or from a random one in random mode.
    pub fn select_category(&mut self, category: Category) -> &WorkingSet {
        self.select_category_with(category, &mut rand::rng())
    }

    pub fn select_category_with<R: Rng + ?Sized>(
        &mut self,
        category: Category,
        rng: &mut R,
    ) -> &WorkingSet {
        let filter = Filter::new(category, self.settings.mastered_exclusion);
        self.cursor = SessionCursor::new(&self.store, filter, self.settings.advance_mode);
        let random = self.settings.advance_mode == AdvanceMode::Random;
        if random && !self.cursor.working_set().is_empty() {
            self.cursor.advance_random(&self.store, rng);
        }
        debug!(%category, size = self.cursor.working_set().len(), "selected category");
        self.cursor.working_set()
    }

    /// Change how the cursor moves, keeping the current category.
    pub fn set_advance_mode(&mut self, mode: AdvanceMode) {
        self.settings.advance_mode = mode;
        let category = self.active_category();
        self.select_category(category);
    }

    pub fn current(&self) -> Shown<'_> {
        self.cursor.current()
    }

    pub fn advance(&mut self) -> Shown<'_> {
        self.cursor.advance(&self.store)
    }

    pub fn advance_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Shown<'_> {
        self.cursor.advance_random(&self.store, rng)
    }

    /// The shown word together with its meaning.
    pub fn reveal(&self) -> Option<(&str, &str)> {
        let word = self.cursor.current().word()?;
        let record = self.store.get(word)?;
        Some((word, record.meaning.as_str()))
    }

    pub fn grade(&mut self, word: &str, level: MasteryLevel) -> Result<UpdateResult> {
        let result = apply_grade(&mut self.store, word, level, self.cursor.filter())?;
        self.reconcile(&result);
        Ok(result)
    }

    pub fn grade_raw(&mut self, word: &str, raw_level: i64) -> Result<UpdateResult> {
        let result = apply_raw_grade(&mut self.store, word, raw_level, self.cursor.filter())?;
        self.reconcile(&result);
        Ok(result)
    }

    /// Grade whatever word is shown. Returns `None` when nothing is shown.
    pub fn grade_current(&mut self, level: MasteryLevel) -> Result<Option<UpdateResult>> {
        let Some(word) = self.cursor.current().word().map(str::to_string) else {
            return Ok(None);
        };
        self.grade(&word, level).map(Some)
    }

    /// [`Self::grade_current`] for a level typed as a number.
    pub fn grade_current_raw(&mut self, raw_level: i64) -> Result<Option<UpdateResult>> {
        let Some(word) = self.cursor.current().word().map(str::to_string) else {
            return Ok(None);
        };
        self.grade_raw(&word, raw_level).map(Some)
    }

    /// Resolve a stale working set.
    ///
    /// Skip mode tolerates members that left the filter, so only newly
    /// eligible words force a re-snapshot there. Other modes re-filter now.
    fn reconcile(&mut self, result: &UpdateResult) {
        if !result.stale {
            return;
        }
        let refresh = match self.cursor.mode() {
            AdvanceMode::SequentialSkip => {
                result.still_eligible && !self.cursor.working_set().contains(&result.word)
            }
            AdvanceMode::Sequential | AdvanceMode::Random => true,
        };
        if refresh {
            self.cursor.refresh(&self.store);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LoadPolicy, MasteredExclusion, WordRecord};
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn engine(rows: &str, mode: AdvanceMode) -> VocabEngine {
        let store = VocabularyStore::parse(rows, LoadPolicy::Strict).unwrap();
        VocabEngine::new(
            store,
            EngineSettings {
                advance_mode: mode,
                ..Default::default()
            },
        )
    }

    #[test]
    fn initialize_missing_file_gives_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let engine =
            VocabEngine::initialize(dir.path().join("words.csv"), EngineSettings::default())
                .unwrap();
        assert!(engine.store().is_empty());
        assert_eq!(engine.current(), Shown::NoWords);
    }

    #[test]
    fn initialize_malformed_file_fails_under_strict_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.csv");
        std::fs::write(&path, "cat,ねこ,7\n").unwrap();
        let err = VocabEngine::initialize(&path, EngineSettings::default()).unwrap_err();
        assert!(matches!(err, VocabError::MalformedRecord { .. }));
    }

    #[test]
    fn initialize_malformed_file_skips_rows_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.csv");
        std::fs::write(&path, "cat,ねこ,7\ndog,いぬ,1\n").unwrap();
        let settings = EngineSettings {
            load_policy: LoadPolicy::SkipMalformed,
            ..Default::default()
        };
        let engine = VocabEngine::initialize(&path, settings).unwrap();
        assert_eq!(engine.store().len(), 1);
    }

    #[test]
    fn categories_report_live_counts() {
        let mut engine = engine("cat,ねこ,0\ndog,いぬ,2", AdvanceMode::Sequential);
        engine.grade("cat", MasteryLevel::Learning).unwrap();
        let counts: Vec<(Category, usize)> = engine
            .categories()
            .into_iter()
            .map(|c| (c.category, c.count))
            .collect();
        assert_eq!(
            counts,
            vec![
                (Category::All, 2),
                (Category::Unseen, 0),
                (Category::Learning, 1),
                (Category::Mastered, 1),
            ]
        );
    }

    #[test]
    fn grading_out_of_view_removes_word_in_sequential_mode() {
        let mut engine = engine("cat,ねこ,0\nfox,きつね,0", AdvanceMode::Sequential);
        engine.select_category(Category::Unseen);
        assert_eq!(engine.current(), Shown::Word("cat"));

        let result = engine.grade("cat", MasteryLevel::Mastered).unwrap();
        assert!(result.stale);
        assert_eq!(engine.cursor().working_set().words(), ["fox"]);
        assert_eq!(engine.current(), Shown::Word("fox"));
    }

    #[test]
    fn grading_in_skip_mode_resolves_lazily() {
        let mut engine = engine("cat,ねこ,0\nfox,きつね,0", AdvanceMode::SequentialSkip);
        engine.select_category(Category::Unseen);
        engine.grade("fox", MasteryLevel::Mastered).unwrap();
        assert_eq!(engine.cursor().working_set().len(), 2);
        assert_eq!(engine.advance(), Shown::Word("cat"));
    }

    #[test]
    fn grading_last_unseen_word_exhausts_the_view() {
        let mut engine = engine("cat,ねこ,0\ndog,いぬ,2", AdvanceMode::SequentialSkip);
        engine.select_category(Category::Unseen);
        engine.grade_current(MasteryLevel::Mastered).unwrap();
        assert_eq!(engine.advance(), Shown::Exhausted);
        assert_eq!(engine.advance(), Shown::Exhausted);
    }

    #[test]
    fn grade_current_without_word_is_none() {
        let mut engine = engine("cat,ねこ,0", AdvanceMode::Sequential);
        engine.select_category(Category::Learning);
        assert_eq!(engine.grade_current(MasteryLevel::Mastered).unwrap(), None);
    }

    #[test]
    fn grade_unknown_word_is_recoverable() {
        let mut engine = engine("cat,ねこ,0", AdvanceMode::Sequential);
        let err = engine.grade("ghost", MasteryLevel::Learning).unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(engine.current(), Shown::Word("cat"));
    }

    #[test]
    fn grade_raw_rejects_invalid_level() {
        let mut engine = engine("cat,ねこ,0", AdvanceMode::Sequential);
        let err = engine.grade_raw("cat", 3).unwrap_err();
        assert!(matches!(err, VocabError::InvalidLevel(3)));
        assert_eq!(engine.store().level_of("cat"), Some(MasteryLevel::Unseen));
    }

    #[test]
    fn grade_current_raw_validates_and_applies() {
        let mut engine = engine("cat,ねこ,0", AdvanceMode::Sequential);
        let err = engine.grade_current_raw(5).unwrap_err();
        assert!(matches!(err, VocabError::InvalidLevel(5)));

        let result = engine.grade_current_raw(1).unwrap().unwrap();
        assert_eq!(result.word, "cat");
        assert_eq!(engine.store().level_of("cat"), Some(MasteryLevel::Learning));
    }

    #[test]
    fn set_advance_mode_keeps_category() {
        let mut engine = engine(
            "cat,ねこ,0\ndog,いぬ,1\nfox,きつね,1",
            AdvanceMode::Sequential,
        );
        engine.select_category(Category::Learning);
        engine.set_advance_mode(AdvanceMode::Random);
        assert_eq!(engine.active_category(), Category::Learning);
        assert_eq!(engine.cursor().mode(), AdvanceMode::Random);
        assert_eq!(engine.cursor().working_set().words(), ["dog", "fox"]);
    }

    #[test]
    fn random_mode_starts_on_a_random_word() {
        let rows: String = (0..20).map(|i| format!("w{i},m{i},0\n")).collect();
        let mut engine = engine(&rows, AdvanceMode::Random);
        let mut starts = std::collections::HashSet::new();
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let size = engine.select_category_with(Category::Unseen, &mut rng).len();
            assert_eq!(size, 20);
            starts.insert(engine.current().word().unwrap().to_string());
        }
        assert!(starts.len() > 1);
    }

    #[test]
    fn random_mode_on_empty_category_reports_no_words() {
        let mut engine = engine("cat,ねこ,0", AdvanceMode::Random);
        engine.select_category(Category::Learning);
        assert_eq!(engine.current(), Shown::NoWords);
    }

    #[test]
    fn reveal_returns_meaning() {
        let engine = engine("cat,ねこ,0", AdvanceMode::Sequential);
        assert_eq!(engine.reveal(), Some(("cat", "ねこ")));
    }

    #[test]
    fn test_mode_round_uses_fresh_set() {
        let mut engine = engine("cat,ねこ,0\ndog,いぬ,0", AdvanceMode::Random);
        engine.select_category(Category::Unseen);
        let mut rng = StdRng::seed_from_u64(3);
        engine.grade("cat", MasteryLevel::Mastered).unwrap();
        for _ in 0..10 {
            assert_eq!(engine.advance_random(&mut rng), Shown::Word("dog"));
        }
    }

    #[test]
    fn always_exclusion_applies_to_all_view() {
        let store = VocabularyStore::from_records([
            ("cat", WordRecord::new("ねこ", MasteryLevel::Unseen)),
            ("dog", WordRecord::new("いぬ", MasteryLevel::Mastered)),
        ])
        .unwrap();
        let mut engine = VocabEngine::new(
            store,
            EngineSettings {
                mastered_exclusion: MasteredExclusion::Always,
                ..Default::default()
            },
        );
        assert_eq!(engine.select_category(Category::All).words(), ["cat"]);
        assert_eq!(engine.select_category(Category::Mastered).words(), ["dog"]);
    }

    #[test]
    fn persist_round_trips_grades() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.csv");
        std::fs::write(&path, "cat,ねこ,0\ndog,いぬ,2\n").unwrap();

        let mut engine = VocabEngine::initialize(&path, EngineSettings::default()).unwrap();
        engine.grade("cat", MasteryLevel::Learning).unwrap();
        engine.persist(&path).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "cat,ねこ,1\ndog,いぬ,2\n"
        );
    }
}
