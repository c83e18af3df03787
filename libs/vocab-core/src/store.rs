//! Vocabulary store backed by a `word,meaning,masteryLevel` row file.
//!
//! # Format
//! ```text
//! cat,ねこ,0
//! dog,いぬ,2
//! ```
//!
//! One record per row. The level column is `0` (unseen), `1` (learning) or
//! `2` (mastered). Rows keep their file order, which is the store's
//! iteration order.

use crate::error::{Result, VocabError};
use crate::types::{Category, CategoryCount, LoadPolicy, MasteryLevel, WordRecord};
use indexmap::IndexMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

const FIELDS_PER_ROW: usize = 3;

/// Ordered mapping from word to its record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VocabularyStore {
    words: IndexMap<String, WordRecord>,
}

impl VocabularyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from in-memory records, rejecting empty or duplicate words.
    pub fn from_records<I, S>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, WordRecord)>,
        S: Into<String>,
    {
        let mut store = Self::new();
        for (idx, (word, record)) in records.into_iter().enumerate() {
            store.insert_new(word.into(), record, idx as u64 + 1)?;
        }
        Ok(store)
    }

    /// Load a store from a row file.
    pub fn load<P: AsRef<Path>>(path: P, policy: LoadPolicy) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| VocabError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::read_rows(&bytes, policy)?;
        info!(path = %path.display(), words = store.len(), "loaded word list");
        Ok(store)
    }

    /// Parse row-format content held in memory.
    pub fn parse(content: &str, policy: LoadPolicy) -> Result<Self> {
        Self::read_rows(content.as_bytes(), policy)
    }

    fn read_rows(bytes: &[u8], policy: LoadPolicy) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(bytes);

        let mut store = Self::new();
        let mut record = csv::StringRecord::new();
        let mut lines = LineCounter::new(bytes);

        loop {
            match reader.read_record(&mut record) {
                Ok(false) => break,
                Ok(true) => {}
                Err(err) => {
                    let line = err.position().map_or(lines.last(), |p| lines.at(p.byte()));
                    let malformed = VocabError::MalformedRecord {
                        line,
                        reason: err.to_string(),
                    };
                    reject(malformed, policy)?;
                    continue;
                }
            }

            let line = record.position().map_or(lines.last(), |p| lines.at(p.byte()));
            if is_blank(&record) {
                continue;
            }

            let parsed = parse_row(&record, line)
                .and_then(|(word, entry)| store.insert_new(word, entry, line));
            if let Err(err) = parsed {
                reject(err, policy)?;
            }
        }

        Ok(store)
    }

    fn insert_new(&mut self, word: String, record: WordRecord, line: u64) -> Result<()> {
        if word.trim().is_empty() {
            return Err(VocabError::MalformedRecord {
                line,
                reason: "empty word".to_string(),
            });
        }
        if self.words.contains_key(&word) {
            return Err(VocabError::MalformedRecord {
                line,
                reason: format!("duplicate word {word:?}"),
            });
        }
        if record.meaning.is_empty() {
            debug!(%word, line, "word has an empty meaning");
        }
        self.words.insert(word, record);
        Ok(())
    }

    /// Write every record to `path`, replacing the file atomically.
    ///
    /// The rows go to a temporary file in the destination directory which is
    /// then renamed over `path`. On failure the previous file is untouched.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let sink_err = |source: io::Error| VocabError::SinkUnavailable {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(sink_err)?;
        if let Ok(existing) = fs::metadata(path) {
            // Keep the word list's mode; temp files are created owner-only.
            if existing.is_file() {
                tmp.as_file()
                    .set_permissions(existing.permissions())
                    .map_err(sink_err)?;
            }
        }
        self.write_to(tmp.as_file_mut()).map_err(sink_err)?;
        tmp.as_file().sync_all().map_err(sink_err)?;
        tmp.persist(path).map_err(|e| sink_err(e.error))?;

        info!(path = %path.display(), words = self.len(), "saved word list");
        Ok(())
    }

    /// Serialize all rows, in store order, to a writer.
    pub fn write_to<W: Write>(&self, writer: W) -> io::Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(writer);

        for (word, record) in &self.words {
            let level = record.mastery.to_value().to_string();
            writer.write_record([word.as_str(), record.meaning.as_str(), level.as_str()])?;
        }
        writer.flush()
    }

    pub fn get(&self, word: &str) -> Option<&WordRecord> {
        self.words.get(word)
    }

    /// Live mastery level of a word.
    pub fn level_of(&self, word: &str) -> Option<MasteryLevel> {
        self.words.get(word).map(|record| record.mastery)
    }

    /// Set a word's level, returning the previous one.
    ///
    /// Only the grading protocol calls this.
    pub(crate) fn set_mastery(&mut self, word: &str, level: MasteryLevel) -> Result<MasteryLevel> {
        let record = self
            .words
            .get_mut(word)
            .ok_or_else(|| VocabError::UnknownWord(word.to_string()))?;
        Ok(std::mem::replace(&mut record.mastery, level))
    }

    /// All records in store order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &WordRecord)> + '_ {
        self.words.iter().map(|(word, record)| (word.as_str(), record))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Number of records in a category; `All` counts every record.
    pub fn count_by_category(&self, category: Category) -> usize {
        match category {
            Category::All => self.words.len(),
            _ => self
                .words
                .values()
                .filter(|record| category.matches(record.mastery))
                .count(),
        }
    }

    /// Counts for every category, in display order.
    pub fn category_counts(&self) -> Vec<CategoryCount> {
        Category::ALL
            .iter()
            .map(|&category| CategoryCount {
                category,
                count: self.count_by_category(category),
            })
            .collect()
    }

    /// True when the store has words and every one is mastered.
    pub fn all_mastered(&self) -> bool {
        !self.is_empty()
            && self
                .words
                .values()
                .all(|record| record.mastery == MasteryLevel::Mastered)
    }
}

fn is_blank(record: &csv::StringRecord) -> bool {
    record.len() == 1 && record[0].trim().is_empty()
}

/// Maps byte offsets of records to 1-based line numbers, counting the
/// blank lines the csv reader skips.
struct LineCounter<'a> {
    bytes: &'a [u8],
    offset: usize,
    line: u64,
}

impl<'a> LineCounter<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            line: 1,
        }
    }

    /// Line of the record reported at `byte`. Offsets must not decrease
    /// between calls.
    ///
    /// A record's position is taken before the reader skips empty lines, so
    /// any run of line terminators at `byte` belongs in front of the record.
    fn at(&mut self, byte: u64) -> u64 {
        let target = (byte as usize).min(self.bytes.len());
        if target > self.offset {
            let newlines = self.bytes[self.offset..target]
                .iter()
                .filter(|&&b| b == b'\n')
                .count();
            self.line += newlines as u64;
            self.offset = target;
        }
        while let Some(&b) = self.bytes.get(self.offset) {
            match b {
                b'\n' => self.line += 1,
                b'\r' => {}
                _ => break,
            }
            self.offset += 1;
        }
        self.line
    }

    fn last(&self) -> u64 {
        self.line
    }
}

fn reject(err: VocabError, policy: LoadPolicy) -> Result<()> {
    match policy {
        LoadPolicy::Strict => Err(err),
        LoadPolicy::SkipMalformed => {
            warn!(error = %err, "skipping row");
            Ok(())
        }
    }
}

fn parse_row(record: &csv::StringRecord, line: u64) -> Result<(String, WordRecord)> {
    if record.len() != FIELDS_PER_ROW {
        return Err(VocabError::MalformedRecord {
            line,
            reason: format!("expected {FIELDS_PER_ROW} fields, found {}", record.len()),
        });
    }

    let word = record[0].trim_start_matches('\u{feff}').trim();
    let meaning = record[1].trim();
    let raw_level = record[2].trim();

    let mastery = raw_level
        .parse::<u8>()
        .ok()
        .and_then(MasteryLevel::from_value)
        .ok_or_else(|| VocabError::MalformedRecord {
            line,
            reason: format!("mastery level {raw_level:?} is not 0, 1 or 2"),
        })?;

    Ok((word.to_string(), WordRecord::new(meaning, mastery)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn words(store: &VocabularyStore) -> Vec<&str> {
        store.iter().map(|(word, _)| word).collect()
    }

    fn strict(content: &str) -> Result<VocabularyStore> {
        VocabularyStore::parse(content, LoadPolicy::Strict)
    }

    #[test]
    fn parse_rows_in_order() {
        let store = strict("cat,ねこ,0\ndog,いぬ,2\n").unwrap();
        assert_eq!(words(&store), vec!["cat", "dog"]);
        assert_eq!(store.get("cat"), Some(&WordRecord::new("ねこ", MasteryLevel::Unseen)));
        assert_eq!(store.level_of("dog"), Some(MasteryLevel::Mastered));
    }

    #[test]
    fn parse_skips_blank_lines() {
        let store = strict("cat,ねこ,0\n\n   \ndog,いぬ,1").unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn reject_wrong_arity() {
        let err = strict("cat,ねこ,0\ndog,いぬ\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed record at line 2: expected 3 fields, found 2"
        );
    }

    #[test]
    fn malformed_line_counts_blank_lines() {
        let err = strict("cat,ねこ,0\n\ndog,いぬ\n").unwrap_err();
        assert_eq!(
            err.to_string(),
            "malformed record at line 3: expected 3 fields, found 2"
        );

        let err = strict("\n\ncat,ねこ,0\n  \n\n\ncat,猫,1\n").unwrap_err();
        assert!(matches!(err, VocabError::MalformedRecord { line: 7, .. }));
    }

    #[test]
    fn malformed_line_counts_crlf_rows() {
        let err = strict("cat,ねこ,0\r\n\r\nfox,きつね,5\r\n").unwrap_err();
        assert!(matches!(err, VocabError::MalformedRecord { line: 3, .. }));
    }

    #[test]
    fn reject_empty_word() {
        let err = strict(" ,ねこ,0").unwrap_err();
        assert!(matches!(err, VocabError::MalformedRecord { line: 1, .. }));
    }

    #[test]
    fn reject_out_of_range_level() {
        for row in ["cat,ねこ,3", "cat,ねこ,-1", "cat,ねこ,learning"] {
            let err = strict(row).unwrap_err();
            assert!(matches!(err, VocabError::MalformedRecord { .. }), "{row}");
        }
    }

    #[test]
    fn reject_duplicate_word() {
        let err = strict("cat,ねこ,0\ncat,猫,1").unwrap_err();
        assert!(matches!(err, VocabError::MalformedRecord { line: 2, .. }));
    }

    #[test]
    fn skip_malformed_keeps_good_rows() {
        let content = "cat,ねこ,0\nbroken\ndog,いぬ,9\nbird,とり,1\ncat,猫,2";
        let store = VocabularyStore::parse(content, LoadPolicy::SkipMalformed).unwrap();
        assert_eq!(words(&store), vec!["cat", "bird"]);
        assert_eq!(store.level_of("cat"), Some(MasteryLevel::Unseen));
    }

    #[test]
    fn load_missing_file_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.csv");
        let err = VocabularyStore::load(path, LoadPolicy::Strict).unwrap_err();
        assert!(matches!(err, VocabError::SourceUnavailable { .. }));
        assert!(err.is_recoverable());
    }

    #[test]
    fn write_matches_row_format() {
        let store = VocabularyStore::from_records([(
            "apple",
            WordRecord::new("りんご", MasteryLevel::Unseen),
        )])
        .unwrap();
        let mut buf = Vec::new();
        store.write_to(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "apple,りんご,0\n");
    }

    #[test]
    fn load_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.csv");
        std::fs::write(&path, "cat,ねこ,0\ndog,いぬ,2\nfox,きつね,1\n").unwrap();

        let original = VocabularyStore::load(&path, LoadPolicy::Strict).unwrap();
        original.save(&path).unwrap();
        let reloaded = VocabularyStore::load(&path, LoadPolicy::Strict).unwrap();

        assert_eq!(reloaded, original);
        assert_eq!(words(&reloaded), vec!["cat", "dog", "fox"]);
    }

    #[cfg(unix)]
    #[test]
    fn save_keeps_existing_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.csv");
        std::fs::write(&path, "cat,ねこ,0\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = VocabularyStore::load(&path, LoadPolicy::Strict).unwrap();
        store.save(&path).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn failed_save_reports_sink_unavailable_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        // The destination is an existing directory, so the final rename fails.
        let target = dir.path().join("words.csv");
        std::fs::create_dir(&target).unwrap();

        let store = VocabularyStore::from_records([(
            "cat",
            WordRecord::new("ねこ", MasteryLevel::Unseen),
        )])
        .unwrap();
        let err = store.save(&target).unwrap_err();

        assert!(matches!(err, VocabError::SinkUnavailable { .. }));
        assert!(target.is_dir());
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("words.csv");
        let err = VocabularyStore::new().save(&target).unwrap_err();
        assert!(matches!(err, VocabError::SinkUnavailable { .. }));
    }

    #[test]
    fn set_mastery_unknown_word() {
        let mut store = VocabularyStore::new();
        let err = store.set_mastery("ghost", MasteryLevel::Mastered).unwrap_err();
        assert!(matches!(err, VocabError::UnknownWord(ref w) if w == "ghost"));
    }

    #[test]
    fn set_mastery_returns_previous_level() {
        let mut store = VocabularyStore::parse("cat,ねこ,0", LoadPolicy::Strict).unwrap();
        let previous = store.set_mastery("cat", MasteryLevel::Learning).unwrap();
        assert_eq!(previous, MasteryLevel::Unseen);
        assert_eq!(store.level_of("cat"), Some(MasteryLevel::Learning));
    }

    #[test]
    fn counts_by_category() {
        let store =
            VocabularyStore::parse("a,1,0\nb,2,0\nc,3,1\nd,4,2", LoadPolicy::Strict).unwrap();
        assert_eq!(store.count_by_category(Category::All), 4);
        assert_eq!(store.count_by_category(Category::Unseen), 2);
        assert_eq!(store.count_by_category(Category::Learning), 1);
        assert_eq!(store.count_by_category(Category::Mastered), 1);

        let counts: Vec<usize> = store.category_counts().iter().map(|c| c.count).collect();
        assert_eq!(counts, vec![4, 2, 1, 1]);
    }

    #[test]
    fn all_mastered_requires_words() {
        assert!(!VocabularyStore::new().all_mastered());
        let store = VocabularyStore::parse("a,1,2\nb,2,2", LoadPolicy::Strict).unwrap();
        assert!(store.all_mastered());
    }
}
