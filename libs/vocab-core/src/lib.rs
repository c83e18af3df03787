//! Vocabulary memorization engine.
//!
//! Provides:
//! - Vocabulary store with atomic row-file persistence
//! - Category filtering into working sets
//! - Session cursor (sequential, skipping and random advance)
//! - Mastery update protocol with staleness signalling
//! - A per-session engine facade tying them together

pub mod cursor;
pub mod engine;
pub mod error;
pub mod filter;
pub mod grading;
pub mod store;
pub mod types;

pub use cursor::{CursorState, SessionCursor, Shown};
pub use engine::VocabEngine;
pub use error::{Result, VocabError};
pub use filter::{select, select_filtered, select_shuffled, Filter, WorkingSet};
pub use grading::{apply_grade, apply_raw_grade, UpdateResult};
pub use store::VocabularyStore;
pub use types::{
    AdvanceMode, Category, CategoryCount, EngineSettings, LoadPolicy, MasteredExclusion,
    MasteryLevel, WordRecord,
};
