//! Front-end commands driving the vocabulary engine.

pub mod counts;
pub mod study;

use clap::Args;
use std::path::PathBuf;
use thiserror::Error;
use vocab_core::{Category, CategoryCount};

/// Where the word list lives.
#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Word list (`word,meaning,level` rows)
    #[arg(env = "VOCAB_FILE", default_value = "words.csv")]
    pub words: PathBuf,
}

/// A line typed at the study prompt that could not be understood.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command `{0}` (type `help` for a list)")]
    Unknown(String),

    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),

    #[error("not a mastery level: {0} (use unseen, learning, mastered or 0-2)")]
    BadLevel(String),

    #[error("not a category: {0} (use all, unseen, learning or mastered)")]
    BadCategory(String),

    #[error("not a mode: {0} (use sequential, sequential-skip or random)")]
    BadMode(String),
}

/// Category button labels, e.g. `all (3)`.
pub fn format_counts(counts: &[CategoryCount]) -> String {
    counts
        .iter()
        .map(|c| format!("{} ({})", c.category, c.count))
        .collect::<Vec<_>>()
        .join("  ")
}

pub(crate) fn category_names() -> String {
    Category::ALL
        .iter()
        .map(Category::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
