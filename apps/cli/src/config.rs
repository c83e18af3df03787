//! Engine settings resolution: defaults, then a JSON file, then flags.

use anyhow::Context;
use std::path::{Path, PathBuf};
use vocab_core::{AdvanceMode, Category, EngineSettings, LoadPolicy, MasteredExclusion};

/// Flags that override individual settings.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct SettingsArgs {
    /// JSON settings file
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Advance mode: sequential, sequential-skip, random
    #[arg(long, value_parser = parse_mode)]
    pub mode: Option<AdvanceMode>,

    /// Mastered-word exclusion: category-scoped, always
    #[arg(long, value_parser = parse_exclusion)]
    pub exclusion: Option<MasteredExclusion>,

    /// Skip malformed rows instead of refusing to start
    #[arg(long)]
    pub skip_malformed: bool,
}

impl SettingsArgs {
    pub fn resolve(&self) -> anyhow::Result<EngineSettings> {
        let mut settings = match &self.settings {
            Some(path) => read_settings(path)?,
            None => EngineSettings::default(),
        };
        if let Some(mode) = self.mode {
            settings.advance_mode = mode;
        }
        if let Some(exclusion) = self.exclusion {
            settings.mastered_exclusion = exclusion;
        }
        if self.skip_malformed {
            settings.load_policy = LoadPolicy::SkipMalformed;
        }
        Ok(settings)
    }
}

fn read_settings(path: &Path) -> anyhow::Result<EngineSettings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read settings {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("invalid settings in {}", path.display()))
}

pub fn parse_mode(s: &str) -> Result<AdvanceMode, String> {
    AdvanceMode::parse(s).ok_or_else(|| format!("unknown mode: {s}"))
}

pub fn parse_exclusion(s: &str) -> Result<MasteredExclusion, String> {
    MasteredExclusion::parse(s).ok_or_else(|| format!("unknown exclusion policy: {s}"))
}

pub fn parse_category(s: &str) -> Result<Category, String> {
    Category::parse(s).ok_or_else(|| format!("unknown category: {s}"))
}
