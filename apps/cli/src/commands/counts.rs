//! `counts` command: category totals without starting a session.

use anyhow::Context;
use clap::Args;
use vocab_core::{EngineSettings, VocabEngine};

use super::{format_counts, SourceArgs};
use crate::config::SettingsArgs;

#[derive(Debug, Clone, Args)]
pub struct CountsArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: CountsArgs) -> anyhow::Result<()> {
    let settings: EngineSettings = args.settings.resolve()?;
    let engine = VocabEngine::initialize(&args.source.words, settings)
        .with_context(|| format!("failed to load {}", args.source.words.display()))?;

    let counts = engine.categories();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
    } else {
        println!("{}", format_counts(&counts));
    }
    Ok(())
}
