pub mod commands;
pub mod config;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::counts::CountsArgs;
use crate::commands::study::StudyArgs;

#[derive(Parser)]
#[command(
    name = "vocab-trainer",
    version,
    about = "Vocabulary flashcards with mastery tracking",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    study: StudyArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Study words interactively (the default)
    Study(StudyArgs),

    /// Print how many words are in each category
    Counts(CountsArgs),
}

pub fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Commands::Study(args)) => commands::study::run(args),
        Some(Commands::Counts(args)) => commands::counts::run(args),
        None => commands::study::run(cli.study),
    }
}
