//! Interactive study session over stdin/stdout.

use anyhow::Context;
use clap::Args;
use std::io::{self, BufRead, Write};
use tracing::info;
use vocab_core::{AdvanceMode, Category, MasteryLevel, Shown, VocabEngine};

use super::{category_names, format_counts, CommandError, SourceArgs};
use crate::config::{parse_category, SettingsArgs};

#[derive(Debug, Clone, Args)]
pub struct StudyArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Category to start with
    #[arg(long, value_parser = parse_category, default_value = "all")]
    pub category: Category,
}

/// A grade as typed: a level name, or a number checked by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradeArg {
    Level(MasteryLevel),
    Raw(i64),
}

impl GradeArg {
    fn parse(arg: &str) -> Result<Self, CommandError> {
        if let Ok(raw) = arg.parse::<i64>() {
            return Ok(Self::Raw(raw));
        }
        MasteryLevel::parse(arg)
            .map(Self::Level)
            .ok_or_else(|| CommandError::BadLevel(arg.to_string()))
    }
}

/// One line typed at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Next,
    Random,
    Show,
    Grade(GradeArg),
    Category(Category),
    Mode(AdvanceMode),
    Counts,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            return Ok(None);
        };
        let arg = parts.next();

        let command = match name.to_ascii_lowercase().as_str() {
            "n" | "next" => Self::Next,
            "r" | "random" => Self::Random,
            "s" | "show" => Self::Show,
            "g" | "grade" => {
                let arg = arg.ok_or(CommandError::MissingArgument("grade"))?;
                Self::Grade(GradeArg::parse(arg)?)
            }
            "c" | "category" => {
                let arg = arg.ok_or(CommandError::MissingArgument("category"))?;
                let category =
                    Category::parse(arg).ok_or_else(|| CommandError::BadCategory(arg.to_string()))?;
                Self::Category(category)
            }
            "m" | "mode" => {
                let arg = arg.ok_or(CommandError::MissingArgument("mode"))?;
                let mode = AdvanceMode::parse(arg)
                    .ok_or_else(|| CommandError::BadMode(arg.to_string()))?;
                Self::Mode(mode)
            }
            "counts" => Self::Counts,
            "h" | "help" | "?" => Self::Help,
            "q" | "quit" | "exit" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}

pub fn run(args: StudyArgs) -> anyhow::Result<()> {
    let path = args.source.words;
    let settings = args.settings.resolve()?;
    let mut engine = VocabEngine::initialize(&path, settings)
        .with_context(|| format!("failed to load {}", path.display()))?;
    engine.select_category(args.category);

    let stdin = io::stdin();
    let stdout = io::stdout();
    drive(&mut engine, stdin.lock(), stdout.lock())?;

    engine
        .persist(&path)
        .with_context(|| format!("failed to save {}", path.display()))?;
    info!(path = %path.display(), "session saved");
    Ok(())
}

/// Read commands until `quit` or end of input.
pub fn drive<R: BufRead, W: Write>(
    engine: &mut VocabEngine,
    input: R,
    mut out: W,
) -> anyhow::Result<()> {
    writeln!(out, "{}", format_counts(&engine.categories()))?;
    show(&mut out, engine.current())?;

    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next() else {
            writeln!(out)?;
            break;
        };
        let command = match Command::parse(&line?) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                writeln!(out, "{err}")?;
                continue;
            }
        };

        match command {
            Command::Next => show(&mut out, engine.advance())?,
            Command::Random => show(&mut out, engine.advance_random(&mut rand::rng()))?,
            Command::Show => match engine.reveal() {
                Some((word, meaning)) => writeln!(out, "{word} - {meaning}")?,
                None => writeln!(out, "no word selected")?,
            },
            Command::Grade(arg) => grade(engine, &mut out, arg)?,
            Command::Category(category) => {
                let size = engine.select_category(category).len();
                writeln!(out, "{category}: {size} words")?;
                show(&mut out, engine.current())?;
            }
            Command::Mode(mode) => {
                engine.set_advance_mode(mode);
                writeln!(out, "mode: {}", mode_name(mode))?;
                show(&mut out, engine.current())?;
            }
            Command::Counts => writeln!(out, "{}", format_counts(&engine.categories()))?,
            Command::Help => print_help(&mut out)?,
            Command::Quit => break,
        }
    }
    Ok(())
}

/// Grade the shown word, then move on the way test mode does.
fn grade<W: Write>(
    engine: &mut VocabEngine,
    out: &mut W,
    arg: GradeArg,
) -> anyhow::Result<()> {
    let graded = match arg {
        GradeArg::Level(level) => engine.grade_current(level),
        GradeArg::Raw(raw) => engine.grade_current_raw(raw),
    };
    let result = match graded {
        Ok(Some(result)) => result,
        Ok(None) => {
            writeln!(out, "no word selected")?;
            return Ok(());
        }
        Err(err) => {
            writeln!(out, "{err}")?;
            return Ok(());
        }
    };
    writeln!(out, "{}: {} -> {}", result.word, result.previous, result.level)?;

    // A refresh may already have moved the cursor off the graded word.
    let moved = engine.current().word() != Some(result.word.as_str());
    if moved {
        Ok(show(out, engine.current())?)
    } else {
        Ok(show(out, engine.advance())?)
    }
}

fn show<W: Write>(out: &mut W, shown: Shown<'_>) -> io::Result<()> {
    match shown {
        Shown::Word(word) => writeln!(out, "{word}"),
        Shown::NoWords => writeln!(out, "(no words)"),
        Shown::Exhausted => writeln!(out, "(all words mastered)"),
    }
}

fn mode_name(mode: AdvanceMode) -> &'static str {
    match mode {
        AdvanceMode::Sequential => "sequential",
        AdvanceMode::SequentialSkip => "sequential-skip",
        AdvanceMode::Random => "random",
    }
}

fn print_help<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "next | n              show the next word")?;
    writeln!(out, "random | r            show a random word")?;
    writeln!(out, "show | s              reveal the meaning")?;
    writeln!(out, "grade | g <level>     unseen, learning, mastered (or 0-2)")?;
    writeln!(out, "category | c <name>   {}", category_names())?;
    writeln!(out, "mode | m <mode>       sequential, sequential-skip, random")?;
    writeln!(out, "counts                words per category")?;
    writeln!(out, "quit | q              save and exit")
}
