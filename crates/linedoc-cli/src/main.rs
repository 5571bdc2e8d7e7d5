use anyhow::{Context, Result, bail};
use linedoc_config::Config;
use linedoc_engine::{BackupPolicy, CaretPosition, Document, DocumentOptions, EditMode};
use std::{env, path::PathBuf, process};

const USAGE: &str = "\
Usage: linedoc-cli <file> <command>

Commands:
  show                          print the numbered lines
  insert <row> <col> <text>     insert text (\\n starts a new line)
  replace-line <row> <text>     replace one line
  remove-lines <min> <max>      remove rows min..=max
  normalize                     rewrite the file with normalised line endings";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Show,
    Insert { at: CaretPosition, text: String },
    ReplaceLine { row: usize, text: String },
    RemoveLines { min: usize, max: usize },
    Normalize,
}

impl Command {
    fn parse(args: &[String]) -> Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            bail!("missing command");
        };
        let command = match (name.as_str(), rest) {
            ("show", []) => Command::Show,
            ("insert", [row, col, text]) => Command::Insert {
                at: CaretPosition::new(parse_index("row", row)?, parse_index("col", col)?),
                text: unescape(text),
            },
            ("replace-line", [row, text]) => Command::ReplaceLine {
                row: parse_index("row", row)?,
                text: unescape(text),
            },
            ("remove-lines", [min, max]) => Command::RemoveLines {
                min: parse_index("min", min)?,
                max: parse_index("max", max)?,
            },
            ("normalize", []) => Command::Normalize,
            _ => bail!("unknown command or wrong arguments: {}", args.join(" ")),
        };
        Ok(command)
    }

    fn edits(&self) -> bool {
        !matches!(self, Command::Show)
    }
}

fn parse_index(name: &str, value: &str) -> Result<usize> {
    value
        .parse()
        .with_context(|| format!("{name} must be a non-negative number, got '{value}'"))
}

/// Turn the two-char sequence `\n` into a line break
fn unescape(text: &str) -> String {
    text.replace("\\n", "\n")
}

fn document_options(config: &Config) -> DocumentOptions {
    let backup = config.backup.enabled.then(|| BackupPolicy {
        root: config.backup.directory.clone(),
        interval: config.backup.interval(),
        max_count: config.backup.max_count,
    });
    DocumentOptions {
        // Each command saves explicitly once
        auto_save: false,
        history_capacity: config.history_capacity,
        backup,
    }
}

/// Check a position against the document so bad input is an error, not a panic
fn check_position(doc: &Document, at: CaretPosition) -> Result<()> {
    check_row(doc, at.row)?;
    let len = doc.line(at.row).chars().count();
    if at.col > len {
        bail!("column {} is past the end of row {} ({len} chars)", at.col, at.row);
    }
    Ok(())
}

fn check_row(doc: &Document, row: usize) -> Result<()> {
    if row >= doc.line_count() {
        bail!("row {row} is past the end of the file ({} lines)", doc.line_count());
    }
    Ok(())
}

fn apply(doc: &mut Document, command: &Command) -> Result<()> {
    match command {
        Command::Show => {
            let width = doc.line_count().to_string().len();
            for (row, line) in doc.lines().iter().enumerate() {
                println!("{row:>width$} | {line}");
            }
        }
        Command::Insert { at, text } => {
            check_position(doc, *at)?;
            let end = doc.insert(*at, text);
            log::info!("inserted text at {at}, now ending at {end}");
        }
        Command::ReplaceLine { row, text } => {
            check_row(doc, *row)?;
            doc.replace_line(*row, text, EditMode::Recorded);
        }
        Command::RemoveLines { min, max } => {
            if min > max {
                bail!("row range {min}..={max} is inverted");
            }
            check_row(doc, *max)?;
            doc.remove_lines(*min, *max, EditMode::Recorded);
        }
        Command::Normalize => {}
    }
    Ok(())
}

fn run(path: PathBuf, command: Command) -> Result<()> {
    let config_path = Config::config_path();
    log::info!("Config path: {}", config_path.display());
    let config = Config::load()
        .with_context(|| format!("failed to load config file {}", config_path.display()))?
        .unwrap_or_default();

    let mut doc = Document::load_with_options(&path, document_options(&config))
        .with_context(|| format!("failed to open {}", path.display()))?;

    apply(&mut doc, &command)?;

    if command.edits() {
        doc.save()
            .with_context(|| format!("failed to save {}", path.display()))?;
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some((path, rest)) = args.split_first() else {
        eprintln!("{USAGE}");
        process::exit(1);
    };

    let command = match Command::parse(rest) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("Error: {e:#}");
            eprintln!("{USAGE}");
            process::exit(1);
        }
    };

    if let Err(e) = run(PathBuf::from(path), command) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
