use std::fmt;
use std::io::Write;

use clap::{Parser, Subcommand};
use lesson_core::model::GameRules;
use services::{AppServices, CatalogLocation};
use tracing_subscriber::EnvFilter;

mod terminal;

#[derive(Debug)]
enum ArgsError {
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Parser)]
#[command(name = "lesson-player", version, about = "Hardware lessons with lives, score and practice")]
struct Cli {
    /// Lesson catalog: a JSON file path or an http(s) URL
    #[arg(long, env = "LEARN_CATALOG", default_value = "lessons.json", global = true)]
    catalog: String,

    /// SQLite database holding saved progress
    #[arg(long, env = "LEARN_DB_URL", default_value = "sqlite://progress.sqlite3", global = true)]
    db: String,

    /// Lives per lesson attempt
    #[arg(long, env = "LEARN_LIVES", global = true)]
    lives: Option<u32>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Play interactively (default)
    Play,
    /// Print the skill map and exit
    Status,
    /// Forget all saved progress
    Reset,
}

fn log_filter() -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
    Ok(EnvFilter::from_default_env()
        .add_directive("lesson_player=info".parse()?)
        .add_directive("services=info".parse()?)
        .add_directive("storage=info".parse()?))
}

fn init_tracing() -> Result<(), tracing_subscriber::filter::ParseError> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter()?)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path = std::path::Path::new(trimmed.strip_prefix("sqlite:").unwrap_or(trimmed));
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let invalid = || ArgsError::InvalidDbUrl {
        raw: db_url.to_string(),
    };
    let path = db_url.strip_prefix("sqlite://").ok_or_else(invalid)?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(invalid().into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let rules = match cli.lives {
        Some(lives) => GameRules::standard().with_starting_lives(lives)?,
        None => GameRules::standard(),
    };

    // SQLite file preparation stays in the binary glue.
    let db_url = normalize_sqlite_url(&cli.db);
    prepare_sqlite_file(&db_url)?;
    tracing::info!(db = %db_url, catalog = %cli.catalog, lives = rules.starting_lives(), "starting");

    let source = CatalogLocation::parse(&cli.catalog).source();
    let app = AppServices::new_sqlite(&db_url, source.as_ref(), rules).await?;
    let mut game = app.start_game().await?;

    match cli.command.unwrap_or(Command::Play) {
        Command::Play => terminal::play(game).await?,
        Command::Status => {
            let mut out = std::io::stdout().lock();
            terminal::draw(&game.render(), &mut out)?;
            out.flush()?;
        }
        Command::Reset => {
            let _ = game.reset_progress().await?;
            println!("Progress reset.");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = init_tracing() {
        eprintln!("invalid log filter: {err}");
    }

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_urls_are_normalized() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/progress.sqlite3"),
            "sqlite:///tmp/progress.sqlite3"
        );
        assert_eq!(
            normalize_sqlite_url("sqlite:/data/progress.sqlite3"),
            "sqlite:///data/progress.sqlite3"
        );
        assert!(normalize_sqlite_url("progress.sqlite3").starts_with("sqlite:///"));
    }

    #[test]
    fn prepare_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("progress.sqlite3");
        let url = format!("sqlite://{}", path.display());

        prepare_sqlite_file(&url).unwrap();
        assert!(path.exists());
        assert!(prepare_sqlite_file("postgres://nope").is_err());
    }

    #[test]
    fn cli_defaults_to_play() {
        let cli = Cli::try_parse_from(["lesson-player", "--lives", "3"]).unwrap();
        assert_eq!(cli.command, None);
        assert_eq!(cli.lives, Some(3));

        let cli = Cli::try_parse_from(["lesson-player", "status", "--catalog", "x.json"]).unwrap();
        assert_eq!(cli.command, Some(Command::Status));
        assert_eq!(cli.catalog, "x.json");
    }

    #[test]
    fn default_filter_covers_the_binary() {
        let filter = log_filter().unwrap().to_string();
        for target in ["lesson_player=info", "services=info", "storage=info"] {
            assert!(filter.contains(target), "{filter} is missing {target}");
        }
    }
}
