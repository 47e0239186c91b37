use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use quiz_core::model::SessionId;
use services::{Clock, ConversationService, QuizConfig};
use storage::repository::Storage;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "quiz", about = "Answer quiz questions one message at a time")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Chat with the quiz bot on stdin/stdout.
    Chat(ChatArgs),
    /// Delete a stored session so the quiz starts over.
    Reset(SessionArgs),
}

#[derive(Debug, Args)]
struct SessionArgs {
    /// SQLite URL or file path for session storage.
    #[arg(long = "db", env = "QUIZ_DB_URL", default_value = "sqlite://quiz.sqlite3")]
    db_url: String,

    /// Session to continue.
    #[arg(long, default_value = "1")]
    session_id: SessionId,
}

#[derive(Debug, Args)]
struct ChatArgs {
    #[command(flatten)]
    session: SessionArgs,

    /// TOML question file; the built-in Python quiz is used when omitted.
    #[arg(long, env = "QUIZ_CONFIG")]
    config: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| format!("invalid --db value: {db_url}"))?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(format!("invalid --db value: {db_url}").into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
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

async fn open_storage(args: &SessionArgs) -> Result<Storage, Box<dyn std::error::Error>> {
    let db_url = normalize_sqlite_url(&args.db_url);
    prepare_sqlite_file(&db_url)?;
    Ok(Storage::sqlite(&db_url).await?)
}

async fn chat(args: ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => QuizConfig::load(path)?,
        None => QuizConfig::default(),
    };
    let storage = open_storage(&args.session).await?;
    let service = ConversationService::new(Clock::system(), Arc::new(config), storage.sessions);
    let session_id = args.session.session_id;

    tracing::info!(%session_id, "chat started");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let turn = service.handle_message(session_id, &line).await?;
        for reply in &turn.replies {
            println!("{reply}");
        }
        if turn.progress.is_complete {
            break;
        }
    }

    Ok(())
}

async fn reset(args: SessionArgs) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open_storage(&args).await?;
    let service = ConversationService::new(
        Clock::system(),
        Arc::new(QuizConfig::default()),
        storage.sessions,
    );
    let session_id = args.session_id;

    if service.reset(session_id).await? {
        println!("session {session_id} reset");
    } else {
        println!("session {session_id} had no stored state");
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Chat(args) => chat(args).await,
        Command::Reset(args) => reset(args).await,
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
