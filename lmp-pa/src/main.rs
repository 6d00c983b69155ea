//! lmp-pa (Progress Application) - command-line entry point
//!
//! Records learner progress against the curriculum database and prints the
//! resulting trees and state changes as JSON.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lmp_common::config::{RootFolderInitializer, RootFolderResolver, TomlConfig};
use lmp_common::db::{ensure_learner, init_database};
use lmp_pa::ProgressApp;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use uuid::Uuid;

/// Command-line arguments for lmp-pa
#[derive(Parser, Debug)]
#[command(name = "lmp-pa")]
#[command(about = "Learning mindmap progress application")]
#[command(version)]
struct Args {
    /// Root folder holding the progress database
    #[arg(short, long, global = true)]
    root_folder: Option<PathBuf>,

    /// Database file (relative paths resolve against the root folder)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Log level when RUST_LOG is not set (overrides the config file)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database and schema if missing
    Init,

    /// Register a learner and print its id
    AddLearner {
        /// Display name
        #[arg(long)]
        name: String,
    },

    /// Unlock the first subchapter and lesson of a chapter
    Start {
        #[arg(long)]
        learner: Uuid,
        #[arg(long)]
        chapter: i64,
    },

    /// Mark a lesson done and propagate completion and unlocking
    Complete {
        #[arg(long)]
        learner: Uuid,
        #[arg(long)]
        subchapter: i64,
        #[arg(long)]
        lesson: i64,
    },

    /// Show where the learner would go after a lesson (read-only)
    Next {
        #[arg(long)]
        learner: Uuid,
        #[arg(long)]
        subchapter: i64,
        #[arg(long)]
        lesson: i64,
    },

    /// Print a learner's progress tree
    Tree {
        #[command(subcommand)]
        scope: TreeScope,
    },
}

#[derive(Subcommand, Debug)]
enum TreeScope {
    /// Chapter with its subchapters
    Chapter {
        #[arg(long)]
        learner: Uuid,
        #[arg(long)]
        id: i64,
    },
    /// Subchapter lesson tree
    Subchapter {
        #[arg(long)]
        learner: Uuid,
        #[arg(long)]
        id: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml_config = TomlConfig::load_or_default();

    let log_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| toml_config.logging.level.clone());
    let writer = match &toml_config.logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };
    let default_filter = format!("lmp_pa={0},lmp_common={0}", log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(writer)
        .with_ansi(toml_config.logging.file.is_none())
        .init();

    info!("Starting lmp-pa v{}", env!("CARGO_PKG_VERSION"));

    let root_folder = RootFolderResolver::new("lmp-pa")
        .with_cli_override(args.root_folder.clone())
        .with_toml_config(toml_config.clone())
        .resolve();

    let initializer = RootFolderInitializer::new(root_folder)
        .with_database_file(args.database.clone().or(toml_config.database_file));
    initializer
        .ensure_directory_exists()
        .context("Failed to create root folder")?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    let app = ProgressApp::new(pool);

    match args.command {
        Command::Init => {
            println!("{}", db_path.display());
        }
        Command::AddLearner { name } => {
            let learner = Uuid::new_v4();
            ensure_learner(app.pool(), learner, &name)
                .await
                .context("Failed to register learner")?;
            println!("{}", learner);
        }
        Command::Start { learner, chapter } => {
            let unlocked = app
                .start_chapter(learner, chapter)
                .await
                .with_context(|| format!("Failed to start chapter {}", chapter))?;
            print_json(&unlocked)?;
        }
        Command::Complete {
            learner,
            subchapter,
            lesson,
        } => {
            let outcome = app
                .complete_lesson(learner, subchapter, lesson)
                .await
                .with_context(|| format!("Failed to complete lesson {}", lesson))?;
            print_json(&outcome)?;
        }
        Command::Next {
            learner,
            subchapter,
            lesson,
        } => {
            let next = app.next_lesson(learner, subchapter, lesson).await?;
            print_json(&next)?;
        }
        Command::Tree { scope } => {
            let tree = match scope {
                TreeScope::Chapter { learner, id } => app.chapter_tree(learner, id).await?,
                TreeScope::Subchapter { learner, id } => app.subchapter_tree(learner, id).await?,
            };
            print_json(&tree)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}
