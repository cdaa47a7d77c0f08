pub mod commands;
pub mod config;
pub mod play;
pub mod store;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::store::{JsonFileStore, StoreObserver};

#[derive(Parser)]
#[command(name = "glimmind", about = "Learn term/definition lists in four stages", version)]
pub struct Cli {
    /// Directory holding the list files (overrides GLIMMIND_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a new list
    New {
        /// List name
        name: String,
        /// Face labels, e.g. "English / Spanish"
        concept: String,
        /// Seed the list from a bulk file (one "term, definition" per line)
        #[arg(long)]
        import: Option<PathBuf>,
    },

    /// Append rows from a bulk file to a list
    Import {
        /// List id or name (case-insensitive prefix match)
        list: String,
        /// File with one "term, definition" per line
        file: PathBuf,
    },

    /// Show all lists
    Lists {
        /// Filter by name or concept
        #[arg(long)]
        search: Option<String>,
    },

    /// Show a list's settings, progress and rows
    Show {
        /// List id or name
        list: String,
        /// Filter rows by term or definition
        #[arg(long)]
        search: Option<String>,
    },

    /// Change the term and definition of a row
    Edit {
        /// List id or name
        list: String,
        /// Row number as shown by `show`, or row id
        row: String,
        /// New term
        term: String,
        /// New definition
        definition: String,
    },

    /// Delete a row from a list
    Remove {
        /// List id or name
        list: String,
        /// Row number as shown by `show`, or row id
        row: String,
    },

    /// Change game settings for a list
    Settings {
        /// List id or name
        list: String,
        /// practice or written
        #[arg(long)]
        mode: Option<String>,
        /// normal or reversed
        #[arg(long)]
        flip: Option<String>,
        /// Similarity needed to accept a typed answer, 0 to 1
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Put every association back to the first stage
    Reset {
        /// List id or name
        list: String,
    },

    /// Play a list interactively
    Play {
        /// List id or name
        list: String,
    },

    /// Delete a list
    Delete {
        /// List id or name
        list: String,
    },
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let mut config = Config::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    tracing::debug!(data_dir = %config.data_dir.display(), owner = %config.owner_id, "config loaded");

    let store = JsonFileStore::open(&config.data_dir)
        .with_context(|| format!("failed to open {}", config.data_dir.display()))?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::New {
            name,
            concept,
            import,
        } => {
            commands::new_list(&store, &config, &name, &concept, import.as_deref(), &mut out)?;
        }
        Command::Import { list, file } => {
            commands::import_file(&store, &config, &list, &file, &mut out)?;
        }
        Command::Lists { search } => {
            commands::lists(&store, &config, search.as_deref(), &mut out)?;
        }
        Command::Show { list, search } => {
            commands::show(&store, &config, &list, search.as_deref(), &mut out)?;
        }
        Command::Edit {
            list,
            row,
            term,
            definition,
        } => {
            commands::edit_row(&store, &config, &list, &row, &term, &definition, &mut out)?;
        }
        Command::Remove { list, row } => {
            commands::remove_row(&store, &config, &list, &row, &mut out)?;
        }
        Command::Settings {
            list,
            mode,
            flip,
            threshold,
        } => {
            commands::settings(
                &store,
                &config,
                &list,
                mode.as_deref(),
                flip.as_deref(),
                threshold,
                &mut out,
            )?;
        }
        Command::Reset { list } => {
            commands::reset(&store, &config, &list, &mut out)?;
        }
        Command::Play { list } => {
            let list = commands::resolve(&store, &config.owner_id, &list)?;
            tracing::info!(list_id = %list.id, "starting session");
            let stdin = io::stdin();
            play::run(
                list,
                StoreObserver::new(store.clone()),
                config.feedback_pause,
                stdin.lock(),
                &mut out,
            )?;
        }
        Command::Delete { list } => {
            commands::delete(&store, &config, &list, &mut out)?;
        }
    }

    out.flush()?;
    Ok(())
}
