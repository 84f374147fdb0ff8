//! msgstore - inspect and maintain a message database from the shell.
//!
//! CHANGELOG:
//! - 02/12/2026 - Config file and verbosity flags
//! - 01/27/2026 - Initial CLI skeleton

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::process::ExitCode;

use msgstore::commands::{self, reading::ListOptions, KindArg};
use msgstore::{output, Database, StoreConfig};

/// Inspect and maintain a message database.
#[derive(Parser, Debug)]
#[command(name = "msgstore")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Database path (overrides config file and MSGSTORE_DB_PATH)
    #[arg(long, global = true)]
    db: Option<String>,

    /// JSON config file (default: MSGSTORE_CONFIG)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Compact JSON output (no whitespace)
    #[arg(long, global = true)]
    compact: bool,

    /// Comma-separated field allowlist
    #[arg(long, global = true)]
    fields: Option<String>,

    /// Truncate text fields to this length
    #[arg(long, global = true)]
    max_text_chars: Option<u32>,

    /// Debug logging (RUST_LOG still wins for specific targets)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the message tables
    Init {
        /// Also create minimal contact / group / distribution list tables
        #[arg(long)]
        owner_tables: bool,
    },

    /// Row and starred counts per message table
    Stats,

    /// List one conversation, newest first
    List {
        #[arg(value_enum)]
        kind: KindArg,

        /// Contact identity, or group / distribution list id
        owner: String,

        /// Only inbound unread messages
        #[arg(long)]
        unread: bool,

        /// Page size
        #[arg(short = 'n', long)]
        page_size: Option<u32>,

        /// Only messages with an id below this one (pagination cursor)
        #[arg(long)]
        before: Option<i64>,

        /// Comma-separated message types (e.g. text,file)
        #[arg(long, value_delimiter = ',')]
        types: Vec<String>,

        /// Comma-separated contents types (e.g. image,gif)
        #[arg(long, value_delimiter = ',')]
        contents_types: Vec<String>,

        /// Include status messages
        #[arg(long)]
        with_status: bool,

        /// Hide media that has not been downloaded
        #[arg(long)]
        downloaded_only: bool,
    },

    /// Search message text and captions (no query lists everything searchable)
    Search {
        query: Option<String>,

        /// Restrict to one conversation kind
        #[arg(long, value_enum)]
        kind: Option<KindArg>,

        /// Include archived conversations
        #[arg(long)]
        include_archived: bool,

        /// Only starred messages
        #[arg(long)]
        starred: bool,

        /// Oldest first
        #[arg(long)]
        asc: bool,
    },

    /// Mark interrupted outgoing file uploads as failed
    Recover,

    /// Clear the starred tag
    UnstarAll {
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let output_controls = output::OutputControls {
        json: cli.json,
        compact: cli.compact,
        fields: cli.fields.clone(),
        max_text_chars: cli.max_text_chars,
    };

    let config = StoreConfig::resolve(cli.db.as_deref(), cli.config.as_deref())
        .context("Failed to resolve configuration")?;
    let db = Database::open(&config)
        .with_context(|| format!("Failed to open message database at {:?}", config.db_path))?;

    match cli.command {
        Command::Init { owner_tables } => {
            commands::maintenance::init(&db, owner_tables, &output_controls)
        }
        Command::Stats => commands::maintenance::stats(&db, &output_controls),
        Command::List {
            kind,
            owner,
            unread,
            page_size,
            before,
            types,
            contents_types,
            with_status,
            downloaded_only,
        } => {
            let options = ListOptions {
                unread,
                page_size,
                before,
                types,
                contents_types,
                with_status,
                downloaded_only,
            };
            commands::reading::list(&db, kind, &owner, &options, &output_controls)
        }
        Command::Search { query, kind, include_archived, starred, asc } => {
            commands::reading::search(
                &db,
                query.as_deref(),
                kind,
                include_archived,
                starred,
                asc,
                &output_controls,
            )
        }
        Command::Recover => commands::maintenance::recover(&db, &output_controls),
        Command::UnstarAll { kind } => {
            commands::maintenance::unstar_all(&db, kind, &output_controls)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let json = cli.json;
    match run(cli) {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            if json {
                println!("{}", output::format_error(&format!("{e:#}")));
            } else {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::from(1)
        }
    }
}
