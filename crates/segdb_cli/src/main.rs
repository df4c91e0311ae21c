//! SegDB CLI
//!
//! Command-line access to a directory-backed segment store.
//!
//! # Commands
//!
//! - `add` - Add or replace one segment
//! - `publish` - Replace every segment with the contents of a JSON file
//! - `get` / `get-all` - Fetch segments by ID
//! - `list` - List segments by exact index match, paginated
//! - `query` - Find segments whose filters match the given attributes
//! - `delete` - Remove one segment
//! - `reload` - Reload segments from storage
//! - `info` - Display store statistics
//! - `verify` - Check index consistency
//!
//! # Exit codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success |
//! | 1 | Other failure (bad input file, configuration) |
//! | 2 | Invalid segment (empty ID, filter does not compile) |
//! | 3 | Segment not found |
//! | 4 | Storage failure |
//! | 5 | Index drift |

mod coerce;
mod commands;
mod config;
mod output;

use clap::{Parser, Subcommand};
use coerce::parse_pair;
use config::{FileConfig, Settings};
use output::OutputFormat;
use segdb_codec::Value;
use segdb_core::{CoreError, SegmentStore, StoreConfig};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// SegDB command-line tool.
#[derive(Parser)]
#[command(name = "segdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the segment directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Path to a TOML configuration file
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Output format
    #[arg(global = true, short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add or replace a segment
    Add {
        /// Segment ID
        id: String,

        /// Filter expression
        #[arg(long)]
        filters: String,

        /// Opaque payload
        #[arg(long)]
        data: Option<String>,

        /// Indexed attribute as name=value (repeatable)
        #[arg(short, long = "index", value_parser = parse_pair)]
        index: Vec<(String, Value)>,
    },

    /// Replace all segments with those in a JSON file
    Publish {
        /// JSON array of {id, data, filters, indexes}
        file: PathBuf,
    },

    /// Show one segment
    Get {
        /// Segment ID
        id: String,
    },

    /// Show several segments, skipping unknown IDs
    GetAll {
        /// Segment IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// List segments, optionally by exact index match
    List {
        /// Index filter as name=value (repeatable, OR-ed)
        #[arg(short, long = "index", value_parser = parse_pair)]
        index: Vec<(String, Value)>,

        /// Maximum number of segments (0 = unlimited)
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        limit: i64,

        /// Number of segments to skip
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        offset: i64,
    },

    /// Find segments whose filters match the given attributes
    Query {
        /// Attributes as name=value
        #[arg(value_parser = parse_pair)]
        attrs: Vec<(String, Value)>,

        /// Maximum number of segments (0 = unlimited)
        #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
        limit: i64,
    },

    /// Delete a segment
    Delete {
        /// Segment ID
        id: String,
    },

    /// Reload segments from storage
    Reload,

    /// Display store statistics
    Info,

    /// Check index consistency
    Verify,

    /// Show version information
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(exit_code(e.as_ref()))
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(file, cli.path, cli.verbose);

    // Initialize logging
    let filter = EnvFilter::try_new(&settings.log_level)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Version = cli.command {
        println!("SegDB CLI v{}", env!("CARGO_PKG_VERSION"));
        println!("SegDB Core v{}", segdb_core::VERSION);
        return Ok(());
    }

    let store = SegmentStore::open(StoreConfig::new().storage_path(settings.storage_path))?;
    let format = cli.format;

    match cli.command {
        Commands::Add {
            id,
            filters,
            data,
            index,
        } => commands::add::run(&store, id, filters, data, index, format),
        Commands::Publish { file } => commands::publish::run(&store, &file, format),
        Commands::Get { id } => commands::get::run(&store, &id, format),
        Commands::GetAll { ids } => commands::get::run_all(&store, &ids, format),
        Commands::List {
            index,
            limit,
            offset,
        } => commands::list::run(&store, index, limit, offset, format),
        Commands::Query { attrs, limit } => commands::query::run(&store, attrs, limit, format),
        Commands::Delete { id } => commands::delete::run(&store, &id, format),
        Commands::Reload => commands::reload::run(&store, format),
        Commands::Info => commands::info::run(&store, format),
        Commands::Verify => commands::verify::run(&store, format),
        Commands::Version => Ok(()),
    }
}

/// Maps an error to the process exit code.
fn exit_code(err: &(dyn Error + 'static)) -> u8 {
    match err.downcast_ref::<CoreError>() {
        Some(CoreError::Validation { .. } | CoreError::Compile { .. }) => 2,
        Some(CoreError::NotFound { .. }) => 3,
        Some(CoreError::Storage(_) | CoreError::Codec(_)) => 4,
        Some(CoreError::IndexDrift { .. }) => 5,
        None => 1,
    }
}
