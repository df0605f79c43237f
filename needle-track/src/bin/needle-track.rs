//! needle-track CLI - triage transient candidates in a local record store
//!
//! # Usage
//!
//! ```bash
//! # Reset the store (deletes every record)
//! needle-track init --force
//!
//! # Reconcile a JSON export
//! needle-track ingest alerts.json
//!
//! # Queries
//! needle-track search --object-id ZTF21aaaaaaa
//! needle-track search --tag followup
//! needle-track search --astronote
//! needle-track updates
//!
//! # Triage
//! needle-track comment ZTF21aaaaaaa "host is a bright spiral"
//! needle-track tag ZTF21aaaaaaa followup
//! needle-track remove ZTF21aaaaaaa
//! ```

use clap::{Parser, Subcommand};
use needle_track::cli::commands::{
    annotate::{AnnotateArgs, CommentArgs, RemoveArgs, TagArgs},
    ingest::IngestArgs,
    init::InitArgs,
    search::SearchArgs,
};
use needle_track::cli::{commands, CliContext, OutputFormat};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "needle-track")]
#[command(version)]
#[command(about = "NEEDLE-TRACK: Transient Recognition, Annotation, and Classification Kit", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// SQLite database file (overrides the config file)
    #[arg(long, global = true, value_name = "FILE", env = "NEEDLE_TRACK_DB")]
    db: Option<PathBuf>,

    /// Output format (table, json, plain)
    #[arg(short, long, global = true, default_value = "table")]
    output_format: String,

    /// Suppress status messages
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete all data in the database and initialize a new one
    Init(InitArgs),

    /// Ingest data from a JSON file
    Ingest(IngestArgs),

    /// Search transients
    Search(SearchArgs),

    /// Add a comment to a transient
    Comment(CommentArgs),

    /// Add a tag to a transient: 0 followup, 1 favored, 2 new, 4 removed
    Tag(TagArgs),

    /// Mark a transient as removed
    Remove(RemoveArgs),

    /// Record (or clear) that a transient has an external annotation
    Annotate(AnnotateArgs),

    /// List transients that have been updated
    Updates,
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "needle_track=debug"
    } else {
        "needle_track=warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Parse output format
    let output_format: OutputFormat = cli.output_format.parse().unwrap_or_else(|e| {
        eprintln!("Warning: {}. Using table format.", e);
        OutputFormat::Table
    });

    // Create CLI context
    let ctx = match cli.config {
        Some(path) => CliContext::new(path),
        None => CliContext::with_defaults(),
    };
    let mut ctx = match ctx {
        Ok(ctx) => ctx.with_db_path(cli.db),
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    };

    ctx.output_format = output_format;
    ctx.quiet = cli.quiet;
    ctx.verbose = cli.verbose;

    match &ctx.config_path {
        Some(path) => ctx.debug(&format!("Loaded configuration from {}", path.display())),
        None => ctx.debug("No configuration file found; using defaults"),
    }

    // Execute command
    let result = match cli.command {
        Commands::Init(args) => commands::init::execute(&ctx, args),
        Commands::Ingest(args) => commands::ingest::execute(&ctx, args),
        Commands::Search(args) => commands::search::execute(&ctx, args),
        Commands::Comment(args) => commands::annotate::execute_comment(&ctx, args),
        Commands::Tag(args) => commands::annotate::execute_tag(&ctx, args),
        Commands::Remove(args) => commands::annotate::execute_remove(&ctx, args),
        Commands::Annotate(args) => commands::annotate::execute_annotate(&ctx, args),
        Commands::Updates => commands::search::execute_updates(&ctx),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
