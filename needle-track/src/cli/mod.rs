//! needle-track CLI module
//!
//! # Commands
//!
//! - `init` - Destructively reset the record store
//! - `ingest` - Reconcile a JSON export into the store
//! - `search` - Look records up by object ID, tag or annotation status
//! - `updates` - List records whose properties changed on ingestion
//! - `comment`, `tag`, `remove`, `annotate` - Manual triage annotations

pub mod commands;
pub mod context;
pub mod output;

pub use context::CliContext;
pub use output::{OutputFormat, OutputFormatter};
