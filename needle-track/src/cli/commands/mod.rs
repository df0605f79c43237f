//! CLI commands module

pub mod annotate;
pub mod ingest;
pub mod init;
pub mod search;

/// Shown whenever a command names an object ID the store does not hold.
pub(crate) fn not_found(object_id: &str) -> String {
    format!("Record not found for object ID: {}", object_id)
}
