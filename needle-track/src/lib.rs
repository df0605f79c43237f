// NEEDLE-TRACK Library
// Transient Recognition, Annotation, and Classification Kit

pub mod cli;
pub mod config;
pub mod ingest;
pub mod store;

pub use config::NeedleConfig;
pub use ingest::{IngestError, IngestReport, OnMalformed, Reconciler};
pub use store::{
    Comment, IncomingRecord, Outcome, RecordStore, StoreError, TagCode, TagMatch, TransientRecord,
};
