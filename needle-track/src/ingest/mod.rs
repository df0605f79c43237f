//! Ingestion Reconciler: apply a batch of exported records to the store.
//!
//! A batch is normalized in full before anything is written, so an aborted
//! batch leaves the store untouched. Records are then applied one at a time,
//! in input order, each in its own store transaction.

pub mod normalize;

pub use normalize::{LinkTemplate, MalformedReason, Normalizer};

use crate::config::IngestConfig;
use crate::store::{IncomingRecord, Outcome, RecordStore, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("malformed record at index {index}: {reason}")]
    Malformed {
        index: usize,
        reason: MalformedReason,
    },
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path} as a JSON array of records: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What to do with a record that fails normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnMalformed {
    /// Reject the whole batch; nothing is written.
    #[default]
    Abort,
    /// Leave the record out and count it in [`IngestReport::skipped`].
    Skip,
}

/// Outcome counts for one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub inserted: usize,
    pub updated: usize,
    pub no_change: usize,
    pub skipped: usize,
}

impl IngestReport {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Inserted => self.inserted += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::NoChange => self.no_change += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.no_change + self.skipped
    }
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "inserted={} updated={} no_change={} skipped={}",
            self.inserted, self.updated, self.no_change, self.skipped
        )
    }
}

/// Read a JSON export (a top-level array of objects) fully into memory.
pub fn load_batch(path: &Path) -> Result<Vec<Value>, IngestError> {
    let content = std::fs::read_to_string(path).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| IngestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub struct Reconciler<'s> {
    store: &'s mut RecordStore,
    normalizer: Normalizer,
    on_malformed: OnMalformed,
}

impl<'s> Reconciler<'s> {
    pub fn new(store: &'s mut RecordStore) -> Self {
        Self {
            store,
            normalizer: Normalizer::default(),
            on_malformed: OnMalformed::default(),
        }
    }

    pub fn from_config(store: &'s mut RecordStore, config: &IngestConfig) -> Self {
        Self::new(store)
            .with_normalizer(Normalizer::new(
                config.id_field.clone(),
                LinkTemplate::new(config.link_template.clone()),
            ))
            .on_malformed(config.on_malformed)
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn on_malformed(mut self, policy: OnMalformed) -> Self {
        self.on_malformed = policy;
        self
    }

    pub fn ingest_file(&mut self, path: &Path) -> Result<IngestReport, IngestError> {
        let batch = load_batch(path)?;
        info!(
            "[Ingest] {} records read from {} (keyed by '{}')",
            batch.len(),
            path.display(),
            self.normalizer.id_field()
        );
        self.ingest(batch)
    }

    pub fn ingest(&mut self, batch: Vec<Value>) -> Result<IngestReport, IngestError> {
        let mut report = IngestReport::default();
        let records = self.normalize_batch(batch, &mut report)?;

        for record in &records {
            let outcome = self.store.upsert(record)?;
            debug!("[Ingest] {} {}", record.object_id, outcome);
            report.record(outcome);
        }

        info!("[Ingest] batch applied: {}", report);
        Ok(report)
    }

    fn normalize_batch(
        &self,
        batch: Vec<Value>,
        report: &mut IngestReport,
    ) -> Result<Vec<IncomingRecord>, IngestError> {
        let mut records = Vec::with_capacity(batch.len());
        for (index, raw) in batch.into_iter().enumerate() {
            match self.normalizer.normalize(raw) {
                Ok(record) => records.push(record),
                Err(reason) => match self.on_malformed {
                    OnMalformed::Abort => return Err(IngestError::Malformed { index, reason }),
                    OnMalformed::Skip => {
                        warn!("[Ingest] skipping record {}: {}", index, reason);
                        report.skipped += 1;
                    }
                },
            }
        }
        Ok(records)
    }
}
