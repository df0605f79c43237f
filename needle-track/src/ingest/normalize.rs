//! Turn raw survey export objects into [`IncomingRecord`]s.

use crate::store::IncomingRecord;
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_ID_FIELD: &str = "objectId";
pub const DEFAULT_LINK_TEMPLATE: &str = "https://lasair-ztf.lsst.ac.uk/objects/{object_id}/";
pub const LINK_PLACEHOLDER: &str = "{object_id}";

/// Why a raw record could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedReason {
    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),
    #[error("missing identifier field '{0}'")]
    MissingId(String),
    #[error("identifier field '{0}' must be a non-empty string")]
    InvalidId(String),
}

/// URL template with a single `{object_id}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTemplate(String);

impl LinkTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn render(&self, object_id: &str) -> String {
        self.0.replace(LINK_PLACEHOLDER, object_id)
    }
}

impl Default for LinkTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_LINK_TEMPLATE)
    }
}

/// Pure shape conversion; performs no I/O.
#[derive(Debug, Clone)]
pub struct Normalizer {
    id_field: String,
    link: LinkTemplate,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_ID_FIELD, LinkTemplate::default())
    }
}

impl Normalizer {
    pub fn new(id_field: impl Into<String>, link: LinkTemplate) -> Self {
        Self {
            id_field: id_field.into(),
            link,
        }
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    /// Split `raw` into its identifier and the remaining properties, and
    /// derive the record link from the identifier.
    pub fn normalize(&self, raw: Value) -> Result<IncomingRecord, MalformedReason> {
        let mut object = match raw {
            Value::Object(map) => map,
            other => return Err(MalformedReason::NotAnObject(json_kind(&other))),
        };

        let object_id = match object.remove(&self.id_field) {
            Some(Value::String(id)) if !id.trim().is_empty() => id,
            Some(_) => return Err(MalformedReason::InvalidId(self.id_field.clone())),
            None => return Err(MalformedReason::MissingId(self.id_field.clone())),
        };

        let link = self.link.render(&object_id);
        Ok(IncomingRecord::new(object_id, Value::Object(object), link))
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
