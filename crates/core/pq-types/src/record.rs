//! Opaque row records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of the source file, carried as an opaque JSON value.
///
/// The pipeline never looks inside a record. It counts records, groups them
/// into batches and hands each one to a publisher, which serializes it into
/// a message body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Value);

impl Record {
    /// Wraps a decoded row.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Returns the decoded row.
    #[inline]
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Consumes the record, returning the decoded row.
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Serializes the record into a message body.
    pub fn to_body(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.0)
    }
}

impl From<Value> for Record {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
