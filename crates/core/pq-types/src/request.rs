//! Inbound unit of work and its response.

use serde::{Deserialize, Serialize};

/// A request to republish every row of a set of objects in one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRequest {
    /// Bucket holding the objects
    pub bucket: String,

    /// Object keys, processed in order
    pub paths: Vec<String>,
}

impl ProcessRequest {
    /// Creates a new request.
    pub fn new(bucket: impl Into<String>, paths: Vec<String>) -> Self {
        Self {
            bucket: bucket.into(),
            paths,
        }
    }
}

/// Response for a fully successful request.
///
/// Echoes the request's paths; there is no partial-success shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessResponse {
    /// Paths that were processed
    pub paths: Vec<String>,
}
