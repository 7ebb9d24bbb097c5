//! Result values as seen by the engine.
//!
//! The engine never inspects graph values; it only moves them between the
//! execution collaborator and the response sink. JSON values are a convenient
//! transport-neutral carrier for that.

/// A single protocol value.
pub type Value = serde_json::Value;

/// String-keyed metadata attached to requests and responses.
pub type Metadata = serde_json::Map<String, Value>;

/// One row of a result stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub values: Vec<Value>,
}

impl Record {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }
}

impl From<Vec<Value>> for Record {
    fn from(values: Vec<Value>) -> Self {
        Self { values }
    }
}
