//! Execution Result Envelope

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata key: model that produced the answer
pub const META_MODEL: &str = "model";
/// Metadata key: tools bound to the invocation (0 in plain mode)
pub const META_TOOLS_USED: &str = "tools_used";
/// Metadata key: grounded records injected into the prompt
pub const META_GROUNDED_RECORDS: &str = "grounded_records";

/// Uniform outcome of [`Agent::execute`](crate::Agent::execute)
///
/// Either `success` with `content`, or failure with a non-empty `error` and
/// empty `content`. `metadata` is always present.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn success(content: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self {
            success: true,
            content: content.into(),
            metadata,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        let mut error = error.into();
        if error.trim().is_empty() {
            error = "unknown error".into();
        }
        Self {
            success: false,
            content: String::new(),
            metadata: Map::new(),
            error: Some(error),
        }
    }

    /// Read an integer metadata entry
    pub fn metadata_count(&self, key: &str) -> Option<u64> {
        self.metadata.get(key).and_then(Value::as_u64)
    }
}
