//! The `{success, data?, error?}` envelope every remote call returns

use serde::{Deserialize, Serialize};
use serde_json::Value;

use devboard_core::prelude::*;

/// Outcome of a single remote call.
///
/// Transport failures, daemon-side errors and timeouts all collapse into
/// `success == false` with a human-readable `error`. Callers treat `data` as
/// untrusted and partially shaped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CallResult {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Successful call with no payload (typical for mutations).
    pub fn ok_empty() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Failure reason, with a generic message when the daemon gave none.
    pub fn error_message(&self) -> String {
        self.error
            .clone()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| "unknown error".to_string())
    }
}

impl From<Result<Value>> for CallResult {
    fn from(result: Result<Value>) -> Self {
        match result {
            Ok(Value::Null) => CallResult::ok_empty(),
            Ok(data) => CallResult::ok(data),
            Err(e) => CallResult::failure(e.to_string()),
        }
    }
}
