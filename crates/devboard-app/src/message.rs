//! Inbound command messages posted by rendered tab scripts
//!
//! Wire shape: `{"command": "...", "tabId": "...", ...payload}`. The payload
//! is as untrusted as daemon data, so argument access goes through
//! [`PayloadExt`] and defaults instead of failing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use devboard_core::prelude::*;
use devboard_core::PayloadExt;

/// A command message routed by the host to a tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub command: String,
    /// Tab that owns the DOM subtree the message came from, if known
    #[serde(
        default,
        rename = "tabId",
        alias = "tab_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub tab_id: Option<String>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl InboundMessage {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            tab_id: None,
            payload: Map::new(),
        }
    }

    /// Builder: address the message to a specific tab.
    pub fn for_tab(mut self, tab_id: impl Into<String>) -> Self {
        self.tab_id = Some(tab_id.into());
        self
    }

    /// Builder: add a payload field.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    /// Parse one JSON message.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn str_arg(&self, key: &str) -> Option<String> {
        self.payload.str_field(&[key]).filter(|s| !s.is_empty())
    }

    pub fn bool_arg(&self, key: &str) -> Option<bool> {
        self.payload.bool_field(&[key])
    }

    pub fn u64_arg(&self, key: &str) -> Option<u64> {
        self.payload.u64_field(&[key])
    }
}
