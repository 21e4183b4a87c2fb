//! Core data model: source records moving through the status state machine
//! and the menu items derived from them.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The four states of a source record's lifecycle.
///
/// Records flow `Pending → Working → Done | Error`. The only backwards
/// transition (resetting `Error`/`Working` to `Pending`) is an operator
/// action outside this system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Pending,
    Working,
    Done,
    Error,
}

impl RecordStatus {
    /// The string value stored in the record store's status field.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Pending => "pending",
            RecordStatus::Working => "working",
            RecordStatus::Done => "done",
            RecordStatus::Error => "error",
        }
    }

    /// Parse the store's string value back into a status.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(RecordStatus::Pending),
            "working" => Some(RecordStatus::Working),
            "done" => Some(RecordStatus::Done),
            "error" => Some(RecordStatus::Error),
            _ => None,
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single externally-created record awaiting extraction.
///
/// The schema is deliberately open: beyond the identifier and status, every
/// attribute lives in `payload` and is carried through verbatim onto the
/// derived items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: String,
    pub status: RecordStatus,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

impl SourceRecord {
    pub fn new(id: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            status: RecordStatus::Pending,
            payload,
        }
    }
}

/// One extracted menu item, parsed from the transformer's output.
///
/// The field set (category, name, size, Price, ...) is opaque to the
/// pipeline; no semantic validation happens here and unknown fields pass
/// through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MenuItem(pub Map<String, Value>);

impl MenuItem {
    /// Merge the source record's payload attributes into this item.
    /// Source attributes win on key collision, matching the enrichment
    /// order of the extraction contract.
    pub fn attach_source(&mut self, payload: &Map<String, Value>) {
        for (key, value) in payload {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}
