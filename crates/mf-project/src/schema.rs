//! Flowsheet document schema.

use std::collections::BTreeMap;
use std::fmt;

use mf_core::{MassBasis, Tolerances};
use serde::{Deserialize, Serialize};

/// Newest document version this crate reads and writes.
pub const LATEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowsheetConfig {
    pub version: u32,
    pub flowsheet: FlowsheetDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<SettingsDef>,
    /// Node metadata keyed by the identifiers streams refer to.
    #[serde(default)]
    pub nodes: BTreeMap<u64, NodeDef>,
    /// Streams keyed by name. They are read back in name order, not document order, and
    /// the built flowsheet numbers nodes in the order those streams first reach them.
    #[serde(default)]
    pub streams: BTreeMap<String, StreamDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowsheetDef {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SettingsDef {
    #[serde(default)]
    pub tolerances: Tolerances,
    #[serde(default)]
    pub basis: MassBasis,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NodeDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subset: Option<SubsetDef>,
}

/// Subset label, written either as a number or as text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum SubsetDef {
    Number(i64),
    Text(String),
}

impl fmt::Display for SubsetDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubsetDef::Number(n) => write!(f, "{n}"),
            SubsetDef::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamDef {
    pub node_in: u64,
    pub node_out: u64,
}

impl FlowsheetConfig {
    /// An empty document at the latest version.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: LATEST_VERSION,
            flowsheet: FlowsheetDef { name: name.into() },
            settings: None,
            nodes: BTreeMap::new(),
            streams: BTreeMap::new(),
        }
    }

    pub fn tolerances(&self) -> Tolerances {
        self.settings
            .as_ref()
            .map(|s| s.tolerances)
            .unwrap_or_default()
    }

    pub fn basis(&self) -> MassBasis {
        self.settings
            .as_ref()
            .map(|s| s.basis.clone())
            .unwrap_or_default()
    }
}
