//! Document validation logic.

use std::collections::{BTreeSet, HashMap};

use mf_core::NodeId;

use crate::schema::{FlowsheetConfig, LATEST_VERSION};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Unsupported version: {version} (latest is {latest})")]
    UnsupportedVersion { version: u32, latest: u32 },

    #[error("Missing reference: node {node} in {context}")]
    MissingReference { node: u64, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Stream '{stream}' starts and ends at node {node}")]
    SelfLoop { stream: String, node: u64 },

    #[error("Streams '{first}' and '{second}' both run from node {from} to node {to}")]
    ParallelStreams {
        first: String,
        second: String,
        from: u64,
        to: u64,
    },
}

/// Check a document before it is used to build a flowsheet.
///
/// Every node entry must be touched by at least one stream; nodes only reached by
/// streams need no entry. Node identifiers must fit a [`NodeId`].
pub fn validate_config(config: &FlowsheetConfig) -> Result<(), ValidationError> {
    if config.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: config.version,
            latest: LATEST_VERSION,
        });
    }

    if config.flowsheet.name.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "flowsheet.name".to_string(),
            value: config.flowsheet.name.clone(),
            reason: "must not be empty".to_string(),
        });
    }

    let mut seen: HashMap<(u64, u64), &str> = HashMap::new();
    let mut touched = BTreeSet::new();
    for (name, def) in &config.streams {
        if name.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "streams".to_string(),
                value: name.clone(),
                reason: "stream names must not be empty".to_string(),
            });
        }
        for node in [def.node_in, def.node_out] {
            if NodeId::try_from_index(node).is_none() {
                return Err(ValidationError::InvalidValue {
                    field: format!("streams.{name}"),
                    value: node.to_string(),
                    reason: format!("node ids must not exceed {}", NodeId::MAX_INDEX),
                });
            }
        }
        if def.node_in == def.node_out {
            return Err(ValidationError::SelfLoop {
                stream: name.clone(),
                node: def.node_in,
            });
        }
        if let Some(first) = seen.insert((def.node_in, def.node_out), name) {
            return Err(ValidationError::ParallelStreams {
                first: first.to_string(),
                second: name.clone(),
                from: def.node_in,
                to: def.node_out,
            });
        }
        touched.insert(def.node_in);
        touched.insert(def.node_out);
    }

    for id in config.nodes.keys() {
        if !touched.contains(id) {
            return Err(ValidationError::MissingReference {
                node: *id,
                context: "nodes (no stream touches it)".to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{NodeDef, StreamDef};

    fn config() -> FlowsheetConfig {
        let mut cfg = FlowsheetConfig::new("Demo");
        cfg.streams.insert("Feed".into(), StreamDef { node_in: 0, node_out: 1 });
        cfg.streams.insert("Product".into(), StreamDef { node_in: 1, node_out: 2 });
        cfg.nodes.insert(1, NodeDef { name: Some("mill".into()), subset: None });
        cfg
    }

    #[test]
    fn accepts_a_simple_chain() {
        validate_config(&config()).unwrap();
    }

    #[test]
    fn rejects_newer_versions() {
        let mut cfg = config();
        cfg.version = LATEST_VERSION + 1;
        assert!(matches!(
            validate_config(&cfg),
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn rejects_loops_and_parallel_streams() {
        let mut cfg = config();
        cfg.streams.insert("Recycle".into(), StreamDef { node_in: 2, node_out: 2 });
        assert_eq!(
            validate_config(&cfg),
            Err(ValidationError::SelfLoop { stream: "Recycle".into(), node: 2 })
        );

        let mut cfg = config();
        cfg.streams.insert("Bypass".into(), StreamDef { node_in: 0, node_out: 1 });
        assert!(matches!(
            validate_config(&cfg),
            Err(ValidationError::ParallelStreams { from: 0, to: 1, .. })
        ));
    }

    #[test]
    fn rejects_node_ids_past_the_largest_id() {
        let mut cfg = config();
        cfg.streams.insert("Tail".into(), StreamDef { node_in: 2, node_out: u64::MAX });
        assert!(matches!(
            validate_config(&cfg),
            Err(ValidationError::InvalidValue { ref field, .. }) if field == "streams.Tail"
        ));

        let mut cfg = config();
        cfg.streams.insert("Tail".into(), StreamDef { node_in: 2, node_out: NodeId::MAX_INDEX });
        validate_config(&cfg).unwrap();
    }

    #[test]
    fn rejects_nodes_without_streams() {
        let mut cfg = config();
        cfg.nodes.insert(9, NodeDef::default());
        assert!(matches!(
            validate_config(&cfg),
            Err(ValidationError::MissingReference { node: 9, .. })
        ));
    }
}
