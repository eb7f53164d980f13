//! mf-project: declarative flowsheet documents and validation.

pub mod schema;
pub mod validate;

use std::path::Path;

use mf_core::{NodeId, Table};
use mf_graph::{Flowsheet, FlowsheetOptions, GraphError, Stream};

pub use schema::*;
pub use validate::{ValidationError, validate_config};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn from_yaml_str(content: &str) -> ProjectResult<FlowsheetConfig> {
    let config: FlowsheetConfig = serde_yaml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn load_yaml(path: &Path) -> ProjectResult<FlowsheetConfig> {
    let content = std::fs::read_to_string(path)?;
    from_yaml_str(&content)
}

pub fn save_yaml(path: &Path, config: &FlowsheetConfig) -> ProjectResult<()> {
    validate_config(config)?;
    let content = serde_yaml::to_string(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &Path) -> ProjectResult<FlowsheetConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: FlowsheetConfig = serde_json::from_str(&content)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn save_json(path: &Path, config: &FlowsheetConfig) -> ProjectResult<()> {
    validate_config(config)?;
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Assemble the flowsheet a document describes.
///
/// Streams carry no rows yet, only the wet mass, dry mass and moisture columns of the
/// configured basis. Node names and subsets are attached by the identifiers the
/// document uses. The built flowsheet numbers nodes densely in the order streams first
/// reach them, taking streams in name order.
pub fn build_flowsheet(config: &FlowsheetConfig) -> ProjectResult<Flowsheet> {
    validate_config(config)?;
    let options = FlowsheetOptions {
        tolerances: config.tolerances(),
        basis: config.basis(),
    };
    let columns = [
        options.basis.mass_wet.as_str(),
        options.basis.mass_dry.as_str(),
        options.basis.moisture.as_str(),
    ];

    let mut builder =
        Flowsheet::builder(config.flowsheet.name.as_str()).options(options.clone());
    for (name, def) in &config.streams {
        let from = NodeId::from_index(def.node_in);
        let to = NodeId::from_index(def.node_out);
        let stream = Stream::new(name.as_str(), Table::empty(&columns)).with_endpoints(from, to);
        builder.add_stream(stream);
    }
    for (id, node) in &config.nodes {
        let raw = NodeId::from_index(*id);
        if let Some(name) = &node.name {
            builder.node_name(raw, name.as_str());
        }
        if let Some(subset) = &node.subset {
            builder.node_subset(raw, subset.to_string());
        }
    }

    let flowsheet = builder.build()?;
    tracing::info!(
        name = flowsheet.name(),
        nodes = flowsheet.node_count(),
        streams = flowsheet.stream_count(),
        "built flowsheet from document"
    );
    Ok(flowsheet)
}
