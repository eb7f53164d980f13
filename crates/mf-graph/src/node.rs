//! Flowsheet nodes and their balance status.

use std::borrow::Cow;
use std::sync::Arc;

use mf_core::composition;
use mf_core::{MfError, NodeId, Table, nearly_equal};

use crate::error::GraphResult;
use crate::options::FlowsheetOptions;
use crate::stream::Stream;

/// Role of a node, derived from its incident streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Feed boundary: outputs only.
    Source,
    /// Product boundary: inputs only.
    Sink,
    /// Internal node with both inputs and outputs.
    Balance,
}

/// A node in the flowsheet graph.
///
/// `inputs` and `outputs` mirror the graph's incident edges and are only ever
/// rebuilt from them, never edited one stream at a time.
#[derive(Debug, Clone)]
pub struct FlowNode {
    pub(crate) id: NodeId,
    pub(crate) name: Option<String>,
    pub(crate) subset: Option<String>,
    pub(crate) inputs: Vec<Arc<Stream>>,
    pub(crate) outputs: Vec<Arc<Stream>>,
}

impl FlowNode {
    pub(crate) fn new(id: NodeId) -> Self {
        Self {
            id,
            name: None,
            subset: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Display name; the id when no name has been set.
    pub fn name(&self) -> Cow<'_, str> {
        match &self.name {
            Some(n) => Cow::Borrowed(n.as_str()),
            None => Cow::Owned(self.id.to_string()),
        }
    }

    pub fn has_name(&self) -> bool {
        self.name.is_some()
    }

    pub fn subset(&self) -> Option<&str> {
        self.subset.as_deref()
    }

    pub fn inputs(&self) -> &[Arc<Stream>] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Arc<Stream>] {
        &self.outputs
    }

    pub fn degree(&self) -> usize {
        self.inputs.len() + self.outputs.len()
    }

    pub fn kind(&self) -> NodeKind {
        match (self.inputs.is_empty(), self.outputs.is_empty()) {
            (true, _) => NodeKind::Source,
            (false, true) => NodeKind::Sink,
            (false, false) => NodeKind::Balance,
        }
    }

    /// Summed input and output masses of a BALANCE node.
    fn mass_totals(&self, options: &FlowsheetOptions) -> GraphResult<(Table, Table)> {
        let basis = &options.basis;
        let to_mass = |streams: &[Arc<Stream>]| -> GraphResult<Table> {
            let tables = streams
                .iter()
                .map(|s| s.to_mass(basis))
                .collect::<GraphResult<Vec<_>>>()?;
            let total = composition::sum_masses(&tables)?.ok_or(MfError::Invariant {
                what: "balance node without streams",
            })?;
            Ok(total)
        };
        let total_in = to_mass(&self.inputs)?;
        let total_out = to_mass(&self.outputs)?;
        if total_in.len() != total_out.len() {
            return Err(MfError::IndexMismatch {
                what: format!(
                    "node {} inputs have {} rows but outputs have {}",
                    self.id,
                    total_in.len(),
                    total_out.len()
                ),
            }
            .into());
        }
        Ok((total_in, total_out))
    }

    /// Inputs minus outputs, in mass form, for BALANCE nodes.
    ///
    /// Returns `None` for boundary nodes. A column present on one side only is
    /// treated as zero on the other.
    pub fn imbalance(&self, options: &FlowsheetOptions) -> GraphResult<Option<Table>> {
        if self.kind() != NodeKind::Balance {
            return Ok(None);
        }
        let (total_in, total_out) = self.mass_totals(options)?;

        let mut diff = total_in.clone();
        let zeros = vec![0.0; total_in.len()];
        for col in total_out.columns() {
            let lhs = total_in.column(&col.name).unwrap_or(&zeros);
            let values: Vec<f64> = lhs.iter().zip(&col.values).map(|(a, b)| a - b).collect();
            diff.set_column(&col.name, values)?;
        }
        Ok(Some(diff))
    }

    /// Whether inputs match outputs row by row and column by column.
    ///
    /// `None` for boundary nodes. Nodes whose streams cannot be combined are reported
    /// as unbalanced.
    pub fn balanced(&self, options: &FlowsheetOptions) -> Option<bool> {
        if self.kind() != NodeKind::Balance {
            return None;
        }
        let (total_in, total_out) = match self.mass_totals(options) {
            Ok(totals) => totals,
            Err(err) => {
                tracing::debug!(
                    node = %self.id,
                    error = %err,
                    "node balance could not be evaluated"
                );
                return Some(false);
            }
        };

        let zeros = vec![0.0; total_in.len()];
        let mut names: Vec<&str> = total_in.column_names();
        for n in total_out.column_names() {
            if !names.contains(&n) {
                names.push(n);
            }
        }
        let ok = names.iter().all(|n| {
            let a = total_in.column(n).unwrap_or(&zeros);
            let b = total_out.column(n).unwrap_or(&zeros);
            a.iter()
                .zip(b)
                .all(|(x, y)| nearly_equal(*x, *y, options.tolerances))
        });
        Some(ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_core::RowIndex;

    fn stream(name: &str, dry: f64, fe: f64) -> Arc<Stream> {
        let t = Table::new(
            RowIndex::range("index", 1),
            vec![
                ("mass_wet", vec![dry]),
                ("mass_dry", vec![dry]),
                ("Fe", vec![fe]),
            ],
        )
        .unwrap();
        Arc::new(Stream::new(name, t))
    }

    #[test]
    fn kind_follows_incident_streams() {
        let mut n = FlowNode::new(NodeId::from_index(0));
        assert_eq!(n.kind(), NodeKind::Source);
        n.inputs.push(stream("a", 1.0, 1.0));
        assert_eq!(n.kind(), NodeKind::Sink);
        n.outputs.push(stream("b", 1.0, 1.0));
        assert_eq!(n.kind(), NodeKind::Balance);
        assert_eq!(n.degree(), 2);
        assert_eq!(n.name(), "0");
    }

    #[test]
    fn boundary_nodes_have_no_balance() {
        let mut n = FlowNode::new(NodeId::from_index(3));
        n.outputs.push(stream("a", 1.0, 1.0));
        let opts = FlowsheetOptions::default();
        assert_eq!(n.balanced(&opts), None);
        assert!(n.imbalance(&opts).unwrap().is_none());
    }

    #[test]
    fn balance_compares_component_mass() {
        let opts = FlowsheetOptions::default();
        let mut n = FlowNode::new(NodeId::from_index(1));
        n.inputs.push(stream("feed", 10.0, 50.0));
        n.outputs.push(stream("a", 4.0, 50.0));
        n.outputs.push(stream("b", 6.0, 50.0));
        assert_eq!(n.balanced(&opts), Some(true));

        n.outputs[1] = stream("b", 6.0, 40.0);
        assert_eq!(n.balanced(&opts), Some(false));
        let diff = n.imbalance(&opts).unwrap().unwrap();
        assert!((diff.column("Fe").unwrap()[0] - 0.6).abs() < 1e-12);
        assert_eq!(diff.column("mass_dry").unwrap(), &[0.0]);
    }
}
