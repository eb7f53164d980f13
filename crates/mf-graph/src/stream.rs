//! Streams: the payload carried on every flowsheet edge.

use std::sync::Arc;

use mf_core::composition::{self, ColumnRole};
use mf_core::{IdSource, MassBasis, NodeId, Table, Tolerances, nearly_equal};

use crate::error::{GraphError, GraphResult};

/// Ordered pair of node identifiers a stream flows between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoints {
    pub from: NodeId,
    pub to: NodeId,
}

impl Endpoints {
    pub fn new(from: NodeId, to: NodeId) -> Self {
        Self { from, to }
    }
}

/// Self-consistency of a stream's payload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StreamStatus {
    pub ok: bool,
    /// Columns holding at least one out-of-range or inconsistent value.
    pub failing_components: Vec<String>,
}

/// A named mass/composition dataset between two nodes.
///
/// The payload is shared: cloning a stream aliases its table, and payload changes
/// replace the table wholesale rather than editing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    name: String,
    endpoints: Option<Endpoints>,
    data: Arc<Table>,
}

impl Stream {
    /// Create an unconnected stream.
    pub fn new(name: impl Into<String>, data: Table) -> Self {
        Self {
            name: name.into(),
            endpoints: None,
            data: Arc::new(data),
        }
    }

    /// Builder-style endpoint assignment.
    pub fn with_endpoints(mut self, from: NodeId, to: NodeId) -> Self {
        self.endpoints = Some(Endpoints::new(from, to));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoints(&self) -> Option<Endpoints> {
        self.endpoints
    }

    /// Endpoints, or `MissingEndpoints` when unset.
    pub fn require_endpoints(&self) -> GraphResult<Endpoints> {
        self.endpoints.ok_or_else(|| GraphError::MissingEndpoints {
            stream: self.name.clone(),
        })
    }

    pub fn data(&self) -> &Table {
        &self.data
    }

    pub fn data_arc(&self) -> &Arc<Table> {
        &self.data
    }

    /// True when both streams alias the same payload.
    pub fn shares_data(&self, other: &Stream) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Replace the whole payload.
    pub fn set_data(&mut self, data: Table) {
        self.data = Arc::new(data);
    }

    pub fn set_endpoints(&mut self, from: NodeId, to: NodeId) {
        self.endpoints = Some(Endpoints::new(from, to));
    }

    /// Start this stream where `parent` ends.
    pub fn set_parent(&mut self, parent: &Stream) -> GraphResult<()> {
        let own = self.require_endpoints()?;
        let p = parent.require_endpoints()?;
        self.endpoints = Some(Endpoints::new(p.to, own.to));
        Ok(())
    }

    /// End this stream where `child` starts.
    pub fn set_child(&mut self, child: &Stream) -> GraphResult<()> {
        let own = self.require_endpoints()?;
        let c = child.require_endpoints()?;
        self.endpoints = Some(Endpoints::new(own.from, c.from));
        Ok(())
    }

    /// Payload in absolute mass form.
    pub fn to_mass(&self, basis: &MassBasis) -> GraphResult<Table> {
        Ok(composition::to_mass(&self.data, basis)?)
    }

    /// Total mass and mass-weighted composition.
    pub fn aggregate(&self, basis: &MassBasis) -> GraphResult<Table> {
        Ok(composition::aggregate(&self.data, basis)?)
    }

    /// Check the payload for negative masses, dry mass above wet mass, and percentages
    /// outside [0, 100] or inconsistent with the mass columns.
    pub fn status(&self, basis: &MassBasis, tol: Tolerances) -> StreamStatus {
        let mut failing: Vec<String> = Vec::new();
        let wet = self.data.column(&basis.mass_wet);
        let dry = self.data.column(&basis.mass_dry);

        for required in [&basis.mass_wet, &basis.mass_dry] {
            if !self.data.has_column(required) {
                failing.push(required.clone());
            }
        }

        if let Some(wet) = wet {
            if wet.iter().any(|w| *w < 0.0) {
                failing.push(basis.mass_wet.clone());
            }
        }
        if let Some(dry) = dry {
            let negative = dry.iter().any(|d| *d < 0.0);
            let above_wet = wet.is_some_and(|wet| {
                dry.iter()
                    .zip(wet)
                    .any(|(d, w)| d > w && !nearly_equal(*d, *w, tol))
            });
            if negative || above_wet {
                failing.push(basis.mass_dry.clone());
            }
        }

        let out_of_range = |v: &f64| !(0.0..=100.0).contains(v);
        for col in self.data.columns() {
            match basis.role(&col.name) {
                ColumnRole::WetMass | ColumnRole::DryMass => {}
                ColumnRole::Moisture => {
                    let inconsistent = match (wet, dry) {
                        (Some(wet), Some(dry)) => col
                            .values
                            .iter()
                            .zip(wet.iter().zip(dry))
                            .filter(|(_, (w, _))| **w > 0.0)
                            .any(|(h2o, (w, d))| !nearly_equal(*h2o, (w - d) / w * 100.0, tol)),
                        _ => false,
                    };
                    if inconsistent || col.values.iter().any(out_of_range) {
                        failing.push(col.name.clone());
                    }
                }
                ColumnRole::Component => {
                    if col.values.iter().any(out_of_range) {
                        failing.push(col.name.clone());
                    }
                }
            }
        }

        StreamStatus {
            ok: failing.is_empty(),
            failing_components: failing,
        }
    }

    /// Split into two streams carrying `fraction` and `1 - fraction` of the mass.
    ///
    /// Both children start at this stream's target node and end at fresh nodes drawn
    /// from `ids`. Composition is unchanged.
    pub fn split(
        &self,
        fraction: f64,
        name_1: impl Into<String>,
        name_2: impl Into<String>,
        basis: &MassBasis,
        ids: &mut IdSource,
    ) -> GraphResult<(Stream, Stream)> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(mf_core::MfError::InvalidArg {
                what: "split fraction must lie in [0, 1]",
            }
            .into());
        }
        let own = self.require_endpoints()?;
        let scaled = |f: f64| -> GraphResult<Table> {
            let mut t = (*self.data).clone();
            for mass_col in [&basis.mass_wet, &basis.mass_dry] {
                let values: Vec<f64> = t.require(mass_col)?.iter().map(|v| v * f).collect();
                t.set_column(mass_col, values)?;
            }
            Ok(t)
        };

        let first = Stream::new(name_1, scaled(fraction)?).with_endpoints(own.to, ids.next_id());
        let second =
            Stream::new(name_2, scaled(1.0 - fraction)?).with_endpoints(own.to, ids.next_id());
        Ok((first, second))
    }

    /// Combine two streams into a new one.
    ///
    /// `other` is rewired to end at this stream's target node, and the result starts
    /// there and ends at a fresh node drawn from `ids`.
    pub fn add(
        &self,
        other: &mut Stream,
        name: impl Into<String>,
        basis: &MassBasis,
        ids: &mut IdSource,
    ) -> GraphResult<Stream> {
        let own = self.require_endpoints()?;
        let theirs = other.require_endpoints()?;
        if self.data.index().kind() != other.data.index().kind()
            || self.data.len() != other.data.len()
        {
            return Err(GraphError::IndexMismatch {
                what: format!("cannot add {} to {}", other.name, self.name),
            });
        }

        let a = composition::to_mass(&self.data, basis)?;
        let b = composition::to_mass(&other.data, basis)?;
        let total = composition::sum_masses([&a, &b])?.ok_or(mf_core::MfError::Invariant {
            what: "sum of two tables is empty",
        })?;
        let data = composition::to_composition(&total, basis)?;

        other.endpoints = Some(Endpoints::new(theirs.from, own.to));
        Ok(Stream::new(name, data).with_endpoints(own.to, ids.next_id()))
    }
}
