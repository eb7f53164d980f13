//! Read-only data products consumed by report and chart renderers.

use std::collections::BTreeMap;

use mf_core::{
    Closed, Column, ColumnFormat, Coord, IdSource, Interval, IntervalIndex, RowIndex, Table,
};
use petgraph::visit::EdgeRef;
use serde_json::{Value, json};

use crate::error::{GraphError, GraphResult};
use crate::flowsheet::Flowsheet;
use crate::graph;
use crate::node::NodeKind;
use crate::options::FlowsheetOptions;
use crate::stream::Stream;

/// Row key of a tidy table: the original index entry plus the owning stream.
#[derive(Debug, Clone, PartialEq)]
pub struct TidyKey {
    pub coord: Coord,
    pub stream: String,
}

/// Long-format concatenation of stream payloads.
///
/// Keys are unique even when streams share index entries. Columns absent from a
/// stream hold NaN on that stream's rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TidyTable {
    pub index_name: String,
    pub closed: Closed,
    pub keys: Vec<TidyKey>,
    pub columns: Vec<Column>,
}

impl TidyTable {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }
}

/// Union of column names in first-seen order.
fn column_union<'a>(tables: impl IntoIterator<Item = &'a Table>) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for t in tables {
        for n in t.column_names() {
            if !names.iter().any(|x| x == n) {
                names.push(n.to_string());
            }
        }
    }
    names
}

impl Flowsheet {
    /// One row per stream: total mass and mass-weighted composition.
    pub fn report(&self) -> GraphResult<Table> {
        let mut names: Vec<String> = Vec::new();
        let mut rows: Vec<Table> = Vec::new();
        for s in self.streams() {
            if s.data().is_empty() {
                return Err(GraphError::EmptyStream {
                    stream: s.name().to_string(),
                });
            }
            names.push(s.name().to_string());
            rows.push(s.aggregate(&self.options.basis)?);
        }

        let columns: Vec<(String, Vec<f64>)> = column_union(&rows)
            .into_iter()
            .map(|c| {
                let values = rows
                    .iter()
                    .map(|r| r.column(&c).map_or(f64::NAN, |v| v[0]))
                    .collect();
                (c, values)
            })
            .collect();
        Ok(Table::new(RowIndex::named("name", names), columns)?)
    }

    /// Stack the payloads of all streams, or of the named ones, in edge order.
    pub fn to_tidy_table(&self, names: Option<&[&str]>) -> GraphResult<TidyTable> {
        if let Some(names) = names {
            for n in names {
                self.get_stream(n)?;
            }
        }
        let selected: Vec<&Stream> = self
            .streams()
            .filter(|s| names.is_none_or(|ns| ns.iter().any(|n| *n == s.name())))
            .map(|s| s.as_ref())
            .collect();

        let (index_name, closed) = selected
            .first()
            .map(|s| {
                let idx = s.data().index();
                let closed = idx.as_interval().map(IntervalIndex::closed).unwrap_or_default();
                (idx.name().to_string(), closed)
            })
            .unwrap_or_else(|| ("index".to_string(), Closed::default()));

        let column_names = column_union(selected.iter().map(|s| s.data()));
        let mut keys: Vec<TidyKey> = Vec::new();
        let mut columns: Vec<Column> = column_names
            .into_iter()
            .map(|name| Column {
                name,
                values: Vec::new(),
            })
            .collect();

        for s in &selected {
            let data = s.data();
            keys.extend(data.index().coords().into_iter().map(|coord| TidyKey {
                coord,
                stream: s.name().to_string(),
            }));
            for col in &mut columns {
                match data.column(&col.name) {
                    Some(v) => col.values.extend_from_slice(v),
                    None => col.values.extend(std::iter::repeat_n(f64::NAN, data.len())),
                }
            }
        }

        Ok(TidyTable {
            index_name,
            closed,
            keys,
            columns,
        })
    }

    /// Rebuild unconnected streams from a tidy table.
    ///
    /// Rows are grouped by stream in first-seen order. Every stream gets a pair of fresh
    /// endpoints from `ids`; columns that are NaN on every row of a stream are dropped
    /// from it.
    pub fn from_tidy(
        name: impl Into<String>,
        tidy: &TidyTable,
        options: FlowsheetOptions,
        ids: &mut IdSource,
    ) -> GraphResult<Flowsheet> {
        let mut order: Vec<&str> = Vec::new();
        let mut rows: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, key) in tidy.keys.iter().enumerate() {
            let entry = rows.entry(key.stream.as_str()).or_insert_with(|| {
                order.push(key.stream.as_str());
                Vec::new()
            });
            entry.push(i);
        }

        let mut b = Flowsheet::builder(name).options(options);
        for stream_name in order {
            let positions = &rows[stream_name];
            let coords: Vec<Coord> =
                positions.iter().map(|&i| tidy.keys[i].coord.clone()).collect();
            let index = tidy_index(tidy, coords)?;
            let columns: Vec<(String, Vec<f64>)> = tidy
                .columns
                .iter()
                .map(|c| {
                    let values: Vec<f64> = positions.iter().map(|&i| c.values[i]).collect();
                    (c.name.clone(), values)
                })
                .filter(|(_, v)| !v.iter().all(|x| x.is_nan()))
                .collect();
            let data = Table::new(index, columns)?;
            let (from, to) = (ids.next_id(), ids.next_id());
            b.add_stream(Stream::new(stream_name, data).with_endpoints(from, to));
        }
        b.build()
    }

    /// Display hints for the given columns.
    ///
    /// With `strip_percent` composition columns drop their `%` suffix.
    pub fn column_formats(
        &self,
        columns: &[&str],
        strip_percent: bool,
    ) -> BTreeMap<String, ColumnFormat> {
        columns
            .iter()
            .map(|c| {
                let mut fmt = self.options.basis.format_hint(c);
                if strip_percent {
                    fmt.percent = false;
                }
                (c.to_string(), fmt)
            })
            .collect()
    }

    /// Cytoscape-style JSON export of the network.
    pub fn to_json(&self) -> Value {
        let nodes: Vec<Value> = self
            .nodes()
            .map(|n| {
                let kind = match n.kind() {
                    NodeKind::Source => "source",
                    NodeKind::Sink => "sink",
                    NodeKind::Balance => "balance",
                };
                json!({
                    "data": {
                        "id": n.id().to_string(),
                        "value": n.id().index(),
                        "name": n.name(),
                        "subset": n.subset(),
                        "kind": kind,
                        "balanced": n.balanced(&self.options),
                    }
                })
            })
            .collect();

        let edges: Vec<Value> = self
            .graph
            .edge_references()
            .map(|e| {
                let s = e.weight();
                let status = s.status(&self.options.basis, self.options.tolerances);
                json!({
                    "data": {
                        "source": graph::id_of(e.source()).to_string(),
                        "target": graph::id_of(e.target()).to_string(),
                        "name": s.name(),
                        "ok": status.ok,
                        "failing_components": status.failing_components,
                    }
                })
            })
            .collect();

        json!({
            "data": { "name": self.name() },
            "directed": true,
            "multigraph": false,
            "elements": { "nodes": nodes, "edges": edges },
        })
    }
}

/// Row index for one stream's slice of a tidy table.
fn tidy_index(tidy: &TidyTable, coords: Vec<Coord>) -> GraphResult<RowIndex> {
    let mismatch = || GraphError::IndexMismatch {
        what: format!("tidy table mixes index kinds along {}", tidy.index_name),
    };
    match coords.first() {
        None | Some(Coord::Label(_)) => {
            let labels = coords
                .into_iter()
                .map(|c| match c {
                    Coord::Label(l) => Ok(l),
                    _ => Err(mismatch()),
                })
                .collect::<GraphResult<Vec<i64>>>()?;
            Ok(RowIndex::Positional {
                name: tidy.index_name.clone(),
                labels,
            })
        }
        Some(Coord::Name(_)) => {
            let labels = coords
                .into_iter()
                .map(|c| match c {
                    Coord::Name(n) => Ok(n),
                    _ => Err(mismatch()),
                })
                .collect::<GraphResult<Vec<String>>>()?;
            Ok(RowIndex::named(tidy.index_name.clone(), labels))
        }
        Some(Coord::Interval(_)) => {
            let intervals = coords
                .into_iter()
                .map(|c| match c {
                    Coord::Interval(i) => Ok(i),
                    _ => Err(mismatch()),
                })
                .collect::<GraphResult<Vec<Interval>>>()?;
            Ok(RowIndex::Interval(IntervalIndex::new(
                tidy.index_name.clone(),
                tidy.closed,
                intervals,
            )?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_core::NodeId;

    fn sheet() -> Flowsheet {
        let mk = |name: &str, from: u64, to: u64, dry: f64| {
            let t = Table::new(
                RowIndex::range("index", 2),
                vec![
                    ("mass_wet", vec![dry, dry]),
                    ("mass_dry", vec![dry, dry]),
                    ("Fe", vec![50.0, 60.0]),
                ],
            )
            .unwrap();
            Stream::new(name, t).with_endpoints(NodeId::from_index(from), NodeId::from_index(to))
        };
        Flowsheet::from_streams("fs", [mk("Feed", 0, 1, 10.0), mk("Conc", 1, 2, 10.0)]).unwrap()
    }

    #[test]
    fn report_rows_follow_streams() {
        let rpt = sheet().report().unwrap();
        assert_eq!(rpt.len(), 2);
        assert_eq!(rpt.column("mass_dry").unwrap(), &[20.0, 20.0]);
        assert!((rpt.column("Fe").unwrap()[0] - 55.0).abs() < 1e-9);
        assert_eq!(rpt.index().coord(1), Some(Coord::Name("Conc".into())));
    }

    #[test]
    fn report_rejects_empty_streams() {
        let mut fs = sheet();
        fs.replace_stream_data("Conc", Stream::new("Conc", Table::empty(&["mass_wet", "mass_dry"])))
            .unwrap();
        assert!(matches!(fs.report(), Err(GraphError::EmptyStream { .. })));
    }

    #[test]
    fn tidy_keys_are_unique() {
        let fs = sheet();
        let tidy = fs.to_tidy_table(None).unwrap();
        assert_eq!(tidy.len(), 4);
        assert_eq!(tidy.keys[2].stream, "Conc");
        assert_eq!(tidy.keys[2].coord, tidy.keys[0].coord);

        let only = fs.to_tidy_table(Some(&["Feed"])).unwrap();
        assert_eq!(only.len(), 2);
        assert!(fs.to_tidy_table(Some(&["nope"])).is_err());
    }

    #[test]
    fn from_tidy_restores_disconnected_streams() {
        let fs = sheet();
        let tidy = fs.to_tidy_table(None).unwrap();
        let mut ids = IdSource::new();
        let back =
            Flowsheet::from_tidy("back", &tidy, FlowsheetOptions::default(), &mut ids).unwrap();
        assert_eq!(back.stream_names(), vec!["Feed", "Conc"]);
        assert_eq!(back.node_count(), 4);
        assert_eq!(
            back.get_stream("Conc").unwrap().data(),
            fs.get_stream("Conc").unwrap().data()
        );
    }

    #[test]
    fn formats_and_json() {
        let fs = sheet();
        let fmts = fs.column_formats(&["mass_dry", "Fe"], false);
        assert_eq!(fmts["mass_dry"].render(12.345), "12.3");
        assert_eq!(fmts["Fe"].render(55.0), "55.00%");
        let stripped = fs.column_formats(&["Fe"], true);
        assert_eq!(stripped["Fe"].render(55.0), "55.00");

        let js = fs.to_json();
        assert_eq!(js["elements"]["nodes"].as_array().unwrap().len(), 3);
        assert_eq!(js["elements"]["edges"][1]["data"]["name"], "Conc");
        assert_eq!(js["elements"]["nodes"][1]["data"]["balanced"], true);
        assert_eq!(js["elements"]["nodes"][0]["data"]["balanced"], Value::Null);
    }
}
