//! Row-index compatibility checks across the streams of one flowsheet.

use mf_core::{Coord, IndexKind, Interval, IntervalIndex, RowIndex};

use crate::error::{GraphError, GraphResult};
use crate::stream::Stream;

/// Index dimension whose missing coarse fractions may be zero-filled.
pub const SIZE_DIMENSION: &str = "size";

/// Make every stream's row index structurally compatible.
///
/// Streams without rows are placeholders awaiting data and take no part. The others
/// must share an index kind. Row counts must match, except for streams indexed by
/// `size` intervals that only lack the coarsest fractions: those rows are added with
/// zero values. Gaps between present fractions would need interpolation and are
/// rejected.
pub(crate) fn align_indexes(streams: &mut [Stream]) -> GraphResult<()> {
    let mut populated: Vec<&mut Stream> =
        streams.iter_mut().filter(|s| !s.data().is_empty()).collect();
    let Some(first) = populated.first() else {
        return Ok(());
    };
    let kind = first.data().index().kind();
    if let Some(other) = populated.iter().find(|s| s.data().index().kind() != kind) {
        return Err(GraphError::IndexMismatch {
            what: format!(
                "stream index types are not consistent ({} is {}, {} is {})",
                first.name(),
                kind,
                other.name(),
                other.data().index().kind()
            ),
        });
    }

    let len = first.data().len();
    if populated.iter().all(|s| s.data().len() == len) {
        return Ok(());
    }

    if kind != IndexKind::Interval || first.data().index().name() != SIZE_DIMENSION {
        return Err(GraphError::IndexMismatch {
            what: "stream index shapes are not consistent".to_string(),
        });
    }

    tracing::debug!("size index detected - attempting index alignment");
    let full = union_coarse_first(populated.iter().map(|s| &**s))?;
    let coords = RowIndex::Interval(full.clone()).coords();

    for stream in populated.iter_mut() {
        if stream.data().len() == full.len() {
            continue;
        }
        let present: Vec<bool> = coords
            .iter()
            .map(|c| stream.data().index().position(c).is_some())
            .collect();
        let first_present = present.iter().position(|p| *p).unwrap_or(present.len());
        if present[first_present..].iter().any(|p| !p) {
            tracing::debug!(stream = stream.name(), "stream has missing intermediate sizes");
            return Err(GraphError::IndexMismatch {
                what: format!(
                    "stream {} is missing intermediate size fractions; interpolate it first",
                    stream.name()
                ),
            });
        }

        tracing::debug!(
            stream = stream.name(),
            missing = first_present,
            "zero-filling missing coarse size fractions"
        );
        let closed = stream
            .data()
            .index()
            .as_interval()
            .map(IntervalIndex::closed)
            .unwrap_or_default();
        let target = IntervalIndex::new(SIZE_DIMENSION, closed, full.intervals().to_vec())?;
        let filled = stream.data().reindex(RowIndex::Interval(target), 0.0)?;
        stream.set_data(filled);
    }
    Ok(())
}

/// Union of all `size` intervals, coarsest first.
fn union_coarse_first<'a, I>(streams: I) -> GraphResult<IntervalIndex>
where
    I: IntoIterator<Item = &'a Stream>,
{
    let mut all: Vec<Interval> = Vec::new();
    let mut closed = None;
    for s in streams {
        if closed.is_none() {
            closed = s.data().index().as_interval().map(IntervalIndex::closed);
        }
        for c in s.data().index().coords() {
            if let Coord::Interval(i) = c {
                if !all.contains(&i) {
                    all.push(i);
                }
            }
        }
    }
    all.sort_by(|a, b| b.left.total_cmp(&a.left));
    IntervalIndex::new(SIZE_DIMENSION, closed.unwrap_or_default(), all).map_err(|e| {
        GraphError::IndexMismatch {
            what: format!("size fractions differ between streams: {e}"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_core::{Closed, Table};

    fn sized(name: &str, edges_desc: &[(f64, f64)], mass: f64) -> Stream {
        let lefts: Vec<f64> = edges_desc.iter().map(|e| e.0).collect();
        let rights: Vec<f64> = edges_desc.iter().map(|e| e.1).collect();
        let idx = IntervalIndex::from_arrays("size", Closed::Left, &lefts, &rights).unwrap();
        let n = edges_desc.len();
        let t = Table::new(
            RowIndex::Interval(idx),
            vec![("mass_wet", vec![mass; n]), ("mass_dry", vec![mass; n])],
        )
        .unwrap();
        Stream::new(name, t)
    }

    #[test]
    fn missing_coarse_fractions_are_zero_filled() {
        let full = [(2.0, 4.0), (1.0, 2.0), (0.0, 1.0)];
        let mut streams = vec![sized("a", &full, 1.0), sized("b", &full[1..], 2.0)];
        align_indexes(&mut streams).unwrap();

        assert_eq!(streams[1].data().len(), 3);
        assert_eq!(
            streams[1].data().column("mass_dry").unwrap(),
            &[0.0, 2.0, 2.0]
        );
    }

    #[test]
    fn missing_intermediate_fractions_are_rejected() {
        let full = [(2.0, 4.0), (1.0, 2.0), (0.0, 1.0)];
        let gappy = [(2.0, 4.0), (0.0, 1.0)];
        let mut streams = vec![sized("a", &full, 1.0), sized("b", &gappy, 2.0)];
        let err = align_indexes(&mut streams).unwrap_err();
        assert!(matches!(err, GraphError::IndexMismatch { .. }));
    }

    #[test]
    fn mismatched_kinds_are_rejected() {
        let interval = sized("a", &[(0.0, 1.0)], 1.0);
        let plain = Stream::new(
            "b",
            Table::new(
                RowIndex::range("index", 1),
                vec![("mass_wet", vec![1.0]), ("mass_dry", vec![1.0])],
            )
            .unwrap(),
        );
        let mut streams = vec![interval, plain];
        assert!(matches!(
            align_indexes(&mut streams),
            Err(GraphError::IndexMismatch { .. })
        ));
    }

    #[test]
    fn empty_placeholders_take_no_part() {
        let full = [(2.0, 4.0), (1.0, 2.0), (0.0, 1.0)];
        let placeholder = Stream::new("p", Table::empty(&["mass_wet", "mass_dry"]));
        let mut streams = vec![placeholder, sized("a", &full, 1.0), sized("b", &full[1..], 2.0)];
        align_indexes(&mut streams).unwrap();

        assert!(streams[0].data().is_empty());
        assert_eq!(streams[2].data().len(), 3);
    }

    #[test]
    fn plain_shape_mismatch_is_rejected() {
        let t = |n| {
            Table::new(
                RowIndex::range("index", n),
                vec![("mass_dry", vec![1.0; n])],
            )
            .unwrap()
        };
        let mut streams = vec![Stream::new("a", t(2)), Stream::new("b", t(3))];
        assert!(align_indexes(&mut streams).is_err());
    }
}
