//! Mass conservation checks for regridding.

use mf_core::{Closed, IntervalIndex, MassBasis, RowIndex, Table};
use mf_interp::{Grid, InterpError, MassPreservingInterp, mass_preserving_interp};

fn total(t: &Table, col: &str) -> f64 {
    t.column(col).unwrap().iter().sum()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

/// Three size fractions, coarsest first, with moisture and two assays.
fn size_distribution() -> Table {
    let (left, right) = ([2.0, 0.5, 0.0], [4.0, 2.0, 0.5]);
    let index = IntervalIndex::from_arrays("size", Closed::Left, &left, &right).unwrap();
    Table::new(
        RowIndex::Interval(index),
        vec![
            ("mass_wet", vec![105.0, 210.0, 420.0]),
            ("mass_dry", vec![100.0, 200.0, 400.0]),
            ("H2O", vec![100.0 * 5.0 / 105.0; 3]),
            ("Fe", vec![52.0, 58.0, 63.0]),
            ("SiO2", vec![14.0, 8.0, 4.0]),
        ],
    )
    .unwrap()
}

#[test]
fn two_interval_scenario_conserves_mass() {
    let index = IntervalIndex::from_edges("size", Closed::Right, &[0.0, 1.0, 2.0]).unwrap();
    let data = Table::new(
        RowIndex::Interval(index),
        vec![("mass_wet", vec![10.0, 20.0]), ("mass_dry", vec![10.0, 20.0])],
    )
    .unwrap();

    let out = mass_preserving_interp(
        &data,
        vec![0.0, 0.5, 1.0, 1.5, 2.0],
        true,
        None,
        &MassBasis::default(),
    )
    .unwrap();

    assert_eq!(out.len(), 4);
    assert!(close(total(&out, "mass_dry"), 30.0));
    let mut cum = 0.0;
    for m in out.column("mass_dry").unwrap() {
        assert!(*m >= -1e-12);
        cum += m;
    }
    assert!(close(cum, 30.0));
    // the first two new fractions rebuild the first original one
    let dry = out.column("mass_dry").unwrap();
    assert!(close(dry[0] + dry[1], 10.0));
}

#[test]
fn original_edges_reproduce_the_input() {
    let data = size_distribution();
    let idx = data.index().as_interval().unwrap().clone();
    let basis = MassBasis::default();
    let out = mass_preserving_interp(&data, idx.edges(), true, None, &basis).unwrap();

    assert_eq!(out.index(), data.index());
    for col in data.columns() {
        let got = out.column(&col.name).unwrap();
        for (a, b) in got.iter().zip(&col.values) {
            assert!(close(*a, *b), "{}: {a} vs {b}", col.name);
        }
    }
}

#[test]
fn upsampling_conserves_component_mass() {
    let data = size_distribution();
    let out = mass_preserving_interp(&data, 5usize, true, None, &MassBasis::default()).unwrap();
    assert_eq!(out.len(), 15);
    assert!(out.index().as_interval().unwrap().is_descending());

    assert!(close(total(&out, "mass_dry"), 700.0));
    assert!(close(total(&out, "mass_wet"), 735.0));
    let fe_in: f64 = [100.0 * 0.52, 200.0 * 0.58, 400.0 * 0.63].iter().sum();
    let dry = out.column("mass_dry").unwrap();
    let fe_out: f64 = out
        .column("Fe")
        .unwrap()
        .iter()
        .zip(dry)
        .map(|(pct, m)| pct * m / 100.0)
        .sum();
    assert!(close(fe_in, fe_out));
}

#[test]
fn settings_struct_matches_free_function() {
    let data = size_distribution();
    let grid = vec![0.25, 1.0, 3.0];
    let a = MassPreservingInterp::new(MassBasis::default())
        .include_original_edges(false)
        .interpolate(&data, Grid::Edges(grid.clone()))
        .unwrap();
    let b = mass_preserving_interp(&data, grid, false, None, &MassBasis::default()).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.len(), 3);
}

#[test]
fn grid_below_the_data_is_rejected() {
    let data = size_distribution();
    let err = mass_preserving_interp(&data, vec![-1.0, 0.0], false, None, &MassBasis::default())
        .unwrap_err();
    assert!(matches!(err, InterpError::InvalidGrid { .. }));
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn distribution(masses: &[(f64, f64)]) -> Table {
        let edges: Vec<f64> = (0..=masses.len()).map(|i| i as f64 * 0.5).collect();
        let index = IntervalIndex::from_edges("size", Closed::Left, &edges).unwrap();
        Table::new(
            RowIndex::Interval(index),
            vec![
                ("mass_wet", masses.iter().map(|m| m.0 * 1.1).collect()),
                ("mass_dry", masses.iter().map(|m| m.0).collect()),
                ("Fe", masses.iter().map(|m| m.1).collect()),
            ],
        )
        .unwrap()
    }

    proptest! {
        #[test]
        fn upsampling_preserves_total_mass(
            masses in prop::collection::vec((0.1f64..100.0, 0.0f64..100.0), 1..8),
            factor in 1usize..6,
        ) {
            let data = distribution(&masses);
            let basis = MassBasis::default();
            let out = mass_preserving_interp(&data, factor, true, None, &basis).unwrap();
            prop_assert_eq!(out.len(), masses.len() * factor);
            prop_assert!(close(total(&out, "mass_dry"), total(&data, "mass_dry")));
            prop_assert!(close(total(&out, "mass_wet"), total(&data, "mass_wet")));
        }

        #[test]
        fn arbitrary_grids_preserve_total_mass(
            masses in prop::collection::vec((0.1f64..100.0, 0.0f64..100.0), 1..8),
            grid in prop::collection::vec(0.0f64..5.0, 1..10),
        ) {
            let data = distribution(&masses);
            let basis = MassBasis::default();
            let out = mass_preserving_interp(&data, grid, true, None, &basis).unwrap();
            prop_assert!(close(total(&out, "mass_dry"), total(&data, "mass_dry")));
        }
    }
}
