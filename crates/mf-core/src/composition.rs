//! Conversion between relative composition (%) and absolute mass.
//!
//! A composition table carries wet and dry mass columns, an optional moisture column
//! (% of wet mass) and any number of component assays (% of dry mass). The mass form
//! keeps the two mass columns and expresses every other column as a mass.

use crate::{MfError, MfResult, Table};

/// Names of the columns that anchor the mass/composition conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MassBasis {
    pub mass_wet: String,
    pub mass_dry: String,
    pub moisture: String,
}

impl Default for MassBasis {
    fn default() -> Self {
        Self {
            mass_wet: "mass_wet".to_string(),
            mass_dry: "mass_dry".to_string(),
            moisture: "H2O".to_string(),
        }
    }
}

/// How a column relates to the mass basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    WetMass,
    DryMass,
    Moisture,
    Component,
}

impl MassBasis {
    pub fn role(&self, column: &str) -> ColumnRole {
        if column == self.mass_wet {
            ColumnRole::WetMass
        } else if column == self.mass_dry {
            ColumnRole::DryMass
        } else if column == self.moisture {
            ColumnRole::Moisture
        } else {
            ColumnRole::Component
        }
    }

    pub fn is_mass(&self, column: &str) -> bool {
        matches!(self.role(column), ColumnRole::WetMass | ColumnRole::DryMass)
    }

    /// Display hint for a column.
    pub fn format_hint(&self, column: &str) -> ColumnFormat {
        if self.is_mass(column) {
            ColumnFormat {
                decimals: 1,
                percent: false,
            }
        } else {
            ColumnFormat {
                decimals: 2,
                percent: true,
            }
        }
    }
}

/// Fixed-point display hint consumed by report renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnFormat {
    pub decimals: usize,
    pub percent: bool,
}

impl ColumnFormat {
    pub fn render(&self, value: f64) -> String {
        if self.percent {
            format!("{:.*}%", self.decimals, value)
        } else {
            format!("{:.*}", self.decimals, value)
        }
    }
}

fn ratio_pct(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator * 100.0
    }
}

/// Convert a composition table to absolute masses.
pub fn to_mass(table: &Table, basis: &MassBasis) -> MfResult<Table> {
    let wet = table.require(&basis.mass_wet)?.to_vec();
    let dry = table.require(&basis.mass_dry)?.to_vec();

    let mut out = table.clone();
    for col in table.columns() {
        let values: Vec<f64> = match basis.role(&col.name) {
            ColumnRole::WetMass | ColumnRole::DryMass => continue,
            ColumnRole::Moisture => wet.iter().zip(&dry).map(|(w, d)| w - d).collect(),
            ColumnRole::Component => col
                .values
                .iter()
                .zip(&dry)
                .map(|(pct, d)| pct * d / 100.0)
                .collect(),
        };
        out.set_column(&col.name, values)?;
    }
    Ok(out)
}

/// Convert a mass table back to relative composition.
///
/// Rows with zero mass convert to 0 % rather than NaN.
pub fn to_composition(table: &Table, basis: &MassBasis) -> MfResult<Table> {
    let wet = table.require(&basis.mass_wet)?.to_vec();
    let dry = table.require(&basis.mass_dry)?.to_vec();

    let mut out = table.clone();
    for col in table.columns() {
        let denominator = match basis.role(&col.name) {
            ColumnRole::WetMass | ColumnRole::DryMass => continue,
            ColumnRole::Moisture => &wet,
            ColumnRole::Component => &dry,
        };
        let values: Vec<f64> = col
            .values
            .iter()
            .zip(denominator)
            .map(|(m, d)| ratio_pct(*m, *d))
            .collect();
        out.set_column(&col.name, values)?;
    }
    Ok(out)
}

/// Total mass and mass-weighted composition over all rows, as a one-row table.
pub fn aggregate(table: &Table, basis: &MassBasis) -> MfResult<Table> {
    let mass = to_mass(table, basis)?;
    let sums = mass.column_sums();
    let columns: Vec<(String, Vec<f64>)> = sums.into_iter().map(|(n, v)| (n, vec![v])).collect();
    let totals = Table::new(crate::RowIndex::range("index", 1), columns)?;
    to_composition(&totals, basis)
}

/// Element-wise sum of mass tables sharing the same row count and columns.
pub fn sum_masses<'a, I>(tables: I) -> MfResult<Option<Table>>
where
    I: IntoIterator<Item = &'a Table>,
{
    let mut acc: Option<Table> = None;
    for t in tables {
        acc = Some(match acc {
            None => t.clone(),
            Some(mut a) => {
                if a.len() != t.len() {
                    return Err(MfError::IndexMismatch {
                        what: format!("cannot add tables of {} and {} rows", a.len(), t.len()),
                    });
                }
                for col in t.columns() {
                    let summed: Vec<f64> = match a.column(&col.name) {
                        Some(existing) => existing
                            .iter()
                            .zip(&col.values)
                            .map(|(x, y)| x + y)
                            .collect(),
                        None => col.values.clone(),
                    };
                    a.set_column(&col.name, summed)?;
                }
                a
            }
        });
    }
    Ok(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RowIndex;

    fn sample() -> Table {
        Table::new(
            RowIndex::range("index", 2),
            vec![
                ("mass_wet", vec![100.0, 50.0]),
                ("mass_dry", vec![90.0, 40.0]),
                ("H2O", vec![10.0, 20.0]),
                ("Fe", vec![57.0, 60.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn mass_conversion_round_trip() {
        let basis = MassBasis::default();
        let mass = to_mass(&sample(), &basis).unwrap();
        assert_eq!(mass.column("H2O").unwrap(), &[10.0, 10.0]);
        assert!((mass.column("Fe").unwrap()[0] - 51.3).abs() < 1e-12);

        let back = to_composition(&mass, &basis).unwrap();
        let fe = back.column("Fe").unwrap();
        assert!((fe[0] - 57.0).abs() < 1e-12);
        assert!((fe[1] - 60.0).abs() < 1e-12);
        assert!((back.column("H2O").unwrap()[1] - 20.0).abs() < 1e-12);
    }

    #[test]
    fn missing_basis_column_is_an_error() {
        let t = Table::new(RowIndex::range("index", 1), vec![("mass_dry", vec![1.0])]).unwrap();
        let err = to_mass(&t, &MassBasis::default()).unwrap_err();
        assert_eq!(
            err,
            MfError::MissingColumn {
                column: "mass_wet".into()
            }
        );
    }

    #[test]
    fn zero_mass_rows_give_zero_composition() {
        let t = Table::new(
            RowIndex::range("index", 1),
            vec![("mass_wet", vec![0.0]), ("mass_dry", vec![0.0]), ("Fe", vec![0.0])],
        )
        .unwrap();
        let c = to_composition(&t, &MassBasis::default()).unwrap();
        assert_eq!(c.column("Fe").unwrap(), &[0.0]);
    }

    #[test]
    fn aggregate_is_mass_weighted() {
        let agg = aggregate(&sample(), &MassBasis::default()).unwrap();
        assert_eq!(agg.len(), 1);
        assert_eq!(agg.column("mass_wet").unwrap(), &[150.0]);
        assert_eq!(agg.column("mass_dry").unwrap(), &[130.0]);
        let fe = agg.column("Fe").unwrap()[0];
        let expected = (57.0 * 90.0 + 60.0 * 40.0) / 130.0;
        assert!((fe - expected).abs() < 1e-9);
        let h2o = agg.column("H2O").unwrap()[0];
        assert!((h2o - 20.0 / 150.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn format_hints() {
        let basis = MassBasis::default();
        assert_eq!(basis.format_hint("mass_dry").render(1234.56), "1234.6");
        assert_eq!(basis.format_hint("Fe").render(57.123), "57.12%");
    }

    #[test]
    fn sum_masses_adds_columns() {
        let t = sample();
        let total = sum_masses([&t, &t]).unwrap().unwrap();
        assert_eq!(total.column("mass_wet").unwrap(), &[200.0, 100.0]);
        assert!(sum_masses(std::iter::empty()).unwrap().is_none());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::RowIndex;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn composition_mass_round_trip(
            rows in prop::collection::vec((1.0_f64..1000.0, 0.0_f64..0.5, 0.0_f64..100.0), 1..8)
        ) {
            let dry: Vec<f64> = rows.iter().map(|r| r.0).collect();
            let wet: Vec<f64> = rows.iter().map(|r| r.0 * (1.0 + r.1)).collect();
            let fe: Vec<f64> = rows.iter().map(|r| r.2).collect();
            let h2o: Vec<f64> = wet.iter().zip(&dry).map(|(w, d)| (w - d) / w * 100.0).collect();
            let t = Table::new(
                RowIndex::range("index", rows.len()),
                vec![
                    ("mass_wet", wet),
                    ("mass_dry", dry),
                    ("H2O", h2o.clone()),
                    ("Fe", fe.clone()),
                ],
            ).unwrap();

            let basis = MassBasis::default();
            let back = to_composition(&to_mass(&t, &basis).unwrap(), &basis).unwrap();
            for (a, b) in back.column("Fe").unwrap().iter().zip(&fe) {
                prop_assert!((a - b).abs() < 1e-9);
            }
            for (a, b) in back.column("H2O").unwrap().iter().zip(&h2o) {
                prop_assert!((a - b).abs() < 1e-9);
            }
        }
    }
}
