//! Settings shared by a flowsheet and every flowsheet derived from it.

use mf_core::{MassBasis, Tolerances};

/// Tolerances for balance checks and the columns that anchor mass conversion.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlowsheetOptions {
    pub tolerances: Tolerances,
    pub basis: MassBasis,
}
