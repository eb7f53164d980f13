use thiserror::Error;

pub type MfResult<T> = Result<T, MfError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MfError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Missing column: {column}")]
    MissingColumn { column: String },

    #[error("Column {column} has {len} values but the index has {expected} rows")]
    LengthMismatch {
        column: String,
        len: usize,
        expected: usize,
    },

    #[error("Row indexes are not compatible: {what}")]
    IndexMismatch { what: String },

    #[error("Invariant violated: {what}")]
    Invariant { what: &'static str },
}
