use thiserror::Error;

/// Failure taxonomy of the abundance computation.
///
/// Every variant carries enough context (offending column, expected vs.
/// actual count) for a front end to render an actionable message instead
/// of a generic "computation failed".
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AbundanceError {
    /// A required column is missing from an input table.
    #[error("{table} table is missing required column '{column}'")]
    Schema { table: &'static str, column: String },

    /// A non-empty fraction line could not be parsed as a number.
    #[error("fraction line {line} is not numeric: '{value}'")]
    InputFormat { line: usize, value: String },

    /// Fraction count does not match the number of intensity columns.
    #[error("expected {expected} fraction value(s) to match the intensity columns, got {actual}")]
    InputAlignment { expected: usize, actual: usize },

    /// The inner join produced no rows: no accession overlap between the
    /// identification and annotation tables.
    #[error("no accession in the identification table matches the toxin annotation table")]
    EmptyResult,

    /// An intensity column sums to zero and the zero-fill policy is off.
    #[error("intensity column '{column}' sums to zero, cannot normalize")]
    DivisionByZero { column: String },
}
