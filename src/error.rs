use thiserror::Error;

// Unified error type for mvkernels

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KernelError {
    #[error("row count mismatch in {op}: expected {expected}, found {found}")]
    RowMismatch { op: &'static str, expected: usize, found: usize },
    #[error("column count mismatch in {op}: expected {expected}, found {found}")]
    ColumnMismatch { op: &'static str, expected: usize, found: usize },
    #[error("coefficient vector in {op} has length {found}, expected {expected} (one per column)")]
    CoeffLength { op: &'static str, expected: usize, found: usize },
    #[error("result buffer in {op} has length {found}, expected {expected}")]
    ResultLength { op: &'static str, expected: usize, found: usize },
    #[error("row override {requested} in {op} exceeds the operand row count {available}")]
    RowOverride { op: &'static str, requested: usize, available: usize },
    #[error("weights in {op} have {found} columns, expected 1 or {expected}")]
    WeightShape { op: &'static str, expected: usize, found: usize },
    #[error("destination and source of {0} partially overlap")]
    PartialOverlap(&'static str),
    #[error("invalid view: {0}")]
    InvalidView(String),
}

pub type Result<T> = std::result::Result<T, KernelError>;
