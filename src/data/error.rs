use thiserror::Error;

/// Errors raised while validating or transforming a roster.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("roster has no columns")]
    NoColumns,

    #[error("column at position {0} has an empty name")]
    EmptyHeader(usize),

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("column '{0}' is reserved for derived values; rename it before loading")]
    ReservedColumn(String),

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    /// No column holds marks, so Total and Average are undefined.
    #[error("no numeric subject columns found")]
    NoNumericColumns,

    #[error("derived column '{0}' cannot be used as a subject column")]
    DerivedSubjectColumn(String),

    #[error("histogram needs at least one bin")]
    InvalidBinCount,
}
