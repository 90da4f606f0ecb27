use thiserror::Error;

pub const EXTERNAL_ID_COLUMN: &str = "external_id";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unique constraint violated on [{column}] for value [{value}]")]
    UniqueViolation {
        column: &'static str,
        value: String
    },
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage journal error: {0}")]
    Journal(#[from] csv::Error),
    #[error("Storage journal row [{line}] is invalid: {reason}")]
    CorruptRow {
        line: u64,
        reason: String
    },
    #[error("Storage is unavailable: {0}")]
    Unavailable(String)
}

impl StoreError {
    pub fn duplicate_external_id(external_id: &str) -> Self {
        Self::UniqueViolation {
            column: EXTERNAL_ID_COLUMN,
            value: external_id.to_string()
        }
    }

    /// True only for the uniqueness constraint that defines a duplicate transaction.
    pub fn is_duplicate_external_id(&self) -> bool {
        matches!(self, Self::UniqueViolation { column, .. } if *column == EXTERNAL_ID_COLUMN)
    }
}
