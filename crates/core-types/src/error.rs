use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Row {row} is missing the metadata column '{column}'")]
    MissingColumn { row: usize, column: String },

    #[error("Row {row}: metadata column '{column}' has unusable value {value}")]
    InvalidMetadata {
        row: usize,
        column: String,
        value: String,
    },
}
