use core_types::{CellValue, CoreError};
use database::DbError;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("No database connection given.")]
    Connection,

    #[error("No data found for trial '{trial_id}'")]
    EmptyResult { trial_id: String },

    #[error("{} reading(s) could not be converted to a number: {}", .failures.len(), join(.failures))]
    TypeConversion { failures: Vec<ConversionFailure> },

    #[error("Failed to parse delimited file: {0}")]
    Parse(String),

    #[error("Invalid matrix shape: {0}")]
    Shape(String),

    #[error(
        "Inflammation values should not be negative: found {value} at row {row}, column {column} ({count} negative value(s) in total)"
    )]
    NegativeValue {
        row: usize,
        column: usize,
        value: f64,
        count: usize,
    },

    #[error("Patient index {index} is out of range for a trial with {len} patient(s)")]
    Index { index: usize, len: usize },

    #[error("Cannot reduce an empty matrix: {0}")]
    Dimension(String),

    #[error("Database error: {0}")]
    Database(#[source] DbError),
}

/// One reading cell that had no numeric interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionFailure {
    pub row: usize,
    pub patient_id: String,
    pub column: String,
    pub value: CellValue,
}

impl fmt::Display for ConversionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {} (patient {}), column '{}': {}",
            self.row, self.patient_id, self.column, self.value
        )
    }
}

fn join(failures: &[ConversionFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<DbError> for AnalyticsError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NoConnection => AnalyticsError::Connection,
            other => AnalyticsError::Database(other),
        }
    }
}

impl From<CoreError> for AnalyticsError {
    fn from(e: CoreError) -> Self {
        AnalyticsError::Shape(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_connection_maps_to_connection_error() {
        let err: AnalyticsError = DbError::NoConnection.into();
        assert!(matches!(err, AnalyticsError::Connection));
    }

    #[test]
    fn conversion_error_names_every_cell() {
        let err = AnalyticsError::TypeConversion {
            failures: vec![
                ConversionFailure {
                    row: 0,
                    patient_id: "3".to_string(),
                    column: "day_2".to_string(),
                    value: CellValue::Text("n/a".to_string()),
                },
                ConversionFailure {
                    row: 4,
                    patient_id: "7".to_string(),
                    column: "day_9".to_string(),
                    value: CellValue::Null,
                },
            ],
        };
        assert_eq!(
            err.to_string(),
            "2 reading(s) could not be converted to a number: \
             row 0 (patient 3), column 'day_2': \"n/a\"; row 4 (patient 7), column 'day_9': NULL"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<AnalyticsError>();
        assert_sync::<AnalyticsError>();
    }
}
