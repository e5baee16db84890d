use crate::enums::CellValue;
use crate::error::CoreError;

/// One result row exactly as the driver produced it: ordered, named cells.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRow {
    cells: Vec<(String, CellValue)>,
}

impl RawRow {
    pub fn new(cells: Vec<(String, CellValue)>) -> Self {
        Self { cells }
    }

    /// Appends a cell, builder style. Handy for fixtures and mocks.
    pub fn with(mut self, column: impl Into<String>, value: CellValue) -> Self {
        self.cells.push((column.into(), value));
        self
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, CellValue)> {
        self.cells.iter()
    }
}

/// Names of the metadata columns that precede the day-by-day readings.
///
/// Rows are decoded by these names rather than by position, so a source that
/// reorders its columns cannot shift a metadata value into the readings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub row_key: String,
    pub trial_id: String,
    pub patient_id: String,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            row_key: "id".to_string(),
            trial_id: "trial_id".to_string(),
            patient_id: "patient_id".to_string(),
        }
    }
}

impl ColumnLayout {
    pub fn is_metadata(&self, column: &str) -> bool {
        column == self.row_key || column == self.trial_id || column == self.patient_id
    }
}

/// A query row split into its metadata and its readings. The row key column
/// must be present but is not kept.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialRow {
    pub trial_id: String,
    pub patient_id: String,
    /// Every non-metadata column, in source order. Values are not yet
    /// interpreted as numbers.
    pub readings: Vec<(String, CellValue)>,
}

impl TrialRow {
    /// Decodes `raw` (the `row`-th row of a result set) against `layout`.
    pub fn decode(row: usize, raw: &RawRow, layout: &ColumnLayout) -> Result<Self, CoreError> {
        required(row, raw, &layout.row_key)?;
        let trial_id = label(row, raw, &layout.trial_id)?;
        let patient_id = label(row, raw, &layout.patient_id)?;

        let readings = raw
            .iter()
            .filter(|(name, _)| !layout.is_metadata(name))
            .cloned()
            .collect();

        Ok(Self {
            trial_id,
            patient_id,
            readings,
        })
    }

    pub fn reading_columns(&self) -> impl Iterator<Item = &str> {
        self.readings.iter().map(|(name, _)| name.as_str())
    }
}

fn required<'a>(row: usize, raw: &'a RawRow, column: &str) -> Result<&'a CellValue, CoreError> {
    raw.get(column).ok_or_else(|| CoreError::MissingColumn {
        row,
        column: column.to_string(),
    })
}

fn label(row: usize, raw: &RawRow, column: &str) -> Result<String, CoreError> {
    let value = required(row, raw, column)?;
    value.as_label().ok_or_else(|| CoreError::InvalidMetadata {
        row,
        column: column.to_string(),
        value: value.to_string(),
    })
}
