//! Builds trial matrices from delimited files and from query results.
//!
//! Both paths end in [`stack_rows`], which owns the rectangularity check.

use crate::error::{AnalyticsError, ConversionFailure};
use core_types::{ColumnLayout, RawRow, TrialRow};
use ndarray::{Array1, Array2, Axis};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A matrix decoded from query rows, with the patient identifier of each row.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryMatrix {
    pub data: Array2<f64>,
    pub patient_ids: Vec<String>,
}

/// Reads a comma-delimited file of readings: one patient per line, no header.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Array2<f64>, AnalyticsError> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| AnalyticsError::Parse(format!("cannot open {}: {}", path.display(), e)))?;

    let matrix = parse_csv(file)?;
    tracing::debug!(path = %path.display(), shape = ?matrix.dim(), "Loaded delimited file");
    Ok(matrix)
}

/// Parses comma-delimited readings from any reader.
pub fn parse_csv<R: Read>(source: R) -> Result<Array2<f64>, AnalyticsError> {
    // Flexible so that whitespace-only lines reach the loop; widths are
    // checked below instead.
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AnalyticsError::Parse(e.to_string()))?;
        // Whitespace-only lines trim down to a single empty field.
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = record.position().map_or(rows.len() as u64 + 1, |p| p.line());

        if let Some(first) = rows.first() {
            if record.len() != first.len() {
                return Err(AnalyticsError::Parse(format!(
                    "line {}: found {} fields, but earlier lines have {}",
                    line,
                    record.len(),
                    first.len()
                )));
            }
        }

        let row = record
            .iter()
            .enumerate()
            .map(|(column, token)| {
                token.parse::<f64>().map_err(|_| {
                    AnalyticsError::Parse(format!(
                        "line {}, column {}: '{}' is not a number",
                        line,
                        column + 1,
                        token
                    ))
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(AnalyticsError::Parse("file contains no rows".to_string()));
    }

    stack_rows(rows)
}

/// Reconciles the rows of a trial-scoped query into a matrix.
///
/// Metadata columns are located by name through `layout`; every other column
/// is a reading. All rows must carry the same reading columns in the same
/// order. Cells that are not numeric are collected and reported together.
pub fn from_query_rows(
    trial_id: &str,
    rows: &[RawRow],
    layout: &ColumnLayout,
) -> Result<QueryMatrix, AnalyticsError> {
    if rows.is_empty() {
        tracing::warn!(trial_id, "Query returned no rows");
        return Err(AnalyticsError::EmptyResult {
            trial_id: trial_id.to_string(),
        });
    }

    let decoded = rows
        .iter()
        .enumerate()
        .map(|(idx, raw)| TrialRow::decode(idx, raw, layout))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some((idx, row)) = decoded.iter().enumerate().find(|(_, row)| row.trial_id != trial_id) {
        return Err(AnalyticsError::Shape(format!(
            "row {} belongs to trial '{}', expected '{}'",
            idx, row.trial_id, trial_id
        )));
    }

    let expected: Vec<&str> = decoded[0].reading_columns().collect();
    if expected.is_empty() {
        return Err(AnalyticsError::Shape(format!(
            "rows carry no reading columns besides '{}', '{}' and '{}'",
            layout.row_key, layout.trial_id, layout.patient_id
        )));
    }
    for (idx, row) in decoded.iter().enumerate().skip(1) {
        let columns: Vec<&str> = row.reading_columns().collect();
        if columns != expected {
            return Err(AnalyticsError::Shape(format!(
                "row {} has reading columns {:?}, expected {:?}",
                idx, columns, expected
            )));
        }
    }

    let mut failures = Vec::new();
    let mut readings = Vec::with_capacity(decoded.len());
    for (idx, row) in decoded.iter().enumerate() {
        let mut values = Vec::with_capacity(row.readings.len());
        for (column, cell) in &row.readings {
            match cell.as_reading() {
                Some(v) => values.push(v),
                None => failures.push(ConversionFailure {
                    row: idx,
                    patient_id: row.patient_id.clone(),
                    column: column.clone(),
                    value: cell.clone(),
                }),
            }
        }
        readings.push(values);
    }

    if !failures.is_empty() {
        tracing::warn!(trial_id, failures = failures.len(), "Non-numeric readings in query result");
        return Err(AnalyticsError::TypeConversion { failures });
    }

    let data = stack_rows(readings)?;
    tracing::debug!(trial_id, shape = ?data.dim(), "Decoded query rows");

    Ok(QueryMatrix {
        data,
        patient_ids: decoded.into_iter().map(|row| row.patient_id).collect(),
    })
}

/// Stacks equally long rows into a `rows x days` matrix.
///
/// No rows gives a `0 x 0` matrix. A single row is given its patient axis
/// explicitly so it comes out as `1 x days`.
pub fn stack_rows(rows: Vec<Vec<f64>>) -> Result<Array2<f64>, AnalyticsError> {
    let Some(first) = rows.first() else {
        return Ok(Array2::zeros((0, 0)));
    };
    let days = first.len();

    if let Some((idx, row)) = rows.iter().enumerate().find(|(_, row)| row.len() != days) {
        return Err(AnalyticsError::Shape(format!(
            "row {} has {} readings, expected {}",
            idx,
            row.len(),
            days
        )));
    }

    if let [single] = rows.as_slice() {
        return Ok(Array1::from(single.clone()).insert_axis(Axis(0)));
    }

    let patients = rows.len();
    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    Array2::from_shape_vec((patients, days), flat).map_err(|e| AnalyticsError::Shape(e.to_string()))
}
