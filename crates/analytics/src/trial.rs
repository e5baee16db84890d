use crate::error::AnalyticsError;
use crate::loader;
use crate::patient::Patient;
use crate::reduce;
use core_types::{ColumnLayout, Statistic};
use database::{query_database, QueryConnection, SqlQuery};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::Serialize;
use std::path::Path;

/// One inflammation dataset: rows are patients, columns are days.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    id: String,
    data: Array2<f64>,
    /// Source identifiers of each row, when the loader knew them.
    patient_ids: Option<Vec<String>>,
}

/// The three daily reductions of a trial, ready for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialSummary {
    pub trial_id: String,
    pub patients: usize,
    pub days: usize,
    pub daily_mean: Vec<f64>,
    pub daily_max: Vec<f64>,
    pub daily_min: Vec<f64>,
}

impl Trial {
    pub fn new(id: impl Into<String>, data: Array2<f64>) -> Self {
        Self {
            id: id.into(),
            data,
            patient_ids: None,
        }
    }

    /// Loads a trial from a comma-delimited file.
    pub fn from_csv(path: impl AsRef<Path>, id: impl Into<String>) -> Result<Self, AnalyticsError> {
        let trial = Self::new(id, loader::load_csv(path)?);
        tracing::info!(trial_id = %trial.id, shape = ?trial.shape(), "Trial loaded from file");
        Ok(trial)
    }

    /// Loads every row of `trial_id` through `conn`.
    ///
    /// The connection is consumed and closed whatever the outcome.
    pub async fn from_query<C: QueryConnection>(
        conn: Option<C>,
        trial_id: &str,
        layout: &ColumnLayout,
    ) -> Result<Self, AnalyticsError> {
        let query = SqlQuery::trial_rows(trial_id, &layout.trial_id);
        let rows = query_database(conn, &query).await?;
        let decoded = loader::from_query_rows(trial_id, &rows, layout)?;

        let trial = Self {
            id: trial_id.to_string(),
            data: decoded.data,
            patient_ids: Some(decoded.patient_ids),
        };
        tracing::info!(trial_id, shape = ?trial.shape(), "Trial loaded from database");
        Ok(trial)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    /// Replaces the whole matrix. Patient identifiers survive only if the
    /// number of patients is unchanged.
    pub fn set_data(&mut self, data: Array2<f64>) {
        if data.nrows() != self.data.nrows() {
            self.patient_ids = None;
        }
        self.data = data;
    }

    pub fn patient_ids(&self) -> Option<&[String]> {
        self.patient_ids.as_deref()
    }

    /// `(patients, days)`
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn n_patients(&self) -> usize {
        self.data.nrows()
    }

    pub fn n_days(&self) -> usize {
        self.data.ncols()
    }

    /// Mean of each day across all patients.
    pub fn daily_mean(&self) -> Result<Array1<f64>, AnalyticsError> {
        self.ensure_not_empty()?;
        self.data
            .mean_axis(Axis(0))
            .ok_or_else(|| AnalyticsError::Dimension(format!("trial {} has no patients", self.id)))
    }

    /// Maximum of each day across all patients.
    pub fn daily_max(&self) -> Result<Array1<f64>, AnalyticsError> {
        self.ensure_not_empty()?;
        Ok(self
            .data
            .fold_axis(Axis(0), f64::NEG_INFINITY, |&acc, &v| reduce::max(acc, v)))
    }

    /// Minimum of each day across all patients.
    pub fn daily_min(&self) -> Result<Array1<f64>, AnalyticsError> {
        self.ensure_not_empty()?;
        Ok(self
            .data
            .fold_axis(Axis(0), f64::INFINITY, |&acc, &v| reduce::min(acc, v)))
    }

    pub fn statistic(&self, statistic: Statistic) -> Result<Array1<f64>, AnalyticsError> {
        match statistic {
            Statistic::Mean => self.daily_mean(),
            Statistic::Max => self.daily_max(),
            Statistic::Min => self.daily_min(),
        }
    }

    pub fn summary(&self) -> Result<TrialSummary, AnalyticsError> {
        Ok(TrialSummary {
            trial_id: self.id.clone(),
            patients: self.n_patients(),
            days: self.n_days(),
            daily_mean: self.daily_mean()?.to_vec(),
            daily_max: self.daily_max()?.to_vec(),
            daily_min: self.daily_min()?.to_vec(),
        })
    }

    /// Copies out the readings of the patient in row `index`.
    pub fn get_patient(&self, index: usize) -> Result<Patient, AnalyticsError> {
        if index >= self.n_patients() {
            return Err(AnalyticsError::Index {
                index,
                len: self.n_patients(),
            });
        }
        Ok(self.patient_at(index, self.data.row(index)))
    }

    pub fn patients(&self) -> impl Iterator<Item = Patient> + '_ {
        self.data
            .rows()
            .into_iter()
            .enumerate()
            .map(move |(index, row)| self.patient_at(index, row))
    }

    /// Scales each patient's readings by that patient's own peak.
    ///
    /// Returns a new matrix of the same shape with every entry in `[0, 1]`.
    /// Entries whose ratio is undefined (all-zero or all-NaN rows, NaN
    /// readings, infinite peaks) become exactly `0`. Negative readings are
    /// rejected before anything is computed.
    pub fn normalise(&self) -> Result<Array2<f64>, AnalyticsError> {
        self.ensure_non_negative()?;

        let mut normalised = self.data.clone();
        for mut row in normalised.rows_mut() {
            // f64::max skips NaN, so this is the peak of the real readings,
            // or NaN when there are none.
            let peak = row.iter().copied().fold(f64::NAN, f64::max);
            row.mapv_inplace(|v| scale(v, peak));
        }

        tracing::debug!(trial_id = %self.id, shape = ?normalised.dim(), "Normalised trial");
        Ok(normalised)
    }

    fn patient_at(&self, index: usize, row: ArrayView1<'_, f64>) -> Patient {
        let id = self
            .patient_ids
            .as_ref()
            .and_then(|ids| ids.get(index).cloned())
            .unwrap_or_else(|| index.to_string());
        Patient::new(id, row.to_owned())
    }

    fn ensure_not_empty(&self) -> Result<(), AnalyticsError> {
        let (patients, days) = self.shape();
        if patients == 0 || days == 0 {
            return Err(AnalyticsError::Dimension(format!(
                "trial {} has shape {}x{}",
                self.id, patients, days
            )));
        }
        Ok(())
    }

    fn ensure_non_negative(&self) -> Result<(), AnalyticsError> {
        let mut first = None;
        let mut count = 0;
        for ((row, column), &value) in self.data.indexed_iter() {
            if value < 0.0 {
                first.get_or_insert((row, column, value));
                count += 1;
            }
        }

        match first {
            None => Ok(()),
            Some((row, column, value)) => {
                tracing::warn!(trial_id = %self.id, count, "Refusing to normalise negative readings");
                Err(AnalyticsError::NegativeValue {
                    row,
                    column,
                    value,
                    count,
                })
            }
        }
    }
}

fn scale(value: f64, peak: f64) -> f64 {
    let ratio = value / peak;
    if ratio.is_finite() && ratio > 0.0 {
        ratio.min(1.0)
    } else {
        0.0
    }
}
