use crate::error::AnalyticsError;
use crate::reduce;
use core_types::Statistic;
use ndarray::Array1;

/// One patient's readings across the days of a trial.
#[derive(Debug, Clone, PartialEq)]
pub struct Patient {
    id: String,
    data: Array1<f64>,
}

impl Patient {
    pub fn new(id: impl Into<String>, data: impl Into<Array1<f64>>) -> Self {
        Self {
            id: id.into(),
            data: data.into(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn data(&self) -> &Array1<f64> {
        &self.data
    }

    /// Mean reading over all days.
    pub fn daily_mean(&self) -> Result<f64, AnalyticsError> {
        self.data.mean().ok_or_else(|| self.empty())
    }

    /// Highest reading over all days.
    pub fn daily_max(&self) -> Result<f64, AnalyticsError> {
        self.fold(f64::NEG_INFINITY, reduce::max)
    }

    /// Lowest reading over all days.
    pub fn daily_min(&self) -> Result<f64, AnalyticsError> {
        self.fold(f64::INFINITY, reduce::min)
    }

    pub fn statistic(&self, statistic: Statistic) -> Result<f64, AnalyticsError> {
        match statistic {
            Statistic::Mean => self.daily_mean(),
            Statistic::Max => self.daily_max(),
            Statistic::Min => self.daily_min(),
        }
    }

    fn fold(&self, init: f64, f: fn(f64, f64) -> f64) -> Result<f64, AnalyticsError> {
        if self.data.is_empty() {
            return Err(self.empty());
        }
        Ok(self.data.iter().copied().fold(init, f))
    }

    fn empty(&self) -> AnalyticsError {
        AnalyticsError::Dimension(format!("patient {} has no readings", self.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patient() -> Patient {
        Patient::new("1", vec![1.0, 2.0, 3.0])
    }

    #[test]
    fn test_create_patient() {
        assert_eq!(patient().id(), "1");
    }

    #[test]
    fn test_patient_daily_mean() {
        assert_eq!(patient().daily_mean().unwrap(), 2.0);
    }

    #[test]
    fn test_patient_daily_max() {
        assert_eq!(patient().daily_max().unwrap(), 3.0);
    }

    #[test]
    fn test_patient_daily_min() {
        assert_eq!(patient().daily_min().unwrap(), 1.0);
    }

    #[test]
    fn single_reading_is_its_own_statistic() {
        let p = Patient::new("solo", vec![4.5]);
        for statistic in Statistic::ALL {
            assert_eq!(p.statistic(statistic).unwrap(), 4.5);
        }
    }

    #[test]
    fn empty_patient_fails_every_statistic() {
        let p = Patient::new("empty", Vec::<f64>::new());
        for statistic in Statistic::ALL {
            assert!(matches!(p.statistic(statistic), Err(AnalyticsError::Dimension(_))));
        }
    }
}
