//! Element-wise folds shared by trial and patient statistics.
//!
//! Unlike `f64::max`/`f64::min`, these propagate NaN: a missing reading makes
//! the whole reduction NaN instead of being silently skipped.

pub(crate) fn max(acc: f64, value: f64) -> f64 {
    if acc.is_nan() || value.is_nan() {
        f64::NAN
    } else {
        acc.max(value)
    }
}

pub(crate) fn min(acc: f64, value: f64) -> f64 {
    if acc.is_nan() || value.is_nan() {
        f64::NAN
    } else {
        acc.min(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_propagate_nan() {
        assert!(max(1.0, f64::NAN).is_nan());
        assert!(min(f64::NAN, 1.0).is_nan());
        assert_eq!(max(f64::NEG_INFINITY, -3.0), -3.0);
        assert_eq!(min(f64::INFINITY, -3.0), -3.0);
    }
}
