//! Small numeric helpers shared by the estimators.

/// Arithmetic mean, `None` for an empty slice.
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator).
pub(crate) fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance =
        values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Collects a trailing window when every value in it is defined.
pub(crate) fn defined_window(values: &[Option<f64>], end: usize, len: usize) -> Option<Vec<f64>> {
    if len == 0 || end + 1 < len {
        return None;
    }
    values[end + 1 - len..=end].iter().copied().collect()
}
