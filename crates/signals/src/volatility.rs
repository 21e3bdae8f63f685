//! Annualized historical volatility from closing prices.

use crate::stats::sample_std;

/// Trading sessions per year used for annualization by default.
pub const TRADING_DAYS_PER_YEAR: u32 = 252;

/// Annualized volatility of the most recent `window` log returns.
///
/// Missing (non-finite) and non-positive closes are dropped before returns
/// are taken. Uses the sample standard deviation, scaled by
/// `sqrt(trading_days_per_year)`.
///
/// # Returns
/// `None` when fewer than `window + 1` usable closes exist or the window is
/// too short to have a sample deviation. A flat series yields `Some(0.0)`.
#[must_use]
pub fn historical_volatility(
    closes: &[f64],
    window: usize,
    trading_days_per_year: u32,
) -> Option<f64> {
    let usable: Vec<f64> = closes
        .iter()
        .copied()
        .filter(|c| c.is_finite() && *c > 0.0)
        .collect();

    if window == 0 || usable.len() < window + 1 {
        return None;
    }

    let returns: Vec<f64> = usable.windows(2).map(|w| (w[1] / w[0]).ln()).collect();
    let recent = &returns[returns.len() - window..];
    let std = sample_std(recent)?;
    let annualized = std * f64::from(trading_days_per_year).sqrt();

    annualized.is_finite().then_some(annualized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_series_reference_value() {
        let closes = [100.0, 101.0, 102.0, 100.0, 101.0];
        let vol = historical_volatility(&closes, 4, TRADING_DAYS_PER_YEAR).unwrap();
        assert!((vol - 0.235_898_5).abs() < 1e-6, "got {vol}");
    }

    #[test]
    fn flat_series_has_zero_volatility() {
        let closes = vec![100.0; 25];
        let vol = historical_volatility(&closes, 20, TRADING_DAYS_PER_YEAR).unwrap();
        assert!(vol.abs() < 1e-12);
    }

    #[test]
    fn insufficient_history_is_undefined() {
        let closes = vec![100.0; 20];
        assert!(historical_volatility(&closes, 20, 252).is_none());
        assert!(historical_volatility(&[], 20, 252).is_none());
        assert!(historical_volatility(&closes, 0, 252).is_none());
    }

    #[test]
    fn missing_closes_are_skipped() {
        let clean = [100.0, 101.0, 102.0, 100.0, 101.0];
        let gappy = [100.0, f64::NAN, 101.0, 102.0, f64::NAN, 100.0, 101.0];
        let a = historical_volatility(&clean, 4, 252).unwrap();
        let b = historical_volatility(&gappy, 4, 252).unwrap();
        assert!((a - b).abs() < 1e-12);

        let sparse = [100.0, f64::NAN, f64::NAN, 101.0];
        assert!(historical_volatility(&sparse, 2, 252).is_none());
    }

    #[test]
    fn only_trailing_window_counts() {
        let mut closes = vec![50.0, 150.0, 60.0, 140.0];
        closes.extend(std::iter::repeat(100.0).take(21));
        let vol = historical_volatility(&closes, 20, 252).unwrap();
        assert!(vol.abs() < 1e-12);
    }

    #[test]
    fn annualization_scales_with_sqrt_of_periods() {
        let closes = [100.0, 102.0, 99.0, 103.0, 101.0, 104.0];
        let daily = historical_volatility(&closes, 5, 1).unwrap();
        let yearly = historical_volatility(&closes, 5, 252).unwrap();
        assert!((yearly / daily - 252f64.sqrt()).abs() < 1e-9);
    }
}
