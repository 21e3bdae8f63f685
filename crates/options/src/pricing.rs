//! Closed-form European option pricing (Black-Scholes, no dividends).
//!
//! Invalid inputs never panic: non-positive or NaN spot, strike, or sigma,
//! and NaN or negative time, produce `None`. Time below
//! [`MIN_TIME_TO_EXPIRY`] (including zero) is clamped so prices converge to
//! intrinsic value instead of dividing by zero.

use std::f64::consts::{PI, SQRT_2};

use option_insight_core::{Greeks, OptionKind};
use serde::{Deserialize, Serialize};

/// Smallest model time in years.
pub const MIN_TIME_TO_EXPIRY: f64 = 1e-6;

/// Vega is quoted per one volatility point.
pub const VEGA_SCALE: f64 = 0.01;

/// Model price with its sensitivities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricedOption {
    pub price: f64,
    pub greeks: Greeks,
}

/// Standard normal cumulative distribution function.
#[must_use]
pub fn norm_cdf(x: f64) -> f64 {
    0.5 * (1.0 + libm::erf(x / SQRT_2))
}

/// Standard normal density.
#[must_use]
pub fn norm_pdf(x: f64) -> f64 {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// Validated model inputs with the derived `d1`/`d2` terms.
struct Terms {
    spot: f64,
    strike: f64,
    rate: f64,
    sigma: f64,
    sqrt_t: f64,
    d1: f64,
    d2: f64,
    discount: f64,
}

impl Terms {
    fn new(spot: f64, strike: f64, time: f64, rate: f64, sigma: f64) -> Option<Self> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(spot) || !positive(strike) || !positive(sigma) || !rate.is_finite() {
            return None;
        }
        if time.is_nan() || time < 0.0 {
            return None;
        }

        let time = time.max(MIN_TIME_TO_EXPIRY);
        let sqrt_t = time.sqrt();
        let d1 = ((spot / strike).ln() + (rate + 0.5 * sigma * sigma) * time) / (sigma * sqrt_t);
        let d2 = d1 - sigma * sqrt_t;

        Some(Self {
            spot,
            strike,
            rate,
            sigma,
            sqrt_t,
            d1,
            d2,
            discount: (-rate * time).exp(),
        })
    }

    fn price(&self, kind: OptionKind) -> f64 {
        let value = match kind {
            OptionKind::Call => {
                self.spot * norm_cdf(self.d1) - self.strike * self.discount * norm_cdf(self.d2)
            }
            OptionKind::Put => {
                self.strike * self.discount * norm_cdf(-self.d2) - self.spot * norm_cdf(-self.d1)
            }
        };
        value.max(0.0)
    }

    fn greeks(&self, kind: OptionKind) -> Greeks {
        let pdf_d1 = norm_pdf(self.d1);
        let decay = -self.spot * pdf_d1 * self.sigma / (2.0 * self.sqrt_t);
        let carry = self.rate * self.strike * self.discount;

        let (delta, theta) = match kind {
            OptionKind::Call => (norm_cdf(self.d1), decay - carry * norm_cdf(self.d2)),
            OptionKind::Put => (norm_cdf(self.d1) - 1.0, decay + carry * norm_cdf(-self.d2)),
        };

        Greeks {
            delta,
            gamma: pdf_d1 / (self.spot * self.sigma * self.sqrt_t),
            theta,
            vega: self.spot * pdf_d1 * self.sqrt_t * VEGA_SCALE,
        }
    }
}

/// Black-Scholes price of a European option.
///
/// # Arguments
/// * `spot` - Underlying price
/// * `strike` - Strike price
/// * `time_to_expiry` - Years until expiration
/// * `risk_free_rate` - Annualized, continuously compounded
/// * `sigma` - Annualized volatility (e.g., 0.20 for 20%)
/// * `kind` - Call or put
///
/// # Returns
/// The price floored at zero, or `None` for invalid inputs.
#[must_use]
pub fn black_scholes(
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    risk_free_rate: f64,
    sigma: f64,
    kind: OptionKind,
) -> Option<f64> {
    Terms::new(spot, strike, time_to_expiry, risk_free_rate, sigma).map(|t| t.price(kind))
}

/// Black-Scholes price together with delta, gamma, theta (per year), and vega
/// (per volatility point).
#[must_use]
pub fn black_scholes_greeks(
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    risk_free_rate: f64,
    sigma: f64,
    kind: OptionKind,
) -> Option<PricedOption> {
    let terms = Terms::new(spot, strike, time_to_expiry, risk_free_rate, sigma)?;
    Some(PricedOption {
        price: terms.price(kind),
        greeks: terms.greeks(kind),
    })
}
