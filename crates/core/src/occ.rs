//! OCC option symbology (e.g., `O:AAPL250117C00150000`).

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::DataError;
use crate::types::OptionKind;

fn occ_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:O:)?([A-Z]{1,6})(\d{2})(\d{2})(\d{2})([CP])(\d{8})$")
            .expect("OCC pattern is valid")
    })
}

/// A parsed OCC contract identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OccSymbol {
    pub underlying: String,
    pub expiration: NaiveDate,
    pub kind: OptionKind,
    pub strike: Decimal,
}

impl OccSymbol {
    /// Parses an OCC identifier, with or without the `O:` prefix.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidContractId`] when the identifier does not
    /// follow the OCC layout or encodes an impossible date.
    pub fn parse(contract_id: &str) -> Result<Self, DataError> {
        let invalid = || DataError::InvalidContractId(contract_id.to_string());

        let caps = occ_pattern().captures(contract_id).ok_or_else(invalid)?;
        let year: i32 = caps[2].parse().map_err(|_| invalid())?;
        let month: u32 = caps[3].parse().map_err(|_| invalid())?;
        let day: u32 = caps[4].parse().map_err(|_| invalid())?;
        let expiration = NaiveDate::from_ymd_opt(2000 + year, month, day).ok_or_else(invalid)?;
        let kind = if &caps[5] == "C" {
            OptionKind::Call
        } else {
            OptionKind::Put
        };
        let strike_thousandths: i64 = caps[6].parse().map_err(|_| invalid())?;

        Ok(Self {
            underlying: caps[1].to_string(),
            expiration,
            kind,
            strike: Decimal::new(strike_thousandths, 3).normalize(),
        })
    }

    /// Renders the identifier with the `O:` prefix.
    #[must_use]
    pub fn to_contract_id(&self) -> String {
        let thousandths = (self.strike * Decimal::ONE_THOUSAND)
            .trunc()
            .to_i64()
            .unwrap_or_default();
        let kind = match self.kind {
            OptionKind::Call => 'C',
            OptionKind::Put => 'P',
        };
        format!(
            "O:{}{}{}{:08}",
            self.underlying,
            self.expiration.format("%y%m%d"),
            kind,
            thousandths
        )
    }
}
