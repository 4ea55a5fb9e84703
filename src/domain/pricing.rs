use std::str::FromStr;

use bigdecimal::{BigDecimal, ToPrimitive};
use serde::Deserialize;

use super::errors::DomainError;

/// Round `value` up to the next multiple of 10 currency units.
///
/// Percentage fees are computed in floating point and then rounded with this
/// function, so fractional won are always collected rather than dropped.
pub fn round_up_to_10(value: f64) -> i64 {
    // Snap off binary noise below a millionth first: 15000 × 0.034 evaluates
    // to 510.00000000000006 and must still bill 510.
    let value = (value * 1e6).round() / 1e6;
    ((value / 10.0).ceil() * 10.0) as i64
}

/// International carrier charge, in the carrier's currency, for a parcel of
/// the given chargeable weight.
pub trait RateTable: Send + Sync {
    fn lookup(&self, weight_kg: f64) -> Result<i64, DomainError>;
}

/// Converts a carrier charge into the local currency.
pub trait CurrencyConverter: Send + Sync {
    fn to_local(&self, foreign_amount: i64) -> Result<i64, DomainError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RateBracket {
    /// Heaviest weight (inclusive) billed at `amount`.
    pub max_kg: f64,
    pub amount: i64,
}

/// Step-function rate table: a weight is billed at the first bracket whose
/// limit it does not exceed.
#[derive(Debug, Clone)]
pub struct BracketRateTable {
    brackets: Vec<RateBracket>,
}

impl BracketRateTable {
    pub fn new(brackets: Vec<RateBracket>) -> Result<Self, DomainError> {
        if brackets.is_empty() {
            return Err(DomainError::InvalidInput(
                "rate table has no brackets".to_string(),
            ));
        }
        for bracket in &brackets {
            if !bracket.max_kg.is_finite() || bracket.max_kg <= 0.0 || bracket.amount < 0 {
                return Err(DomainError::InvalidInput(format!(
                    "rate bracket {{ max_kg: {}, amount: {} }} is out of range",
                    bracket.max_kg, bracket.amount
                )));
            }
        }
        for pair in brackets.windows(2) {
            let (lower, upper) = (pair[0], pair[1]);
            if upper.max_kg <= lower.max_kg {
                return Err(DomainError::InvalidInput(format!(
                    "rate bracket limits must increase ({} kg follows {} kg)",
                    upper.max_kg, lower.max_kg
                )));
            }
            if upper.amount < lower.amount {
                return Err(DomainError::InvalidInput(format!(
                    "rate for {} kg is lower than for {} kg",
                    upper.max_kg, lower.max_kg
                )));
            }
        }
        Ok(Self { brackets })
    }

    /// Parse a JSON array of `{ "max_kg": .., "amount": .. }` objects.
    pub fn from_json(json: &str) -> Result<Self, DomainError> {
        let brackets: Vec<RateBracket> = serde_json::from_str(json)
            .map_err(|e| DomainError::InvalidInput(format!("rate table is not valid JSON: {e}")))?;
        Self::new(brackets)
    }

    pub fn max_kg(&self) -> f64 {
        self.brackets.last().map_or(0.0, |b| b.max_kg)
    }
}

impl RateTable for BracketRateTable {
    fn lookup(&self, weight_kg: f64) -> Result<i64, DomainError> {
        if !weight_kg.is_finite() || weight_kg < 0.0 {
            return Err(DomainError::InvalidWeight(format!(
                "{weight_kg} kg cannot be rated"
            )));
        }
        self.brackets
            .iter()
            .find(|b| weight_kg <= b.max_kg)
            .map(|b| b.amount)
            .ok_or_else(|| {
                DomainError::InvalidWeight(format!(
                    "{weight_kg} kg exceeds the heaviest bracket ({} kg)",
                    self.max_kg()
                ))
            })
    }
}

/// Converts at a fixed rate, rounding the exact product up to the next
/// multiple of `rounding_unit` (10 keeps conversion in line with fee rounding).
#[derive(Debug, Clone)]
pub struct FixedRateConverter {
    rate: BigDecimal,
    rounding_unit: i64,
}

impl FixedRateConverter {
    pub fn new(rate: BigDecimal, rounding_unit: i64) -> Result<Self, DomainError> {
        if rate <= BigDecimal::from(0) {
            return Err(DomainError::InvalidInput(format!(
                "exchange rate must be positive, got {rate}"
            )));
        }
        if rounding_unit <= 0 {
            return Err(DomainError::InvalidInput(format!(
                "rounding unit must be positive, got {rounding_unit}"
            )));
        }
        Ok(Self {
            rate,
            rounding_unit,
        })
    }

    pub fn parse(rate: &str, rounding_unit: i64) -> Result<Self, DomainError> {
        let rate = BigDecimal::from_str(rate.trim())
            .map_err(|e| DomainError::InvalidInput(format!("exchange rate '{rate}': {e}")))?;
        Self::new(rate, rounding_unit)
    }
}

impl CurrencyConverter for FixedRateConverter {
    fn to_local(&self, foreign_amount: i64) -> Result<i64, DomainError> {
        if foreign_amount < 0 {
            return Err(DomainError::InvalidInput(format!(
                "cannot convert negative amount {foreign_amount}"
            )));
        }
        let units = (&self.rate * BigDecimal::from(foreign_amount)) / BigDecimal::from(self.rounding_unit);
        let mut whole_units = units.with_scale(0);
        if whole_units < units {
            whole_units += BigDecimal::from(1);
        }
        (whole_units * BigDecimal::from(self.rounding_unit))
            .to_i64()
            .ok_or_else(|| DomainError::Internal(format!("converted amount of {foreign_amount} overflows")))
    }
}
