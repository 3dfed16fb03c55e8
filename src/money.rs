//! Price-like request fields and their conversion to minor units (cents).

use serde::Deserialize;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoneyUnit {
    Major,
    Minor,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MoneyInput {
    Tagged { amount: f64, unit: MoneyUnit },
    Bare(f64),
}

impl From<i64> for MoneyInput {
    fn from(cents: i64) -> Self {
        MoneyInput::Tagged {
            amount: cents as f64,
            unit: MoneyUnit::Minor,
        }
    }
}

/// Largest amount accepted for any price-like field: R$ 10 billion, in cents.
pub const MAX_MINOR_UNITS: i64 = 1_000_000_000_000;

/// Small values with a fractional part are read as reais, everything else as cents.
pub fn looks_like_major_units(value: f64) -> bool {
    value < 1000.0 && value.fract() != 0.0
}

fn checked_cents(field: &str, cents: f64) -> AppResult<i64> {
    let cents = cents.round();
    if !cents.is_finite() {
        return Err(AppError::validation(format!("{field} must be a finite number")));
    }
    if cents.abs() > MAX_MINOR_UNITS as f64 {
        return Err(AppError::validation(format!(
            "{field} cannot exceed {MAX_MINOR_UNITS} cents"
        )));
    }
    Ok(cents as i64)
}

pub fn normalize_minor_units(field: &str, value: f64) -> AppResult<i64> {
    if looks_like_major_units(value) {
        checked_cents(field, value * 100.0)
    } else {
        checked_cents(field, value)
    }
}

impl MoneyInput {
    pub fn to_minor_units(self, field: &str) -> AppResult<i64> {
        match self {
            MoneyInput::Bare(value) => normalize_minor_units(field, value),
            MoneyInput::Tagged {
                amount,
                unit: MoneyUnit::Major,
            } => checked_cents(field, amount * 100.0),
            MoneyInput::Tagged {
                amount,
                unit: MoneyUnit::Minor,
            } => {
                if amount.is_finite() && amount.fract() != 0.0 {
                    return Err(AppError::validation(format!(
                        "{field} in minor units must be a whole number"
                    )));
                }
                checked_cents(field, amount)
            }
        }
    }
}

/// Resolves an optional price field, rejecting negative amounts.
pub fn optional_cents(field: &str, input: Option<MoneyInput>) -> AppResult<Option<i64>> {
    let Some(input) = input else {
        return Ok(None);
    };
    let cents = input.to_minor_units(field)?;
    if cents < 0 {
        return Err(AppError::validation(format!("{field} cannot be negative")));
    }
    Ok(Some(cents))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cents(value: f64) -> i64 {
        normalize_minor_units("price", value).unwrap()
    }

    #[test]
    fn fractional_values_under_a_thousand_are_reais() {
        assert_eq!(cents(150.5), 15050);
        assert_eq!(cents(999.99), 99999);
        assert_eq!(cents(0.5), 50);
    }

    #[test]
    fn whole_or_large_values_pass_through() {
        // 150.00 arrives as a whole number and is kept as cents.
        assert_eq!(cents(150.0), 150);
        assert_eq!(cents(15000.0), 15000);
        assert_eq!(cents(1000.5), 1001);
        assert_eq!(cents(2500.25), 2500);
    }

    #[test]
    fn heuristic_is_stable_once_applied() {
        for value in [0.0, 12.0, 999.0, 1000.0, 1234.56, 50000.0] {
            let once = cents(value);
            assert_eq!(cents(once as f64), once);
        }
    }

    #[test]
    fn amounts_above_the_ceiling_are_rejected() {
        assert_eq!(cents(MAX_MINOR_UNITS as f64), MAX_MINOR_UNITS);
        assert!(normalize_minor_units("amountPaid", 1e19).is_err());
        assert!(normalize_minor_units("amountPaid", f64::MAX).is_err());
        assert!(normalize_minor_units("amountPaid", f64::NAN).is_err());

        let huge_major = MoneyInput::Tagged {
            amount: 1e11,
            unit: MoneyUnit::Major,
        };
        assert!(huge_major.to_minor_units("price").is_err());
        let huge_minor = MoneyInput::Tagged {
            amount: 9.3e18,
            unit: MoneyUnit::Minor,
        };
        assert!(huge_minor.to_minor_units("price").is_err());
        assert!(optional_cents("price", Some(MoneyInput::Bare(-1e19))).is_err());
    }

    #[test]
    fn explicit_units_skip_the_heuristic() {
        let major: MoneyInput = serde_json::from_str(r#"{"amount":150.0,"unit":"major"}"#).unwrap();
        assert_eq!(major.to_minor_units("price").unwrap(), 15000);

        let large: MoneyInput = serde_json::from_str(r#"{"amount":1500,"unit":"major"}"#).unwrap();
        assert_eq!(large.to_minor_units("price").unwrap(), 150000);

        let minor: MoneyInput = serde_json::from_str(r#"{"amount":999,"unit":"minor"}"#).unwrap();
        assert_eq!(minor.to_minor_units("price").unwrap(), 999);

        let bad: MoneyInput = serde_json::from_str(r#"{"amount":9.5,"unit":"minor"}"#).unwrap();
        assert!(bad.to_minor_units("price").is_err());
    }

    #[test]
    fn bare_numbers_use_the_heuristic() {
        let bare: MoneyInput = serde_json::from_str("150.5").unwrap();
        assert_eq!(bare, MoneyInput::Bare(150.5));
        assert_eq!(bare.to_minor_units("totalPrice").unwrap(), 15050);
    }

    #[test]
    fn negative_prices_are_rejected() {
        assert!(optional_cents("price", Some(MoneyInput::Bare(-100.0))).is_err());
        assert_eq!(optional_cents("price", None).unwrap(), None);
    }
}
