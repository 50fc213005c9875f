// models/src/medical/payment.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{ValidationError, ValidationResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    Card,
    Online,
    Other,
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> ValidationResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "online" | "upi" => Ok(PaymentMethod::Online),
            "other" => Ok(PaymentMethod::Other),
            _ => Err(ValidationError::UnknownVariant { kind: "payment method", value: s.to_string() }),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "Cash"),
            PaymentMethod::Card => write!(f, "Card"),
            PaymentMethod::Online => write!(f, "Online"),
            PaymentMethod::Other => write!(f, "Other"),
        }
    }
}

/// One payment applied against an appointment's fee. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub received_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Settlement state of an appointment, derived from its fee and payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
}

impl PaymentStatus {
    /// Classifies a fee against the amount paid so far.
    ///
    /// A zero fee is always `Unpaid`, whatever has been paid.
    pub fn from_totals(fee: Decimal, paid: Decimal) -> Self {
        if fee > Decimal::ZERO && paid >= fee {
            PaymentStatus::Paid
        } else if paid > Decimal::ZERO && paid < fee {
            PaymentStatus::PartiallyPaid
        } else {
            PaymentStatus::Unpaid
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Unpaid => write!(f, "Unpaid"),
            PaymentStatus::PartiallyPaid => write!(f, "Partially Paid"),
            PaymentStatus::Paid => write!(f, "Paid"),
        }
    }
}

/// The largest fee or payment accepted, 999,999,999.99.
pub fn max_amount() -> Decimal {
    Decimal::new(99_999_999_999, 2)
}

/// Checks that a fee or payment is whole cents and within [`max_amount`].
/// The sign is left to the caller.
pub fn check_amount(amount: Decimal) -> ValidationResult<Decimal> {
    if amount.normalize().scale() > 2 {
        return Err(ValidationError::SubCentAmount(amount));
    }
    if amount.abs() > max_amount() {
        return Err(ValidationError::AmountTooLarge { amount, max: max_amount() });
    }
    Ok(amount)
}

/// Parses a user-entered money amount such as `250`, `250.50` or `1,200`.
pub fn parse_amount(raw: &str) -> ValidationResult<Decimal> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    cleaned
        .parse::<Decimal>()
        .ok()
        .filter(|amount| amount.normalize().scale() <= 2)
        .ok_or_else(|| ValidationError::InvalidAmount(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_classify_totals() {
        let fee = Decimal::from(500);
        assert_eq!(PaymentStatus::from_totals(fee, Decimal::ZERO), PaymentStatus::Unpaid);
        assert_eq!(PaymentStatus::from_totals(fee, Decimal::from(1)), PaymentStatus::PartiallyPaid);
        assert_eq!(PaymentStatus::from_totals(fee, fee), PaymentStatus::Paid);
    }

    #[test]
    fn should_treat_zero_fee_as_unpaid() {
        assert_eq!(PaymentStatus::from_totals(Decimal::ZERO, Decimal::ZERO), PaymentStatus::Unpaid);
        assert_eq!(PaymentStatus::from_totals(Decimal::ZERO, Decimal::from(10)), PaymentStatus::Unpaid);
    }

    #[test]
    fn should_parse_amounts_with_separators() {
        assert_eq!(parse_amount("1,200").unwrap(), Decimal::from(1200));
        assert_eq!(parse_amount(" 99.50 ").unwrap(), Decimal::new(9950, 2));
        assert_eq!(parse_amount("ten").unwrap_err(), ValidationError::InvalidAmount("ten".to_string()));
    }

    #[test]
    fn should_reject_fractions_of_a_cent() {
        assert_eq!(parse_amount("999.999").unwrap_err(), ValidationError::InvalidAmount("999.999".to_string()));
        assert_eq!(parse_amount("12.500").unwrap(), Decimal::new(1250, 2));
        assert_eq!(
            check_amount(Decimal::new(10005, 3)).unwrap_err(),
            ValidationError::SubCentAmount(Decimal::new(10005, 3))
        );
    }

    #[test]
    fn should_cap_amounts() {
        assert!(check_amount(max_amount()).is_ok());
        assert_eq!(
            check_amount(Decimal::MAX).unwrap_err(),
            ValidationError::AmountTooLarge { amount: Decimal::MAX, max: max_amount() }
        );
    }

    #[test]
    fn should_parse_payment_methods() {
        assert_eq!("UPI".parse::<PaymentMethod>().unwrap(), PaymentMethod::Online);
        assert_eq!("card".parse::<PaymentMethod>().unwrap(), PaymentMethod::Card);
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }
}
