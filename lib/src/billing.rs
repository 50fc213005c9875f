// lib/src/billing.rs

//! Payment reconciliation.
//!
//! Everything here is a pure function of an appointment's fee and payment
//! list. Nothing is cached: callers reconcile again after every payment or fee
//! edit, which keeps the derived status from drifting away from the ledger.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

use models::errors::{ValidationError, ValidationResult};
use models::{check_amount, Appointment, AppointmentStatus, Payment, PaymentStatus};

/// The derived billing view of a single appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub fee: Decimal,
    pub paid: Decimal,
    pub balance: Decimal,
    pub status: PaymentStatus,
}

/// Sums saturate, so a hand-edited seed file cannot overflow the arithmetic.
pub fn total_paid(payments: &[Payment]) -> Decimal {
    payments.iter().fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.amount))
}

pub fn reconcile(fee: Decimal, payments: &[Payment]) -> Reconciliation {
    let paid = total_paid(payments);
    Reconciliation {
        fee,
        paid,
        balance: fee.saturating_sub(paid).max(Decimal::ZERO),
        status: PaymentStatus::from_totals(fee, paid),
    }
}

pub fn reconcile_appointment(appointment: &Appointment) -> Reconciliation {
    reconcile(appointment.total_fee, &appointment.payments)
}

/// Accepts `amount` only when it lies in `(0, remaining balance]`.
pub fn validate_payment(fee: Decimal, payments: &[Payment], amount: Decimal) -> ValidationResult<()> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositivePayment(amount));
    }
    check_amount(amount)?;
    let balance = reconcile(fee, payments).balance;
    if amount > balance {
        return Err(ValidationError::PaymentExceedsBalance { amount, balance });
    }
    Ok(())
}

/// Rejects a fee edit that would leave more paid than owed.
pub fn validate_fee_change(new_fee: Decimal, payments: &[Payment]) -> ValidationResult<()> {
    if new_fee < Decimal::ZERO {
        return Err(ValidationError::NegativeFee(new_fee));
    }
    check_amount(new_fee)?;
    let paid = total_paid(payments);
    if paid > new_fee {
        return Err(ValidationError::FeeBelowPaid { fee: new_fee, paid });
    }
    Ok(())
}

/// Aggregate billing figures over a set of appointments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BillingLedger {
    pub appointments: usize,
    pub billed: Decimal,
    pub collected: Decimal,
    pub outstanding: Decimal,
    pub by_status: HashMap<PaymentStatus, usize>,
}

impl BillingLedger {
    pub fn from_appointments<'a, I>(appointments: I) -> Self
    where
        I: IntoIterator<Item = &'a Appointment>,
    {
        let mut ledger = BillingLedger::default();
        for appointment in appointments {
            let rec = reconcile_appointment(appointment);
            // A cancelled visit nobody paid for was never really billed.
            if appointment.status == AppointmentStatus::Cancelled && rec.paid.is_zero() {
                continue;
            }
            ledger.appointments += 1;
            ledger.billed = ledger.billed.saturating_add(rec.fee);
            ledger.collected = ledger.collected.saturating_add(rec.paid);
            ledger.outstanding = ledger.outstanding.saturating_add(rec.balance);
            *ledger.by_status.entry(rec.status).or_insert(0) += 1;
        }
        ledger
    }

    pub fn count(&self, status: PaymentStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use models::{AppointmentId, PatientId, PaymentMethod};

    fn payment(amount: i64) -> Payment {
        Payment {
            amount: Decimal::from(amount),
            method: PaymentMethod::Cash,
            received_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
            note: None,
        }
    }

    fn appointment(id: u64, fee: i64, paid: &[i64], status: AppointmentStatus) -> Appointment {
        Appointment {
            id: AppointmentId(id),
            patient_id: PatientId(1),
            date: "2024-05-01".to_string(),
            time: "09:00".to_string(),
            reason: "Review".to_string(),
            status,
            notes: None,
            diagnosis: None,
            total_fee: Decimal::from(fee),
            payments: paid.iter().map(|a| payment(*a)).collect(),
        }
    }

    #[test]
    fn should_settle_when_payments_cover_fee() {
        let rec = reconcile(Decimal::from(1000), &[payment(300), payment(700)]);
        assert_eq!(rec.paid, Decimal::from(1000));
        assert_eq!(rec.balance, Decimal::ZERO);
        assert_eq!(rec.status, PaymentStatus::Paid);
    }

    #[test]
    fn should_leave_fee_outstanding_without_payments() {
        let rec = reconcile(Decimal::from(500), &[]);
        assert_eq!(rec.status, PaymentStatus::Unpaid);
        assert_eq!(rec.balance, Decimal::from(500));
    }

    #[test]
    fn should_treat_zero_fee_as_unpaid() {
        let rec = reconcile(Decimal::ZERO, &[]);
        assert_eq!(rec.status, PaymentStatus::Unpaid);
        assert_eq!(rec.balance, Decimal::ZERO);
    }

    #[test]
    fn should_match_status_rule_over_a_grid() {
        for fee in [0i64, 1, 250, 1000] {
            for paid in [0i64, 1, 249, 250, 999, 1000] {
                let payments = if paid == 0 { vec![] } else { vec![payment(paid)] };
                let rec = reconcile(Decimal::from(fee), &payments);
                let expected = if paid >= fee && fee > 0 {
                    PaymentStatus::Paid
                } else if paid > 0 && paid < fee {
                    PaymentStatus::PartiallyPaid
                } else {
                    PaymentStatus::Unpaid
                };
                assert_eq!(rec.status, expected, "fee={} paid={}", fee, paid);
            }
        }
    }

    #[test]
    fn should_accept_payment_up_to_balance() {
        let fee = Decimal::from(500);
        let history = [payment(200)];
        assert!(validate_payment(fee, &history, Decimal::from(300)).is_ok());
        assert_eq!(
            validate_payment(fee, &history, Decimal::from(301)).unwrap_err(),
            ValidationError::PaymentExceedsBalance { amount: Decimal::from(301), balance: Decimal::from(300) }
        );
    }

    #[test]
    fn should_reject_non_positive_payment() {
        let fee = Decimal::from(500);
        assert_eq!(
            validate_payment(fee, &[], Decimal::ZERO).unwrap_err(),
            ValidationError::NonPositivePayment(Decimal::ZERO)
        );
        assert!(validate_payment(fee, &[], Decimal::from(-20)).is_err());
    }

    #[test]
    fn should_reject_any_payment_against_zero_fee() {
        assert!(validate_payment(Decimal::ZERO, &[], Decimal::from(1)).is_err());
    }

    #[test]
    fn should_reject_fee_below_paid() {
        let history = [payment(400)];
        assert!(validate_fee_change(Decimal::from(400), &history).is_ok());
        assert_eq!(
            validate_fee_change(Decimal::from(399), &history).unwrap_err(),
            ValidationError::FeeBelowPaid { fee: Decimal::from(399), paid: Decimal::from(400) }
        );
    }

    #[test]
    fn should_reject_sub_cent_payment() {
        let amount = Decimal::new(999_999, 3);
        assert_eq!(
            validate_payment(Decimal::from(1000), &[], amount).unwrap_err(),
            ValidationError::SubCentAmount(amount)
        );
        assert!(validate_payment(Decimal::from(1000), &[], Decimal::new(99_999, 2)).is_ok());
    }

    #[test]
    fn should_reject_fee_above_maximum() {
        assert!(matches!(
            validate_fee_change(Decimal::MAX, &[]).unwrap_err(),
            ValidationError::AmountTooLarge { .. }
        ));
        assert_eq!(
            validate_fee_change(Decimal::new(5001, 3), &[]).unwrap_err(),
            ValidationError::SubCentAmount(Decimal::new(5001, 3))
        );
    }

    #[test]
    fn should_saturate_ledger_totals_instead_of_overflowing() {
        let mut huge = appointment(1, 0, &[], AppointmentStatus::Scheduled);
        huge.total_fee = Decimal::MAX;
        let mut other = huge.clone();
        other.id = AppointmentId(2);
        let ledger = BillingLedger::from_appointments(&[huge, other]);
        assert_eq!(ledger.billed, Decimal::MAX);
        assert_eq!(ledger.outstanding, Decimal::MAX);
        assert_eq!(ledger.count(PaymentStatus::Unpaid), 2);
    }

    #[test]
    fn should_total_ledger_and_skip_unpaid_cancellations() {
        let appointments = vec![
            appointment(1, 1000, &[300, 700], AppointmentStatus::Completed),
            appointment(2, 500, &[200], AppointmentStatus::Completed),
            appointment(3, 800, &[], AppointmentStatus::Scheduled),
            appointment(4, 900, &[], AppointmentStatus::Cancelled),
        ];
        let ledger = BillingLedger::from_appointments(&appointments);
        assert_eq!(ledger.appointments, 3);
        assert_eq!(ledger.billed, Decimal::from(2300));
        assert_eq!(ledger.collected, Decimal::from(1200));
        assert_eq!(ledger.outstanding, Decimal::from(1100));
        assert_eq!(ledger.count(PaymentStatus::Paid), 1);
        assert_eq!(ledger.count(PaymentStatus::PartiallyPaid), 1);
        assert_eq!(ledger.count(PaymentStatus::Unpaid), 1);
    }
}
