// lib/src/queries.rs

//! Read-only lookups and reports over a [`ClinicState`].

use chrono::NaiveDate;
use serde::Serialize;

use models::{Appointment, AppointmentId, AppointmentStatus, Patient, PatientId, Prescription};

use crate::billing::{self, BillingLedger, Reconciliation};
use crate::store::ClinicState;
use crate::util::{compare_times, parse_date};

/// Case-insensitive substring match on name, phone or email. A blank term
/// matches everyone.
pub fn search_patients<'a>(state: &'a ClinicState, term: &str) -> Vec<&'a Patient> {
    let needle = term.trim().to_lowercase();
    state
        .patients()
        .iter()
        .filter(|p| {
            needle.is_empty()
                || p.name.to_lowercase().contains(&needle)
                || p.phone.to_lowercase().contains(&needle)
                || p.email.as_deref().is_some_and(|e| e.to_lowercase().contains(&needle))
        })
        .collect()
}

pub fn appointments_for_patient(state: &ClinicState, patient: PatientId) -> Vec<&Appointment> {
    state.appointments().iter().filter(|a| a.patient_id == patient).collect()
}

pub fn prescriptions_for_patient(state: &ClinicState, patient: PatientId) -> Vec<&Prescription> {
    state.prescriptions().iter().filter(|rx| rx.patient_id == patient).collect()
}

pub fn prescriptions_for_appointment(state: &ClinicState, appointment: AppointmentId) -> Vec<&Prescription> {
    state.prescriptions().iter().filter(|rx| rx.appointment_id == appointment).collect()
}

/// Appointments falling on `date`, ordered by time of day.
pub fn appointments_on(state: &ClinicState, date: NaiveDate) -> Vec<&Appointment> {
    let mut found: Vec<&Appointment> =
        state.appointments().iter().filter(|a| parse_date(&a.date) == Some(date)).collect();
    found.sort_by(|a, b| compare_times(&a.time, &b.time).then(a.id.cmp(&b.id)));
    found
}

/// Billing totals for one patient's appointments.
pub fn patient_ledger(state: &ClinicState, patient: PatientId) -> BillingLedger {
    BillingLedger::from_appointments(appointments_for_patient(state, patient))
}

/// One row of the outstanding-balance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutstandingBalance {
    pub appointment_id: AppointmentId,
    pub patient_id: PatientId,
    pub patient_name: String,
    pub date: String,
    pub billing: Reconciliation,
}

/// Appointments that still owe money, largest balance first. Cancelled visits
/// are left out.
pub fn outstanding_balances(state: &ClinicState) -> Vec<OutstandingBalance> {
    let mut rows: Vec<OutstandingBalance> = state
        .appointments()
        .iter()
        .filter(|a| a.status != AppointmentStatus::Cancelled)
        .filter_map(|a| {
            let billing = billing::reconcile_appointment(a);
            if billing.balance.is_zero() {
                return None;
            }
            let patient_name = state.patient(a.patient_id).map(|p| p.name.clone()).unwrap_or_default();
            Some(OutstandingBalance {
                appointment_id: a.id,
                patient_id: a.patient_id,
                patient_name,
                date: a.date.clone(),
                billing,
            })
        })
        .collect();
    rows.sort_by(|a, b| b.billing.balance.cmp(&a.billing.balance).then(a.appointment_id.cmp(&b.appointment_id)));
    rows
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub today: NaiveDate,
    pub patients: usize,
    pub appointments: usize,
    pub prescriptions: usize,
    pub todays_appointments: usize,
    /// Scheduled appointments from `today` onwards, soonest first.
    pub upcoming: Vec<AppointmentId>,
    pub billing: BillingLedger,
    pub outstanding: Vec<OutstandingBalance>,
}

impl DashboardSummary {
    pub fn compute(state: &ClinicState, today: NaiveDate) -> Self {
        let mut upcoming: Vec<(NaiveDate, &Appointment)> = state
            .appointments()
            .iter()
            .filter(|a| a.status == AppointmentStatus::Scheduled)
            .filter_map(|a| parse_date(&a.date).filter(|d| *d >= today).map(|d| (d, a)))
            .collect();
        upcoming.sort_by(|(da, a), (db, b)| da.cmp(db).then_with(|| compare_times(&a.time, &b.time)));

        DashboardSummary {
            today,
            patients: state.patients().len(),
            appointments: state.appointments().len(),
            prescriptions: state.prescriptions().len(),
            todays_appointments: appointments_on(state, today).len(),
            upcoming: upcoming.into_iter().map(|(_, a)| a.id).collect(),
            billing: BillingLedger::from_appointments(state.appointments()),
            outstanding: outstanding_balances(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{appointment, patient, payment, prescription};
    use models::PaymentStatus;
    use rust_decimal::Decimal;

    fn state() -> ClinicState {
        let mut first = patient(1);
        first.name = "Asha Menon".to_string();
        first.email = Some("asha@example.org".to_string());
        let mut second = patient(2);
        second.name = "Rahul Verma".to_string();

        let mut morning = appointment(10, 1, 1000);
        morning.date = "2024-06-03".to_string();
        morning.time = "09:15".to_string();
        morning.payments.push(payment(400));
        let mut afternoon = appointment(11, 2, 500);
        afternoon.date = "2024-06-03".to_string();
        afternoon.time = "14:00".to_string();
        let mut later = appointment(12, 2, 800);
        later.date = "2024-06-10".to_string();
        later.payments.push(payment(800));
        let mut past = appointment(13, 1, 300);
        past.date = "2024-05-20".to_string();
        past.status = AppointmentStatus::Completed;
        let mut cancelled = appointment(14, 1, 900);
        cancelled.date = "2024-06-12".to_string();
        cancelled.status = AppointmentStatus::Cancelled;

        ClinicState::from_records(
            vec![first, second],
            vec![afternoon, later, morning, past, cancelled],
            vec![prescription(20, 1, 10), prescription(21, 2, 12)],
        )
    }

    #[test]
    fn should_search_name_phone_and_email() {
        let state = state();
        let names = |term: &str| -> Vec<String> {
            search_patients(&state, term).iter().map(|p| p.name.clone()).collect()
        };
        assert_eq!(names("asha"), vec!["Asha Menon"]);
        assert_eq!(names("EXAMPLE.ORG"), vec!["Asha Menon"]);
        assert_eq!(names("555-0102"), vec!["Rahul Verma"]);
        assert_eq!(names("  ").len(), 2);
        assert!(names("nobody").is_empty());
    }

    #[test]
    fn should_filter_by_owner() {
        let state = state();
        assert_eq!(appointments_for_patient(&state, PatientId(1)).len(), 3);
        assert_eq!(prescriptions_for_patient(&state, PatientId(2)).len(), 1);
        assert_eq!(prescriptions_for_appointment(&state, AppointmentId(10))[0].id.value(), 20);
        assert!(prescriptions_for_appointment(&state, AppointmentId(11)).is_empty());
    }

    #[test]
    fn should_order_a_day_by_time() {
        let state = state();
        let day = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let ids: Vec<u64> = appointments_on(&state, day).iter().map(|a| a.id.value()).collect();
        assert_eq!(ids, vec![10, 11]);
    }

    #[test]
    fn should_put_single_digit_hours_before_later_ones() {
        let mut state = state();
        state.appointments.iter_mut().for_each(|a| {
            if a.id == AppointmentId(11) {
                a.time = "10:00".to_string();
            }
            if a.id == AppointmentId(10) {
                a.time = "9:15".to_string();
            }
        });
        let day = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let ids: Vec<u64> = appointments_on(&state, day).iter().map(|a| a.id.value()).collect();
        assert_eq!(ids, vec![10, 11]);
        let summary = DashboardSummary::compute(&state, day);
        assert_eq!(summary.upcoming[..2], [AppointmentId(10), AppointmentId(11)]);
    }

    #[test]
    fn should_total_a_patient_ledger() {
        let ledger = patient_ledger(&state(), PatientId(1));
        // the unpaid cancellation is not billed
        assert_eq!(ledger.appointments, 2);
        assert_eq!(ledger.billed, Decimal::from(1300));
        assert_eq!(ledger.collected, Decimal::from(400));
        assert_eq!(ledger.outstanding, Decimal::from(900));
        assert_eq!(ledger.count(PaymentStatus::PartiallyPaid), 1);
    }

    #[test]
    fn should_summarise_dashboard() {
        let state = state();
        let summary = DashboardSummary::compute(&state, NaiveDate::from_ymd_opt(2024, 6, 3).unwrap());
        assert_eq!(summary.patients, 2);
        assert_eq!(summary.appointments, 5);
        assert_eq!(summary.prescriptions, 2);
        assert_eq!(summary.todays_appointments, 2);
        let upcoming: Vec<u64> = summary.upcoming.iter().map(|id| id.value()).collect();
        assert_eq!(upcoming, vec![10, 11, 12]);

        let outstanding: Vec<(u64, Decimal)> =
            summary.outstanding.iter().map(|o| (o.appointment_id.value(), o.billing.balance)).collect();
        assert_eq!(
            outstanding,
            vec![(10, Decimal::from(600)), (11, Decimal::from(500)), (13, Decimal::from(300))]
        );
        assert_eq!(summary.outstanding[0].patient_name, "Asha Menon");
        assert_eq!(summary.billing.outstanding, Decimal::from(1400));
    }
}
