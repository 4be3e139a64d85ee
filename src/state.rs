use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::{FeeType, StudentId};

/// school fee for the current year; `total` is always derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "TuitionFeesDocument")]
pub struct TuitionFees {
    #[serde(rename = "AdmissionFee")]
    admission_fee: Money,
    #[serde(rename = "tuitionFee")]
    tuition_fee: Money,
    total: Money,
}

/// stored shape; a stale `total` is recomputed on load
#[derive(Deserialize)]
struct TuitionFeesDocument {
    #[serde(rename = "AdmissionFee", default)]
    admission_fee: Money,
    #[serde(rename = "tuitionFee", default)]
    tuition_fee: Money,
}

impl From<TuitionFeesDocument> for TuitionFees {
    fn from(doc: TuitionFeesDocument) -> Self {
        TuitionFees::new(doc.admission_fee, doc.tuition_fee)
    }
}

impl TuitionFees {
    pub fn new(admission_fee: Money, tuition_fee: Money) -> Self {
        Self {
            admission_fee,
            tuition_fee,
            total: admission_fee + tuition_fee,
        }
    }

    pub fn admission_fee(&self) -> Money {
        self.admission_fee
    }

    pub fn tuition_fee(&self) -> Money {
        self.tuition_fee
    }

    pub fn total(&self) -> Money {
        self.total
    }
}

/// the `allFee` ledger stored on each student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct FeeLedgerState {
    // current year
    pub tuition_fees: TuitionFees,
    pub tuition_fees_discount: Money,
    pub bus_fee: Money,
    pub bus_fee_discount: Money,
    pub mess_fee: Money,
    pub hostel_fee: Money,

    // carried forward from the previous year, net of payments
    pub last_year_balance_fee: Money,
    pub last_year_discount: Money,
    pub last_year_bus_fee: Money,
    pub last_year_bus_fee_discount: Money,
}

impl FeeLedgerState {
    /// current-year fee and discount for a category
    ///
    /// Admission fee is tracked against the bundled tuition total, the same
    /// figure the tuition line uses.
    pub fn current_year_fee(&self, fee_type: FeeType) -> (Money, Money) {
        match fee_type {
            FeeType::AdmissionFee | FeeType::TuitionFee => {
                (self.tuition_fees.total(), self.tuition_fees_discount)
            }
            FeeType::BusFee => (self.bus_fee, self.bus_fee_discount),
            FeeType::MessFee => (self.mess_fee, Money::ZERO),
            FeeType::HostelFee => (self.hostel_fee, Money::ZERO),
        }
    }

    /// carried-forward balance and discount, if the category has one
    pub fn previous_year_balance(&self, fee_type: FeeType) -> Option<(Money, Money)> {
        match fee_type {
            FeeType::TuitionFee => Some((self.last_year_balance_fee, self.last_year_discount)),
            FeeType::BusFee => Some((self.last_year_bus_fee, self.last_year_bus_fee_discount)),
            _ => None,
        }
    }

    /// apply a completed previous-year payment; returns the amount absorbed
    pub fn settle_previous_year(&mut self, fee_type: FeeType, amount: Money) -> Money {
        let balance = match fee_type {
            FeeType::TuitionFee => &mut self.last_year_balance_fee,
            FeeType::BusFee => &mut self.last_year_bus_fee,
            _ => return Money::ZERO,
        };
        let applied = amount.min(*balance).max(Money::ZERO);
        *balance = balance.saturating_sub(amount);
        applied
    }

    pub fn set_tuition_fees(&mut self, admission_fee: Money, tuition_fee: Money) {
        self.tuition_fees = TuitionFees::new(admission_fee, tuition_fee);
    }
}

/// ledger snapshot for audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub snapshot_id: Uuid,
    pub student_id: StudentId,
    pub timestamp: DateTime<Utc>,
    pub state: FeeLedgerState,
    pub trigger: String,
}

impl LedgerSnapshot {
    pub fn capture(
        student_id: StudentId,
        state: &FeeLedgerState,
        trigger: String,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            snapshot_id: Uuid::new_v4(),
            student_id,
            timestamp,
            state: state.clone(),
            trigger,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_total_is_derived() {
        let fees = TuitionFees::new(Money::from_major(1000), Money::from_major(9000));
        assert_eq!(fees.total(), Money::from_major(10_000));
    }

    #[test]
    fn test_stale_total_recomputed_on_load() {
        let doc = json!({
            "tuitionFees": { "AdmissionFee": 1000, "tuitionFee": 9000, "total": 4 },
            "busFee": "2500"
        });
        let state: FeeLedgerState = serde_json::from_value(doc).unwrap();
        assert_eq!(state.tuition_fees.total(), Money::from_major(10_000));
        assert_eq!(state.bus_fee, Money::from_major(2500));
        assert_eq!(state.hostel_fee, Money::ZERO);
    }

    #[test]
    fn test_document_field_names() {
        let mut state = FeeLedgerState::default();
        state.set_tuition_fees(Money::from_major(500), Money::from_major(7000));
        state.last_year_bus_fee_discount = Money::from_major(100);

        let value = serde_json::to_value(&state).unwrap();
        assert!(value["tuitionFees"]["AdmissionFee"].is_string());
        assert!(value.get("tuitionFeesDiscount").is_some());
        assert!(value.get("lastYearBusFeeDiscount").is_some());

        let back: FeeLedgerState = serde_json::from_value(value).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_admission_due_uses_bundled_total() {
        let mut state = FeeLedgerState::default();
        state.set_tuition_fees(Money::from_major(1000), Money::from_major(9000));
        let (admission_due, _) = state.current_year_fee(FeeType::AdmissionFee);
        assert_eq!(admission_due, Money::from_major(10_000));
    }

    #[test]
    fn test_settle_previous_year() {
        let mut state = FeeLedgerState {
            last_year_balance_fee: Money::from_major(3000),
            last_year_bus_fee: Money::from_major(800),
            ..Default::default()
        };

        assert_eq!(
            state.settle_previous_year(FeeType::TuitionFee, Money::from_major(1000)),
            Money::from_major(1000)
        );
        assert_eq!(state.last_year_balance_fee, Money::from_major(2000));

        // never below zero
        assert_eq!(
            state.settle_previous_year(FeeType::BusFee, Money::from_major(1000)),
            Money::from_major(800)
        );
        assert_eq!(state.last_year_bus_fee, Money::ZERO);

        assert_eq!(
            state.settle_previous_year(FeeType::MessFee, Money::from_major(10)),
            Money::ZERO
        );
        assert!(state.previous_year_balance(FeeType::HostelFee).is_none());
    }
}
