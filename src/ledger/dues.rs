use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::state::FeeLedgerState;
use crate::types::{AcademicYear, FeeType, YearRelation};

use super::transaction::{HistoricalSnapshot, Transaction};

/// sum of completed payments toward `fee_type` in `year`
pub fn previous_payments(
    transactions: &[Transaction],
    fee_type: FeeType,
    year: AcademicYear,
) -> Money {
    transactions
        .iter()
        .filter(|tx| tx.counts_toward(fee_type, year))
        .map(|tx| tx.amount)
        .sum()
}

/// due position of one fee category in one academic year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DueLine {
    pub fee_type: FeeType,
    pub academic_year: AcademicYear,
    pub relation: YearRelation,
    pub initial_fee: Money,
    pub discount: Money,
    pub previous_payments: Money,
    pub remaining: Money,
}

impl DueLine {
    /// audit record for a payment of `amount` against this line
    pub fn snapshot(&self, amount: Money) -> HistoricalSnapshot {
        HistoricalSnapshot {
            initial_fee: self.initial_fee,
            discount: self.discount,
            previous_payments: self.previous_payments,
            remaining_before: self.remaining,
            remaining_after: self.remaining.saturating_sub(amount),
        }
    }
}

/// computes dues from a ledger and its transaction history
pub struct DueCalculator<'a> {
    state: &'a FeeLedgerState,
    transactions: &'a [Transaction],
    current_year: AcademicYear,
}

impl<'a> DueCalculator<'a> {
    pub fn new(
        state: &'a FeeLedgerState,
        transactions: &'a [Transaction],
        current_year: AcademicYear,
    ) -> Self {
        Self {
            state,
            transactions,
            current_year,
        }
    }

    /// due line for a category and year; `None` when nothing is payable
    pub fn due_line(&self, fee_type: FeeType, year: AcademicYear) -> Option<DueLine> {
        let relation = YearRelation::of(year, self.current_year);
        let payments = previous_payments(self.transactions, fee_type, year);

        let (initial_fee, discount) = match relation {
            YearRelation::Current => self.state.current_year_fee(fee_type),
            YearRelation::Previous => {
                // stored balance is already net of previous-year payments
                let (balance, discount) = self.state.previous_year_balance(fee_type)?;
                (balance + payments, discount)
            }
            YearRelation::Other => return None,
        };

        Some(DueLine {
            fee_type,
            academic_year: year,
            relation,
            initial_fee,
            discount,
            previous_payments: payments,
            remaining: initial_fee.saturating_sub(payments),
        })
    }

    /// full dues report for both payable years
    pub fn report(&self) -> DuesReport {
        let previous_year = self.current_year.previous();

        let current_types = [
            FeeType::TuitionFee,
            FeeType::BusFee,
            FeeType::MessFee,
            FeeType::HostelFee,
        ];
        let current: Vec<DueLine> = current_types
            .into_iter()
            .filter_map(|fee_type| self.due_line(fee_type, self.current_year))
            .collect();

        let previous: Vec<DueLine> = [FeeType::TuitionFee, FeeType::BusFee]
            .into_iter()
            .filter_map(|fee_type| self.due_line(fee_type, previous_year))
            .collect();

        let total_outstanding = current
            .iter()
            .chain(previous.iter())
            .map(|line| line.remaining)
            .sum();

        DuesReport {
            academic_year: self.current_year,
            current,
            previous,
            total_outstanding,
        }
    }
}

/// dues for the current and previous academic years
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuesReport {
    pub academic_year: AcademicYear,
    pub current: Vec<DueLine>,
    pub previous: Vec<DueLine>,
    pub total_outstanding: Money,
}

impl DuesReport {
    pub fn line(&self, fee_type: FeeType, relation: YearRelation) -> Option<&DueLine> {
        let lines = match relation {
            YearRelation::Current => &self.current,
            YearRelation::Previous => &self.previous,
            YearRelation::Other => return None,
        };
        lines.iter().find(|line| line.fee_type == fee_type)
    }
}
