use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::ledger::{DueCalculator, DuesReport, Transaction};
use crate::state::FeeLedgerState;
use crate::types::{
    AcademicYear, FeeType, StudentId, StudentStatus, StudentType, TransactionId, TransactionStatus,
    YearRelation,
};

/// one enrolled student with its fee ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub school_code: String,
    pub academic_year: AcademicYear,
    pub class: String,
    #[serde(default)]
    pub division: String,
    #[serde(default)]
    pub status: StudentStatus,
    #[serde(rename = "type")]
    pub student_type: StudentType,
    pub fee_id: u64,
    #[serde(default = "default_english_medium")]
    pub english_medium: bool,
    #[serde(default)]
    pub all_fee: FeeLedgerState,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

fn default_english_medium() -> bool {
    true
}

impl Student {
    pub fn new(
        name: impl Into<String>,
        school_code: impl Into<String>,
        academic_year: AcademicYear,
        class: impl Into<String>,
        student_type: StudentType,
        fee_id: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            school_code: school_code.into(),
            academic_year,
            class: class.into(),
            division: String::new(),
            status: StudentStatus::New,
            student_type,
            fee_id,
            english_medium: true,
            all_fee: FeeLedgerState::default(),
            transactions: Vec::new(),
        }
    }

    pub fn dues(&self) -> DuesReport {
        DueCalculator::new(&self.all_fee, &self.transactions, self.academic_year).report()
    }

    pub fn transaction(&self, id: TransactionId) -> Result<&Transaction> {
        self.transactions
            .iter()
            .find(|tx| tx.id == id)
            .ok_or(LedgerError::TransactionNotFound { id })
    }

    fn transaction_mut(&mut self, id: TransactionId) -> Result<&mut Transaction> {
        self.transactions
            .iter_mut()
            .find(|tx| tx.id == id)
            .ok_or(LedgerError::TransactionNotFound { id })
    }

    /// append a transaction; completed previous-year payments reduce the carried balance
    pub fn post(&mut self, transaction: Transaction) -> &Transaction {
        let relation = YearRelation::of(transaction.academic_year, self.academic_year);
        if transaction.is_completed() && relation == YearRelation::Previous {
            self.all_fee.settle_previous_year(transaction.fee_type, transaction.amount);
        }
        self.transactions.push(transaction);
        // just pushed
        &self.transactions[self.transactions.len() - 1]
    }

    /// clear a pending cheque; returns the amount taken off a carried balance
    pub fn clear_cheque(&mut self, id: TransactionId, receipt_id: u64) -> Result<Money> {
        let current_year = self.academic_year;
        let tx = self.transaction_mut(id)?;
        tx.clear(receipt_id)?;

        let (fee_type, amount, year) = (tx.fee_type, tx.amount, tx.academic_year);
        if YearRelation::of(year, current_year) == YearRelation::Previous {
            Ok(self.all_fee.settle_previous_year(fee_type, amount))
        } else {
            Ok(Money::ZERO)
        }
    }

    pub fn reject_cheque(&mut self, id: TransactionId) -> Result<()> {
        self.transaction_mut(id)?.reject()
    }

    /// drop a transaction; the stored ledger is left as is
    pub fn remove_transaction(&mut self, id: TransactionId) -> Result<Transaction> {
        let position = self
            .transactions
            .iter()
            .position(|tx| tx.id == id)
            .ok_or(LedgerError::TransactionNotFound { id })?;
        Ok(self.transactions.remove(position))
    }

    pub fn count_by_status(&self, status: TransactionStatus) -> usize {
        self.transactions.iter().filter(|tx| tx.status == status).count()
    }
}
