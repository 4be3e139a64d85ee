use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::Result;
use crate::types::{AcademicYear, ChequeOutcome, FeeType, TransactionId, TransactionStatus};

use super::validation::ValidatedPayment;

/// point-in-time audit of the due a payment was applied against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalSnapshot {
    pub initial_fee: Money,
    pub discount: Money,
    pub previous_payments: Money,
    pub remaining_before: Money,
    pub remaining_after: Money,
}

/// how a new transaction is numbered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receipt {
    /// sequential number from a school counter
    Issued(u64),
    /// cheque placeholder until clearance
    Temporary(String),
}

impl Receipt {
    /// `{feeId}-{random4}`
    pub fn temporary_for(fee_id: u64) -> Self {
        let suffix: u16 = rand::thread_rng().gen_range(1000..=9999);
        Receipt::Temporary(format!("{}-{}", fee_id, suffix))
    }
}

/// one payment event; only `status` and `receipt_id` change after creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub academic_year: AcademicYear,
    pub fee_type: FeeType,
    pub amount: Money,
    pub payment_mode: String,
    pub account: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub remark: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_receipt_id: Option<String>,
    pub status: TransactionStatus,
    pub historical_snapshot: HistoricalSnapshot,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn from_payment(
        payment: ValidatedPayment,
        receipt: Receipt,
        created_at: DateTime<Utc>,
    ) -> Self {
        let (receipt_id, temp_receipt_id, status) = match receipt {
            Receipt::Issued(number) => (Some(number), None, TransactionStatus::Completed),
            Receipt::Temporary(temp) => (None, Some(temp), TransactionStatus::Pending),
        };

        Self {
            id: Uuid::new_v4(),
            academic_year: payment.academic_year,
            fee_type: payment.fee_type,
            amount: payment.amount,
            payment_mode: payment.payment_mode,
            account: payment.account,
            date: payment.date,
            remark: payment.remark,
            receipt_id,
            temp_receipt_id,
            status,
            historical_snapshot: payment.snapshot,
            created_at,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TransactionStatus::Completed
    }

    pub fn is_pending(&self) -> bool {
        self.status == TransactionStatus::Pending
    }

    /// does this completed payment count toward `fee_type` in `year`
    ///
    /// Admission payments also count toward the tuition due.
    pub fn counts_toward(&self, fee_type: FeeType, year: AcademicYear) -> bool {
        self.is_completed()
            && self.academic_year == year
            && (self.fee_type == fee_type
                || (fee_type == FeeType::TuitionFee && self.fee_type == FeeType::AdmissionFee))
    }

    /// cheque cleared: take the real receipt number
    pub fn clear(&mut self, receipt_id: u64) -> Result<()> {
        self.status = self.status.resolve(ChequeOutcome::Cleared)?;
        self.receipt_id = Some(receipt_id);
        Ok(())
    }

    /// cheque bounced
    pub fn reject(&mut self) -> Result<()> {
        self.status = self.status.resolve(ChequeOutcome::Bounced)?;
        Ok(())
    }
}
