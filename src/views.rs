/// serialization support for student ledgers
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::ledger::{DuesReport, Transaction};
use crate::state::FeeLedgerState;
use crate::student::Student;
use crate::types::{AcademicYear, StudentId, StudentStatus, StudentType, TransactionStatus};

/// serializable view of a student's fee position
#[derive(Debug, Serialize, Deserialize)]
pub struct StudentLedgerView {
    pub id: StudentId,
    pub name: String,
    pub school_code: String,
    pub fee_id: u64,
    pub academic_year: AcademicYear,
    pub class: String,
    pub division: String,
    pub status: StudentStatus,
    pub student_type: StudentType,
    pub ledger: FeeLedgerState,
    pub dues: DuesReport,
    pub collections: CollectionView,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CollectionView {
    pub completed_count: usize,
    pub pending_count: usize,
    pub rejected_count: usize,
    pub total_collected: Money,
    pub pending_cheques: Money,
    pub last_receipt_id: Option<u64>,
}

impl StudentLedgerView {
    pub fn from_student(student: &Student) -> Self {
        let total_for = |status: TransactionStatus| -> Money {
            student
                .transactions
                .iter()
                .filter(|tx| tx.status == status)
                .map(|tx| tx.amount)
                .sum()
        };

        StudentLedgerView {
            id: student.id,
            name: student.name.clone(),
            school_code: student.school_code.clone(),
            fee_id: student.fee_id,
            academic_year: student.academic_year,
            class: student.class.clone(),
            division: student.division.clone(),
            status: student.status,
            student_type: student.student_type.clone(),
            ledger: student.all_fee.clone(),
            dues: student.dues(),
            collections: CollectionView {
                completed_count: student.count_by_status(TransactionStatus::Completed),
                pending_count: student.count_by_status(TransactionStatus::Pending),
                rejected_count: student.count_by_status(TransactionStatus::Rejected),
                total_collected: total_for(TransactionStatus::Completed),
                pending_cheques: total_for(TransactionStatus::Pending),
                last_receipt_id: student.transactions.iter().filter_map(|tx| tx.receipt_id).max(),
            },
            transactions: student.transactions.clone(),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{HistoricalSnapshot, Receipt, ValidatedPayment};
    use crate::types::{FeeType, YearRelation};
    use chrono::{NaiveDate, Utc};

    fn payment(amount: i64, is_cheque: bool) -> ValidatedPayment {
        ValidatedPayment {
            academic_year: AcademicYear::parse("24-25").unwrap(),
            relation: YearRelation::Current,
            fee_type: FeeType::TuitionFee,
            amount: Money::from_major(amount),
            payment_mode: if is_cheque { "Cheque" } else { "Cash" }.to_string(),
            account: "Main".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 7, 10).unwrap(),
            remark: String::new(),
            is_cheque,
            snapshot: HistoricalSnapshot::default(),
        }
    }

    #[test]
    fn test_collection_summary() {
        let mut student = Student::new(
            "Farah",
            "SCH01",
            AcademicYear::parse("24-25").unwrap(),
            "2nd",
            StudentType::new("DS"),
            8,
        );
        student.all_fee.set_tuition_fees(Money::from_major(1000), Money::from_major(9000));
        let cash = Transaction::from_payment(payment(2000, false), Receipt::Issued(41), Utc::now());
        let temp = Receipt::Temporary("8-1234".into());
        let cheque = Transaction::from_payment(payment(1500, true), temp, Utc::now());
        student.post(cash);
        student.post(cheque);

        let view = StudentLedgerView::from_student(&student);
        assert_eq!(view.collections.completed_count, 1);
        assert_eq!(view.collections.pending_count, 1);
        assert_eq!(view.collections.total_collected, Money::from_major(2000));
        assert_eq!(view.collections.pending_cheques, Money::from_major(1500));
        assert_eq!(view.collections.last_receipt_id, Some(41));
        assert_eq!(view.dues.total_outstanding, Money::from_major(8000));

        let json = view.to_json_pretty().unwrap();
        assert!(json.contains("\"tempReceiptId\": \"8-1234\""));
        assert!(json.contains("\"lastYearBalanceFee\""));
    }
}
