use thiserror::Error;
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::{AcademicYear, ChequeOutcome, FeeType, StudentStatus, TransactionStatus};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    // transaction input
    #[error("missing required field: {field}")]
    MissingField {
        field: &'static str,
    },

    #[error("invalid academic year: {value} (expected YY-YY with consecutive years)")]
    InvalidAcademicYear {
        value: String,
    },

    #[error("invalid date: {value}")]
    InvalidDate {
        value: String,
    },

    #[error("invalid amount: {value}")]
    InvalidAmount {
        value: String,
    },

    #[error("payment mode not configured for school: {mode}")]
    UnknownPaymentMode {
        mode: String,
    },

    #[error("account not configured for school: {account}")]
    UnknownAccount {
        account: String,
    },

    #[error("invalid fee type: {value}")]
    InvalidFeeType {
        value: String,
    },

    // admission fee rules
    #[error("admission fee already paid for {academic_year}")]
    AdmissionFeeAlreadyPaid {
        academic_year: AcademicYear,
    },

    #[error("admission fee ceiling exceeded: ceiling {ceiling}, requested {requested}")]
    AdmissionFeeCeilingExceeded {
        ceiling: Money,
        requested: Money,
    },

    #[error("admission fee only applies to new students, student is {status:?}")]
    AdmissionFeeRequiresNewStudent {
        status: StudentStatus,
    },

    #[error("admission fee not applicable to student type {student_type}")]
    AdmissionFeeNotApplicable {
        student_type: String,
    },

    // year rules
    #[error("academic year {requested} not payable, current year is {current}")]
    AcademicYearNotPayable {
        requested: AcademicYear,
        current: AcademicYear,
    },

    #[error("{fee_type} cannot be paid against the previous academic year")]
    PreviousYearFeeTypeNotAllowed {
        fee_type: FeeType,
    },

    #[error("payment exceeds remaining due: remaining {remaining}, requested {requested}")]
    Overpayment {
        remaining: Money,
        requested: Money,
    },

    // status machine
    #[error("invalid status transition: transaction is {current:?}, requested {requested:?}")]
    InvalidStatusTransition {
        current: TransactionStatus,
        requested: ChequeOutcome,
    },

    // lookups
    #[error("transaction not found: {id}")]
    TransactionNotFound {
        id: Uuid,
    },

    #[error("student not found: {id}")]
    StudentNotFound {
        id: Uuid,
    },

    #[error("school not found: {code}")]
    SchoolNotFound {
        code: String,
    },

    // promotion
    #[error("no further class configured after {class}")]
    NoFurtherClass {
        class: String,
    },

    #[error("class not configured for school: {class}")]
    ClassNotConfigured {
        class: String,
    },

    #[error("{count} pending cheque(s) would not settle after promotion")]
    UnsettledChequesBlockPromotion {
        count: usize,
    },

    // fee edits
    #[error("invalid discount: discount {discount}, baseline {baseline}")]
    InvalidDiscount {
        discount: Money,
        baseline: Money,
    },

    #[error("invalid fee amount for {field}: {amount}")]
    InvalidFeeAmount {
        field: &'static str,
        amount: Money,
    },

    // persistence
    #[error("version conflict: expected {expected}, found {found}")]
    VersionConflict {
        expected: u64,
        found: u64,
    },

    #[error("storage error: {message}")]
    Storage {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Storage {
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
