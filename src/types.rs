use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::{LedgerError, Result};

/// unique identifier for a student record
pub type StudentId = Uuid;

/// unique identifier for a transaction within a student record
pub type TransactionId = Uuid;

/// academic year written as `YY-YY`, e.g. `24-25`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AcademicYear {
    start: u8,
}

impl AcademicYear {
    /// parse `YY-YY`; the second half must follow the first (99-00 wraps)
    pub fn parse(value: &str) -> Result<Self> {
        let invalid = || LedgerError::InvalidAcademicYear {
            value: value.to_string(),
        };

        let (first, second) = value.trim().split_once('-').ok_or_else(invalid)?;
        if first.len() != 2 || second.len() != 2 {
            return Err(invalid());
        }
        if !first.bytes().chain(second.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let start: u8 = first.parse().map_err(|_| invalid())?;
        let end: u8 = second.parse().map_err(|_| invalid())?;
        if (start + 1) % 100 != end {
            return Err(invalid());
        }

        Ok(Self { start })
    }

    /// two-digit starting year
    pub fn start(&self) -> u8 {
        self.start
    }

    /// two-digit ending year
    pub fn end(&self) -> u8 {
        (self.start + 1) % 100
    }

    /// both halves incremented
    pub fn next(&self) -> Self {
        Self {
            start: (self.start + 1) % 100,
        }
    }

    /// both halves decremented
    pub fn previous(&self) -> Self {
        Self {
            start: (self.start + 99) % 100,
        }
    }
}

impl fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.start, self.end())
    }
}

impl FromStr for AcademicYear {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        AcademicYear::parse(s)
    }
}

impl TryFrom<String> for AcademicYear {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self> {
        AcademicYear::parse(&value)
    }
}

impl From<AcademicYear> for String {
    fn from(year: AcademicYear) -> String {
        year.to_string()
    }
}

/// how a transaction's year relates to the student's current year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YearRelation {
    Current,
    Previous,
    Other,
}

impl YearRelation {
    pub fn of(year: AcademicYear, current: AcademicYear) -> Self {
        if year == current {
            YearRelation::Current
        } else if year == current.previous() {
            YearRelation::Previous
        } else {
            YearRelation::Other
        }
    }
}

/// enrollment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    /// admitted this academic year, admission fee applies
    #[default]
    New,
    /// promoted at least once
    Current,
    Inactive,
}

impl StudentStatus {
    /// status after a promotion; `new` becomes `current` and never returns
    pub fn after_promotion(self) -> Self {
        match self {
            StudentStatus::New => StudentStatus::Current,
            other => other,
        }
    }

    /// whether the year's fee still includes the one-time admission fee
    pub fn charges_admission(&self) -> bool {
        *self != StudentStatus::Current
    }
}

/// student type code (DS, DSR, DSS, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StudentType(String);

impl StudentType {
    pub fn new(code: impl Into<String>) -> Self {
        StudentType(code.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// case-insensitive comparison against a code
    pub fn is(&self, code: &str) -> bool {
        self.0.eq_ignore_ascii_case(code.trim())
    }
}

impl fmt::Display for StudentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StudentType {
    fn from(code: &str) -> Self {
        StudentType::new(code)
    }
}

/// fee category a transaction pays toward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeType {
    AdmissionFee,
    TuitionFee,
    BusFee,
    MessFee,
    HostelFee,
}

impl FeeType {
    pub const ALL: [FeeType; 5] = [
        FeeType::AdmissionFee,
        FeeType::TuitionFee,
        FeeType::BusFee,
        FeeType::MessFee,
        FeeType::HostelFee,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeeType::AdmissionFee => "AdmissionFee",
            FeeType::TuitionFee => "TuitionFee",
            FeeType::BusFee => "BusFee",
            FeeType::MessFee => "MessFee",
            FeeType::HostelFee => "HostelFee",
        }
    }

    /// only tuition and bus arrears can be paid against the previous year
    pub fn payable_for_previous_year(&self) -> bool {
        matches!(self, FeeType::TuitionFee | FeeType::BusFee)
    }

    /// counter that numbers receipts for this category
    pub fn receipt_counter(&self) -> ReceiptCounter {
        match self {
            FeeType::BusFee => ReceiptCounter::Bus,
            _ => ReceiptCounter::Tuition,
        }
    }
}

impl fmt::Display for FeeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeeType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        FeeType::ALL
            .into_iter()
            .find(|fee_type| fee_type.as_str() == s.trim())
            .ok_or_else(|| LedgerError::InvalidFeeType {
                value: s.to_string(),
            })
    }
}

/// outcome of presenting a cheque to the bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChequeOutcome {
    Cleared,
    Bounced,
}

/// transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// cheque received, not yet cleared
    Pending,
    /// payment counted toward dues
    Completed,
    /// cheque bounced
    Rejected,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }

    /// pending -> completed | rejected; terminal states refuse
    pub fn resolve(self, outcome: ChequeOutcome) -> Result<Self> {
        match self {
            TransactionStatus::Pending => Ok(match outcome {
                ChequeOutcome::Cleared => TransactionStatus::Completed,
                ChequeOutcome::Bounced => TransactionStatus::Rejected,
            }),
            terminal => Err(LedgerError::InvalidStatusTransition {
                current: terminal,
                requested: outcome,
            }),
        }
    }
}

/// per-school monotonic counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceiptCounter {
    Tuition,
    Bus,
    Stock,
    FeeId,
}

impl ReceiptCounter {
    /// field name on the stored school document
    pub fn field_name(&self) -> &'static str {
        match self {
            ReceiptCounter::Tuition => "tuitionReceiptCount",
            ReceiptCounter::Bus => "busReceiptCount",
            ReceiptCounter::Stock => "stockReceiptCount",
            ReceiptCounter::FeeId => "feeIdCount",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_academic_year_parse() {
        let year = AcademicYear::parse("24-25").unwrap();
        assert_eq!(year.start(), 24);
        assert_eq!(year.end(), 25);
        assert_eq!(year.to_string(), "24-25");

        assert!(AcademicYear::parse("24-26").is_err());
        assert!(AcademicYear::parse("2024-25").is_err());
        assert!(AcademicYear::parse("24/25").is_err());
        assert!(AcademicYear::parse("+4-25").is_err());
        assert!(AcademicYear::parse("").is_err());
    }

    #[test]
    fn test_academic_year_century_wrap() {
        let year = AcademicYear::parse("99-00").unwrap();
        assert_eq!(year.next().to_string(), "00-01");
        assert_eq!(AcademicYear::parse("00-01").unwrap().previous(), year);
    }

    #[test]
    fn test_academic_year_serde() {
        let year: AcademicYear = serde_json::from_str("\"25-26\"").unwrap();
        assert_eq!(year, AcademicYear::parse("25-26").unwrap());
        assert_eq!(serde_json::to_string(&year).unwrap(), "\"25-26\"");
        assert!(serde_json::from_str::<AcademicYear>("\"25-27\"").is_err());
    }

    #[test]
    fn test_year_relation() {
        let current = AcademicYear::parse("25-26").unwrap();
        assert_eq!(YearRelation::of(current, current), YearRelation::Current);
        assert_eq!(
            YearRelation::of(AcademicYear::parse("24-25").unwrap(), current),
            YearRelation::Previous
        );
        assert_eq!(
            YearRelation::of(AcademicYear::parse("23-24").unwrap(), current),
            YearRelation::Other
        );
        assert_eq!(
            YearRelation::of(current.next(), current),
            YearRelation::Other
        );
    }

    #[test]
    fn test_status_machine() {
        let pending = TransactionStatus::Pending;
        assert_eq!(pending.resolve(ChequeOutcome::Cleared).unwrap(), TransactionStatus::Completed);
        assert_eq!(pending.resolve(ChequeOutcome::Bounced).unwrap(), TransactionStatus::Rejected);

        assert!(!pending.is_terminal());
        assert!(TransactionStatus::Completed.is_terminal());
        assert!(TransactionStatus::Completed.resolve(ChequeOutcome::Bounced).is_err());
        assert!(TransactionStatus::Rejected.resolve(ChequeOutcome::Cleared).is_err());
    }

    #[test]
    fn test_fee_type_parse() {
        assert_eq!("BusFee".parse::<FeeType>().unwrap(), FeeType::BusFee);
        assert!("LibraryFee".parse::<FeeType>().is_err());
        assert_eq!(FeeType::BusFee.receipt_counter(), ReceiptCounter::Bus);
        assert_eq!(FeeType::MessFee.receipt_counter(), ReceiptCounter::Tuition);
    }

    #[test]
    fn test_student_status_promotion() {
        assert_eq!(StudentStatus::New.after_promotion(), StudentStatus::Current);
        assert_eq!(StudentStatus::Current.after_promotion(), StudentStatus::Current);
        assert_eq!(StudentStatus::Inactive.after_promotion(), StudentStatus::Inactive);

        assert!(StudentStatus::New.charges_admission());
        assert!(!StudentStatus::Current.charges_admission());
    }
}
