use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::config::LedgerConfig;
use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::school::School;
use crate::student::Student;
use crate::types::{AcademicYear, FeeType, StudentStatus, YearRelation};

use super::dues::{DueCalculator, DueLine};
use super::transaction::{HistoricalSnapshot, Transaction};

/// raw payment form input, as entered by the operator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionRequest {
    pub academic_year: Option<String>,
    pub payment_mode: Option<String>,
    pub account: Option<String>,
    pub date: Option<String>,
    pub fee_type: Option<String>,
    pub amount: Option<String>,
    pub remark: Option<String>,
}

impl TransactionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn academic_year(mut self, year: impl Into<String>) -> Self {
        self.academic_year = Some(year.into());
        self
    }

    pub fn payment_mode(mut self, mode: impl Into<String>) -> Self {
        self.payment_mode = Some(mode.into());
        self
    }

    pub fn account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn fee_type(mut self, fee_type: FeeType) -> Self {
        self.fee_type = Some(fee_type.as_str().to_string());
        self
    }

    pub fn amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount.to_string());
        self
    }

    pub fn remark(mut self, remark: impl Into<String>) -> Self {
        self.remark = Some(remark.into());
        self
    }
}

/// a request that passed every rule, ready to be numbered and stored
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPayment {
    pub academic_year: AcademicYear,
    pub relation: YearRelation,
    pub fee_type: FeeType,
    pub amount: Money,
    pub payment_mode: String,
    pub account: String,
    pub date: NaiveDate,
    pub remark: String,
    pub is_cheque: bool,
    pub snapshot: HistoricalSnapshot,
}

/// checks a payment request against the student's ledger and school setup
pub struct TransactionValidator<'a> {
    config: &'a LedgerConfig,
}

impl<'a> TransactionValidator<'a> {
    pub fn new(config: &'a LedgerConfig) -> Self {
        Self { config }
    }

    /// apply the rules in order; the first failure wins
    pub fn validate(
        &self,
        request: &TransactionRequest,
        student: &Student,
        school: &School,
    ) -> Result<ValidatedPayment> {
        // required fields
        let year_raw = required(&request.academic_year, "academicYear")?;
        let payment_mode = required(&request.payment_mode, "paymentMode")?;
        let account = required(&request.account, "account")?;
        let date_raw = required(&request.date, "date")?;
        let fee_type_raw = required(&request.fee_type, "feeType")?;
        let amount_raw = required(&request.amount, "amount")?;

        let academic_year = AcademicYear::parse(year_raw)?;
        let date = self.parse_date(date_raw)?;
        let amount = parse_amount(amount_raw)?;

        if !school.has_payment_mode(payment_mode) {
            return Err(LedgerError::UnknownPaymentMode {
                mode: payment_mode.to_string(),
            });
        }
        if !school.has_account(account) {
            return Err(LedgerError::UnknownAccount {
                account: account.to_string(),
            });
        }

        let fee_type: FeeType = fee_type_raw.parse()?;

        if fee_type == FeeType::AdmissionFee {
            self.check_admission(student, academic_year, amount)?;
        }

        let relation = payable_relation(academic_year, fee_type, student)?;

        let line = due_within(student, fee_type, academic_year, amount)?;

        Ok(ValidatedPayment {
            academic_year,
            relation,
            fee_type,
            amount,
            payment_mode: payment_mode.to_string(),
            account: account.to_string(),
            date,
            remark: request.remark.as_deref().map(str::trim).unwrap_or_default().to_string(),
            is_cheque: self.config.is_cheque(payment_mode),
            snapshot: line.snapshot(amount),
        })
    }

    /// re-check a pending cheque against the ledger as it stands at clearance
    ///
    /// Payments completed after the cheque was taken count against it.
    pub fn validate_clearance(&self, transaction: &Transaction, student: &Student) -> Result<()> {
        let (fee_type, year) = (transaction.fee_type, transaction.academic_year);
        if fee_type == FeeType::AdmissionFee && admission_paid(student, year) {
            return Err(LedgerError::AdmissionFeeAlreadyPaid { academic_year: year });
        }

        payable_relation(year, fee_type, student)?;
        due_within(student, fee_type, year, transaction.amount)?;
        Ok(())
    }

    fn check_admission(&self, student: &Student, year: AcademicYear, amount: Money) -> Result<()> {
        if admission_paid(student, year) {
            return Err(LedgerError::AdmissionFeeAlreadyPaid { academic_year: year });
        }

        if amount > self.config.admission_fee_ceiling {
            return Err(LedgerError::AdmissionFeeCeilingExceeded {
                ceiling: self.config.admission_fee_ceiling,
                requested: amount,
            });
        }

        if student.status != StudentStatus::New {
            return Err(LedgerError::AdmissionFeeRequiresNewStudent {
                status: student.status,
            });
        }

        if self.config.is_admission_exempt(&student.student_type) {
            return Err(LedgerError::AdmissionFeeNotApplicable {
                student_type: student.student_type.to_string(),
            });
        }

        Ok(())
    }

    fn parse_date(&self, raw: &str) -> Result<NaiveDate> {
        self.config
            .date_formats
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
            .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
            .ok_or_else(|| LedgerError::InvalidDate {
                value: raw.to_string(),
            })
    }
}

fn admission_paid(student: &Student, year: AcademicYear) -> bool {
    student
        .transactions
        .iter()
        .any(|tx| {
            tx.fee_type == FeeType::AdmissionFee && tx.academic_year == year && tx.is_completed()
        })
}

/// current year, or the previous year for tuition and bus arrears
fn payable_relation(
    year: AcademicYear,
    fee_type: FeeType,
    student: &Student,
) -> Result<YearRelation> {
    match YearRelation::of(year, student.academic_year) {
        YearRelation::Other => Err(LedgerError::AcademicYearNotPayable {
            requested: year,
            current: student.academic_year,
        }),
        YearRelation::Previous if !fee_type.payable_for_previous_year() => {
            Err(LedgerError::PreviousYearFeeTypeNotAllowed { fee_type })
        }
        relation => Ok(relation),
    }
}

/// due line for the payment, rejecting amounts above what remains
fn due_within(
    student: &Student,
    fee_type: FeeType,
    year: AcademicYear,
    amount: Money,
) -> Result<DueLine> {
    let line = DueCalculator::new(&student.all_fee, &student.transactions, student.academic_year)
        .due_line(fee_type, year)
        .ok_or(LedgerError::PreviousYearFeeTypeNotAllowed { fee_type })?;

    if amount > line.remaining {
        return Err(LedgerError::Overpayment {
            remaining: line.remaining,
            requested: amount,
        });
    }
    Ok(line)
}

fn required<'r>(value: &'r Option<String>, field: &'static str) -> Result<&'r str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(LedgerError::MissingField { field })
}

fn parse_amount(raw: &str) -> Result<Money> {
    let amount = Money::from_str_exact(raw).map_err(|_| LedgerError::InvalidAmount {
        value: raw.to_string(),
    })?;
    if !amount.is_positive() {
        return Err(LedgerError::InvalidAmount {
            value: raw.to_string(),
        });
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::transaction::Receipt;
    use crate::student::Student;
    use crate::types::StudentType;

    fn school() -> School {
        School::new("SCH01", "Green Valley")
            .with_classes(["1st", "2nd", "3rd"])
            .with_payment_modes(["Cash", "UPI", "Cheque"])
            .with_accounts(["Main", "Transport"])
    }

    fn student() -> Student {
        let mut student = Student::new(
            "Asha",
            "SCH01",
            AcademicYear::parse("24-25").unwrap(),
            "2nd",
            StudentType::new("DS"),
            1,
        );
        student.all_fee.set_tuition_fees(Money::from_major(1000), Money::from_major(9000));
        student.all_fee.bus_fee = Money::from_major(2400);
        student.all_fee.last_year_balance_fee = Money::from_major(1500);
        student
    }

    fn request(fee_type: FeeType, amount: i64) -> TransactionRequest {
        TransactionRequest::new()
            .academic_year("24-25")
            .payment_mode("Cash")
            .account("Main")
            .date("2024-07-15")
            .fee_type(fee_type)
            .amount(Money::from_major(amount))
    }

    fn cheque(
        validator: &TransactionValidator,
        student: &Student,
        fee_type: FeeType,
        amount: i64,
    ) -> Transaction {
        let request = request(fee_type, amount).payment_mode("Cheque");
        let payment = validator.validate(&request, student, &school()).unwrap();
        Transaction::from_payment(payment, Receipt::temporary_for(1), chrono::Utc::now())
    }

    #[test]
    fn test_clearance_counts_later_payments() {
        let config = LedgerConfig::default();
        let validator = TransactionValidator::new(&config);
        let mut student = student();

        // both cheques fit the 10000 due when taken
        let first = cheque(&validator, &student, FeeType::TuitionFee, 6000);
        let second = cheque(&validator, &student, FeeType::TuitionFee, 6000);
        student.post(first.clone());
        student.post(second.clone());

        assert!(validator.validate_clearance(&first, &student).is_ok());
        student.clear_cheque(first.id, 101).unwrap();

        assert_eq!(
            validator.validate_clearance(&second, &student).unwrap_err(),
            LedgerError::Overpayment {
                remaining: Money::from_major(4000),
                requested: Money::from_major(6000),
            }
        );
    }

    #[test]
    fn test_clearance_rechecks_admission() {
        let config = LedgerConfig::default();
        let validator = TransactionValidator::new(&config);
        let mut student = student();

        let pending = cheque(&validator, &student, FeeType::AdmissionFee, 1000);
        student.post(pending.clone());

        // cash admission is still accepted while the cheque is pending
        let cash = validator
            .validate(&request(FeeType::AdmissionFee, 1000), &student, &school())
            .unwrap();
        student.post(Transaction::from_payment(cash, Receipt::Issued(102), chrono::Utc::now()));

        assert_eq!(
            validator.validate_clearance(&pending, &student).unwrap_err(),
            LedgerError::AdmissionFeeAlreadyPaid {
                academic_year: AcademicYear::parse("24-25").unwrap(),
            }
        );
    }

    #[test]
    fn test_valid_payment() {
        let config = LedgerConfig::default();
        let validator = TransactionValidator::new(&config);
        let request = request(FeeType::TuitionFee, 4000).remark("  first term ");
        let payment = validator.validate(&request, &student(), &school()).unwrap();

        assert_eq!(payment.relation, YearRelation::Current);
        assert!(!payment.is_cheque);
        assert_eq!(payment.remark, "first term");
        assert_eq!(payment.snapshot.remaining_before, Money::from_major(10_000));
        assert_eq!(payment.snapshot.remaining_after, Money::from_major(6000));
    }

    #[test]
    fn test_required_fields_in_order() {
        let config = LedgerConfig::default();
        let validator = TransactionValidator::new(&config);

        let err = validator
            .validate(&TransactionRequest::new(), &student(), &school())
            .unwrap_err();
        assert_eq!(err, LedgerError::MissingField { field: "academicYear" });

        let mut req = request(FeeType::TuitionFee, 100);
        req.account = Some("   ".to_string());
        req.amount = None;
        let err = validator.validate(&req, &student(), &school()).unwrap_err();
        assert_eq!(err, LedgerError::MissingField { field: "account" });
    }

    #[test]
    fn test_format_rules() {
        let config = LedgerConfig::default();
        let validator = TransactionValidator::new(&config);

        let req = request(FeeType::TuitionFee, 100).academic_year("24-26");
        assert!(matches!(
            validator.validate(&req, &student(), &school()),
            Err(LedgerError::InvalidAcademicYear { .. })
        ));

        let req = request(FeeType::TuitionFee, 100).date("2024-02-30");
        assert!(matches!(
            validator.validate(&req, &student(), &school()),
            Err(LedgerError::InvalidDate { .. })
        ));

        let mut req = request(FeeType::TuitionFee, 100);
        for bad in ["0", "-5", "abc", "NaN", "0.001"] {
            req.amount = Some(bad.to_string());
            assert!(matches!(
                validator.validate(&req, &student(), &school()),
                Err(LedgerError::InvalidAmount { .. })
            ));
        }
    }

    #[test]
    fn test_alternate_date_formats() {
        let config = LedgerConfig::default();
        let validator = TransactionValidator::new(&config);
        for date in ["15-07-2024", "15/07/2024", "2024-07-15T10:30:00+05:30"] {
            let payment = validator
                .validate(&request(FeeType::BusFee, 100).date(date), &student(), &school())
                .unwrap();
            assert_eq!(payment.date, NaiveDate::from_ymd_opt(2024, 7, 15).unwrap());
        }
    }

    #[test]
    fn test_school_configuration_rules() {
        let config = LedgerConfig::default();
        let validator = TransactionValidator::new(&config);

        let req = request(FeeType::TuitionFee, 100).payment_mode("Card");
        assert_eq!(
            validator.validate(&req, &student(), &school()).unwrap_err(),
            LedgerError::UnknownPaymentMode { mode: "Card".to_string() }
        );

        let req = request(FeeType::TuitionFee, 100).account("Petty");
        assert_eq!(
            validator.validate(&req, &student(), &school()).unwrap_err(),
            LedgerError::UnknownAccount { account: "Petty".to_string() }
        );

        let mut req = request(FeeType::TuitionFee, 100);
        req.fee_type = Some("LibraryFee".to_string());
        assert!(matches!(
            validator.validate(&req, &student(), &school()),
            Err(LedgerError::InvalidFeeType { .. })
        ));
    }

    #[test]
    fn test_admission_rules() {
        let config = LedgerConfig::default();
        let validator = TransactionValidator::new(&config);

        let req = request(FeeType::AdmissionFee, 1001);
        let err = validator.validate(&req, &student(), &school()).unwrap_err();
        assert!(matches!(err, LedgerError::AdmissionFeeCeilingExceeded { .. }));

        let mut current = student();
        current.status = StudentStatus::Current;
        let req = request(FeeType::AdmissionFee, 500);
        let err = validator.validate(&req, &current, &school()).unwrap_err();
        assert!(matches!(err, LedgerError::AdmissionFeeRequiresNewStudent { .. }));

        let mut dsr = student();
        dsr.student_type = StudentType::new("DSR");
        let err = validator.validate(&req, &dsr, &school()).unwrap_err();
        assert!(matches!(err, LedgerError::AdmissionFeeNotApplicable { .. }));

        let req = request(FeeType::AdmissionFee, 1000);
        assert!(validator.validate(&req, &student(), &school()).is_ok());
    }

    #[test]
    fn test_year_rules() {
        let config = LedgerConfig::default();
        let validator = TransactionValidator::new(&config);

        let req = request(FeeType::TuitionFee, 100).academic_year("22-23");
        assert!(matches!(
            validator.validate(&req, &student(), &school()),
            Err(LedgerError::AcademicYearNotPayable { .. })
        ));

        let req = request(FeeType::TuitionFee, 100).academic_year("25-26");
        assert!(matches!(
            validator.validate(&req, &student(), &school()),
            Err(LedgerError::AcademicYearNotPayable { .. })
        ));

        let req = request(FeeType::MessFee, 100).academic_year("23-24");
        assert_eq!(
            validator.validate(&req, &student(), &school()).unwrap_err(),
            LedgerError::PreviousYearFeeTypeNotAllowed { fee_type: FeeType::MessFee }
        );

        let req = request(FeeType::TuitionFee, 1500).academic_year("23-24");
        let payment = validator.validate(&req, &student(), &school()).unwrap();
        assert_eq!(payment.relation, YearRelation::Previous);
        assert_eq!(payment.snapshot.remaining_after, Money::ZERO);
    }

    #[test]
    fn test_overpayment_rejected() {
        let config = LedgerConfig::default();
        let validator = TransactionValidator::new(&config);

        let req = request(FeeType::BusFee, 2401);
        let err = validator.validate(&req, &student(), &school()).unwrap_err();
        assert_eq!(
            err,
            LedgerError::Overpayment {
                remaining: Money::from_major(2400),
                requested: Money::from_major(2401),
            }
        );

        let req = request(FeeType::TuitionFee, 1501).academic_year("23-24");
        assert!(matches!(
            validator.validate(&req, &student(), &school()),
            Err(LedgerError::Overpayment { .. })
        ));
    }

    #[test]
    fn test_cheque_mode_detected() {
        let config = LedgerConfig::default();
        let validator = TransactionValidator::new(&config);
        let req = request(FeeType::TuitionFee, 100).payment_mode("Cheque");
        let payment = validator.validate(&req, &student(), &school()).unwrap();
        assert!(payment.is_cheque);
    }
}
