use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::fee_structure::{FeeLookup, FeeStructureLookup};
use crate::ledger::previous_payments;
use crate::school::School;
use crate::state::FeeLedgerState;
use crate::student::Student;
use crate::types::{AcademicYear, FeeType, StudentId, StudentStatus};

/// unpaid amounts carried into the new year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Rollover {
    pub tuition: Money,
    pub mess: Money,
    pub hostel: Money,
    pub bus: Money,
}

impl Rollover {
    /// what lands in `lastYearBalanceFee`
    pub fn to_balance(&self) -> Money {
        self.tuition + self.mess + self.hostel
    }
}

/// the next ledger state for a student, computed without touching it
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionPlan {
    pub student_id: StudentId,
    pub from_year: AcademicYear,
    pub to_year: AcademicYear,
    pub from_class: String,
    pub to_class: String,
    pub old_status: StudentStatus,
    pub new_status: StudentStatus,
    pub rollover: Rollover,
    pub fee_lookup: FeeLookup,
    pub baseline_lookup: FeeLookup,
    pub next_state: FeeLedgerState,
}

impl PromotionPlan {
    /// work out the promotion of `student` within `school`
    pub fn prepare(
        student: &Student,
        school: &School,
        lookup: &FeeStructureLookup<'_>,
    ) -> Result<Self> {
        let from_year = student.academic_year;
        let to_year = from_year.next();

        // after the rollover only this year's tuition and bus cheques can still settle
        let unsettled = student
            .transactions
            .iter()
            .filter(|tx| tx.is_pending())
            .filter(|tx| tx.academic_year != from_year || !tx.fee_type.payable_for_previous_year())
            .count();
        if unsettled > 0 {
            return Err(LedgerError::UnsettledChequesBlockPromotion { count: unsettled });
        }

        let to_class = school.next_class(&student.class)?.to_string();

        let paid = |fee_type| previous_payments(&student.transactions, fee_type, from_year);
        let fees = &student.all_fee;
        let rollover = Rollover {
            tuition: fees.tuition_fees.total().saturating_sub(paid(FeeType::TuitionFee)),
            mess: fees.mess_fee.saturating_sub(paid(FeeType::MessFee)),
            hostel: fees.hostel_fee.saturating_sub(paid(FeeType::HostelFee)),
            bus: fees.bus_fee.saturating_sub(paid(FeeType::BusFee)),
        };

        let mut next_state = fees.clone();
        next_state.last_year_balance_fee += rollover.to_balance();
        next_state.last_year_bus_fee += rollover.bus;
        next_state.last_year_discount = fees.tuition_fees_discount;
        next_state.last_year_bus_fee_discount = fees.bus_fee_discount;
        next_state.mess_fee = Money::ZERO;
        next_state.hostel_fee = Money::ZERO;

        let new_status = student.status.after_promotion();

        let fee_lookup =
            lookup.fees_for(&to_class, to_year, &student.student_type, student.english_medium);
        let baseline_lookup = lookup.baseline_for(&to_class, to_year, student.english_medium);

        // admission is charged once, on entry
        let (schedule, baseline) = if new_status.charges_admission() {
            (fee_lookup.fees, baseline_lookup.fees)
        } else {
            (fee_lookup.fees.without_admission(), baseline_lookup.fees.without_admission())
        };

        next_state.set_tuition_fees(schedule.admission_fee, schedule.tuition_fee);
        next_state.tuition_fees_discount = baseline.total() - next_state.tuition_fees.total();

        Ok(Self {
            student_id: student.id,
            from_year,
            to_year,
            from_class: student.class.clone(),
            to_class,
            old_status: student.status,
            new_status,
            rollover,
            fee_lookup,
            baseline_lookup,
            next_state,
        })
    }

    /// write the plan onto the student
    pub fn apply(&self, student: &mut Student) {
        student.academic_year = self.to_year;
        student.class = self.to_class.clone();
        student.status = self.new_status;
        student.all_fee = self.next_state.clone();
    }
}

/// outcome of one promotion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionSummary {
    pub student_id: StudentId,
    pub from_year: AcademicYear,
    pub to_year: AcademicYear,
    pub from_class: String,
    pub to_class: String,
    pub new_status: StudentStatus,
    pub rollover: Rollover,
    pub version: u64,
}

/// progress report emitted after each student of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub processed: usize,
    pub total: usize,
    pub student_id: StudentId,
    pub succeeded: bool,
}

/// result of a batch promotion; failures do not stop the batch
#[derive(Debug, Default)]
pub struct BatchPromotionResult {
    pub processed: usize,
    pub promoted: Vec<PromotionSummary>,
    pub failures: Vec<(StudentId, LedgerError)>,
}

impl BatchPromotionResult {
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fee_structure::{FeeSchedule, FeeStructureDocument};
    use crate::ledger::{HistoricalSnapshot, Receipt, Transaction, ValidatedPayment};
    use crate::types::{StudentType, TransactionStatus, YearRelation};
    use chrono::{NaiveDate, Utc};

    fn year(s: &str) -> AcademicYear {
        AcademicYear::parse(s).unwrap()
    }

    fn school() -> School {
        School::new("SCH01", "Green Valley").with_classes(["1st", "2nd", "3rd"])
    }

    fn structures() -> FeeStructureDocument {
        let mut doc = FeeStructureDocument::new("SCH01");
        let ds = FeeSchedule::new(Money::from_major(1000), Money::from_major(11_000));
        let dss = FeeSchedule::new(Money::from_major(1000), Money::from_major(9000));
        doc.set_fee(year("25-26"), "3rd", "DS", None, ds)
            .set_fee(year("25-26"), "3rd", "DSS", None, dss);
        doc
    }

    fn paid(fee_type: FeeType, amount: i64) -> Transaction {
        let payment = ValidatedPayment {
            academic_year: year("24-25"),
            relation: YearRelation::Current,
            fee_type,
            amount: Money::from_major(amount),
            payment_mode: "Cash".to_string(),
            account: "Main".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            remark: String::new(),
            is_cheque: false,
            snapshot: HistoricalSnapshot::default(),
        };
        Transaction::from_payment(payment, Receipt::Issued(1), Utc::now())
    }

    fn student(student_type: &str) -> Student {
        let student_type = StudentType::new(student_type);
        let mut student = Student::new("Kiran", "SCH01", year("24-25"), "2nd", student_type, 3);
        student.all_fee.set_tuition_fees(Money::from_major(1000), Money::from_major(9000));
        student.all_fee.bus_fee = Money::from_major(3000);
        student.all_fee.bus_fee_discount = Money::from_major(600);
        student.all_fee.mess_fee = Money::from_major(1500);
        student.all_fee.hostel_fee = Money::from_major(2500);
        student.all_fee.last_year_balance_fee = Money::from_major(200);
        student
    }

    #[test]
    fn test_rollover_amounts() {
        let mut student = student("DSS");
        student.transactions.push(paid(FeeType::AdmissionFee, 1000));
        student.transactions.push(paid(FeeType::TuitionFee, 5000));
        student.transactions.push(paid(FeeType::BusFee, 1000));
        student.transactions.push(paid(FeeType::HostelFee, 2500));

        let doc = structures();
        let baseline = StudentType::new("DS");
        let lookup = FeeStructureLookup::new(Some(&doc), &baseline);
        let plan = PromotionPlan::prepare(&student, &school(), &lookup).unwrap();

        assert_eq!(plan.to_year, year("25-26"));
        assert_eq!(plan.to_class, "3rd");
        assert_eq!(plan.new_status, StudentStatus::Current);
        assert_eq!(plan.rollover.tuition, Money::from_major(4000));
        assert_eq!(plan.rollover.mess, Money::from_major(1500));
        assert_eq!(plan.rollover.hostel, Money::ZERO);
        assert_eq!(plan.rollover.bus, Money::from_major(2000));

        let state = &plan.next_state;
        // 200 older arrears + 4000 tuition + 1500 mess
        assert_eq!(state.last_year_balance_fee, Money::from_major(5700));
        assert_eq!(state.last_year_bus_fee, Money::from_major(2000));
        assert_eq!(state.last_year_bus_fee_discount, Money::from_major(600));
        assert_eq!(state.mess_fee, Money::ZERO);
        assert_eq!(state.hostel_fee, Money::ZERO);
        assert_eq!(state.bus_fee, Money::from_major(3000));
        assert_eq!(state.bus_fee_discount, Money::from_major(600));
    }

    #[test]
    fn test_new_fees_and_discount() {
        let student = student("DSS");
        let doc = structures();
        let baseline = StudentType::new("DS");
        let lookup = FeeStructureLookup::new(Some(&doc), &baseline);
        let plan = PromotionPlan::prepare(&student, &school(), &lookup).unwrap();

        let fees = plan.next_state.tuition_fees;
        assert_eq!(fees.admission_fee(), Money::ZERO);
        assert_eq!(fees.tuition_fee(), Money::from_major(9000));
        assert_eq!(fees.total(), fees.admission_fee() + fees.tuition_fee());
        assert_eq!(plan.next_state.tuition_fees_discount, Money::from_major(2000));
    }

    #[test]
    fn test_inactive_keeps_admission_fee() {
        let mut student = student("DS");
        student.status = StudentStatus::Inactive;
        let doc = structures();
        let baseline = StudentType::new("DS");
        let lookup = FeeStructureLookup::new(Some(&doc), &baseline);
        let plan = PromotionPlan::prepare(&student, &school(), &lookup).unwrap();

        assert_eq!(plan.new_status, StudentStatus::Inactive);
        assert_eq!(plan.next_state.tuition_fees.total(), Money::from_major(12_000));
        assert_eq!(plan.next_state.tuition_fees_discount, Money::ZERO);
    }

    #[test]
    fn test_last_class_is_terminal() {
        let mut student = student("DS");
        student.class = "3rd".to_string();
        let baseline = StudentType::new("DS");
        let lookup = FeeStructureLookup::new(None, &baseline);
        assert!(matches!(
            PromotionPlan::prepare(&student, &school(), &lookup),
            Err(LedgerError::NoFurtherClass { .. })
        ));
    }

    fn cheque(fee_type: FeeType, academic_year: &str, amount: i64) -> Transaction {
        let mut tx = paid(fee_type, amount);
        tx.academic_year = year(academic_year);
        tx.receipt_id = None;
        tx.temp_receipt_id = Some("3-4821".to_string());
        tx.status = TransactionStatus::Pending;
        tx
    }

    #[test]
    fn test_unsettled_cheques_block_promotion() {
        let doc = structures();
        let baseline = StudentType::new("DS");
        let lookup = FeeStructureLookup::new(Some(&doc), &baseline);

        // this year's tuition and bus cheques settle against the carried balance
        let mut student = student("DS");
        student.transactions.push(cheque(FeeType::TuitionFee, "24-25", 2000));
        student.transactions.push(cheque(FeeType::BusFee, "24-25", 500));
        let plan = PromotionPlan::prepare(&student, &school(), &lookup).unwrap();
        assert_eq!(plan.rollover.tuition, Money::from_major(10_000));

        // an arrears cheque would fall two years behind
        let mut arrears = student.clone();
        arrears.transactions.push(cheque(FeeType::TuitionFee, "23-24", 200));
        assert_eq!(
            PromotionPlan::prepare(&arrears, &school(), &lookup).unwrap_err(),
            LedgerError::UnsettledChequesBlockPromotion { count: 1 }
        );

        let mut boarding = student.clone();
        boarding.transactions.push(cheque(FeeType::MessFee, "24-25", 1500));
        boarding.transactions.push(cheque(FeeType::AdmissionFee, "24-25", 1000));
        assert_eq!(
            PromotionPlan::prepare(&boarding, &school(), &lookup).unwrap_err(),
            LedgerError::UnsettledChequesBlockPromotion { count: 2 }
        );

        // resolved cheques no longer block
        boarding.transactions.iter_mut().skip(2).for_each(|tx| tx.reject().unwrap());
        assert!(PromotionPlan::prepare(&boarding, &school(), &lookup).is_ok());
    }

    #[test]
    fn test_apply() {
        let mut student = student("DS");
        let doc = structures();
        let baseline = StudentType::new("DS");
        let lookup = FeeStructureLookup::new(Some(&doc), &baseline);
        let plan = PromotionPlan::prepare(&student, &school(), &lookup).unwrap();
        plan.apply(&mut student);

        assert_eq!(student.academic_year, year("25-26"));
        assert_eq!(student.class, "3rd");
        assert_eq!(student.status, StudentStatus::Current);
        assert_eq!(student.all_fee, plan.next_state);
    }
}
