use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::fee_structure::{FeeLookup, FeeStructureLookup};
use crate::school::School;
use crate::student::Student;
use crate::types::{AcademicYear, StudentType};

/// add-student form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub name: String,
    pub academic_year: AcademicYear,
    pub class: String,
    #[serde(default)]
    pub division: String,
    pub student_type: StudentType,
    #[serde(default = "default_english_medium")]
    pub english_medium: bool,
    /// undiscounted bus fee
    #[serde(default)]
    pub bus_fee: Money,
    #[serde(default)]
    pub bus_fee_discount: Money,
    #[serde(default)]
    pub mess_fee: Money,
    #[serde(default)]
    pub hostel_fee: Money,
    /// arrears brought in from before the student was on this ledger
    #[serde(default)]
    pub last_year_balance_fee: Money,
    #[serde(default)]
    pub last_year_bus_fee: Money,
}

fn default_english_medium() -> bool {
    true
}

impl Enrollment {
    pub fn new(
        name: impl Into<String>,
        academic_year: AcademicYear,
        class: impl Into<String>,
        student_type: impl Into<StudentType>,
    ) -> Self {
        Self {
            name: name.into(),
            academic_year,
            class: class.into(),
            division: String::new(),
            student_type: student_type.into(),
            english_medium: true,
            bus_fee: Money::ZERO,
            bus_fee_discount: Money::ZERO,
            mess_fee: Money::ZERO,
            hostel_fee: Money::ZERO,
            last_year_balance_fee: Money::ZERO,
            last_year_bus_fee: Money::ZERO,
        }
    }

    pub fn division(mut self, division: impl Into<String>) -> Self {
        self.division = division.into();
        self
    }

    pub fn regional_medium(mut self) -> Self {
        self.english_medium = false;
        self
    }

    pub fn bus(mut self, base: Money, discount: Money) -> Self {
        self.bus_fee = base;
        self.bus_fee_discount = discount;
        self
    }

    pub fn boarding(mut self, mess_fee: Money, hostel_fee: Money) -> Self {
        self.mess_fee = mess_fee;
        self.hostel_fee = hostel_fee;
        self
    }

    pub fn arrears(mut self, balance: Money, bus: Money) -> Self {
        self.last_year_balance_fee = balance;
        self.last_year_bus_fee = bus;
        self
    }

    /// check the form before a fee id is drawn
    pub fn validate(&self, school: &School) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::MissingField { field: "name" });
        }
        if !school.has_class(self.class.trim()) {
            return Err(LedgerError::ClassNotConfigured {
                class: self.class.clone(),
            });
        }

        for (field, amount) in [
            ("busFee", self.bus_fee),
            ("busFeeDiscount", self.bus_fee_discount),
            ("messFee", self.mess_fee),
            ("hostelFee", self.hostel_fee),
            ("lastYearBalanceFee", self.last_year_balance_fee),
            ("lastYearBusFee", self.last_year_bus_fee),
        ] {
            if amount.is_negative() {
                return Err(LedgerError::InvalidFeeAmount { field, amount });
            }
        }

        if self.bus_fee_discount > self.bus_fee {
            return Err(LedgerError::InvalidDiscount {
                discount: self.bus_fee_discount,
                baseline: self.bus_fee,
            });
        }
        Ok(())
    }

    /// build the new student record; returns the fee lookup used so callers can report fallbacks
    pub fn into_student(
        self,
        school_code: &str,
        fee_id: u64,
        lookup: &FeeStructureLookup<'_>,
    ) -> (Student, FeeLookup) {
        let fees = lookup.fees_for(
            &self.class,
            self.academic_year,
            &self.student_type,
            self.english_medium,
        );
        let baseline = lookup.baseline_for(&self.class, self.academic_year, self.english_medium);

        let mut student = Student::new(
            self.name.trim(),
            school_code,
            self.academic_year,
            self.class.trim(),
            self.student_type,
            fee_id,
        );
        student.division = self.division;
        student.english_medium = self.english_medium;

        let state = &mut student.all_fee;
        state.set_tuition_fees(fees.fees.admission_fee, fees.fees.tuition_fee);
        state.tuition_fees_discount = baseline.fees.total() - fees.fees.total();
        state.bus_fee = self.bus_fee - self.bus_fee_discount;
        state.bus_fee_discount = self.bus_fee_discount;
        state.mess_fee = self.mess_fee;
        state.hostel_fee = self.hostel_fee;
        state.last_year_balance_fee = self.last_year_balance_fee;
        state.last_year_bus_fee = self.last_year_bus_fee;

        (student, fees)
    }
}
