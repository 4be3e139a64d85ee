pub mod lookup;

use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::AcademicYear;

pub use lookup::{FeeLookup, FeeStructureLookup, LookupOutcome};

/// admission and tuition fee for one student type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FeeSchedule {
    #[serde(rename = "AdmissionFee", default)]
    pub admission_fee: Money,
    #[serde(rename = "TuitionFee", default)]
    pub tuition_fee: Money,
}

impl FeeSchedule {
    pub const ZERO: FeeSchedule = FeeSchedule {
        admission_fee: Money::ZERO,
        tuition_fee: Money::ZERO,
    };

    pub fn new(admission_fee: Money, tuition_fee: Money) -> Self {
        Self {
            admission_fee,
            tuition_fee,
        }
    }

    pub fn total(&self) -> Money {
        self.admission_fee + self.tuition_fee
    }

    /// the same schedule with the one-time admission fee dropped
    pub fn without_admission(self) -> Self {
        Self {
            admission_fee: Money::ZERO,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentTypeFee {
    pub name: String,
    /// `Some(false)` marks the non-English-medium variant
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub english_medium: Option<bool>,
    #[serde(default)]
    pub fee_structure: FeeSchedule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassFees {
    pub name: String,
    #[serde(default)]
    pub student_type: Vec<StudentTypeFee>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearStructure {
    /// kept raw; unparseable years are skipped during fallback
    pub year: String,
    #[serde(default)]
    pub classes: Vec<ClassFees>,
}

impl YearStructure {
    pub fn academic_year(&self) -> Option<AcademicYear> {
        AcademicYear::parse(&self.year).ok()
    }
}

/// all fee structures of one school
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FeeStructureDocument {
    pub school_code: String,
    #[serde(default)]
    pub structures: Vec<YearStructure>,
}

impl FeeStructureDocument {
    pub fn new(school_code: impl Into<String>) -> Self {
        Self {
            school_code: school_code.into(),
            structures: Vec::new(),
        }
    }

    /// add or replace a fee for (year, class, type)
    pub fn set_fee(
        &mut self,
        year: AcademicYear,
        class: &str,
        student_type: &str,
        english_medium: Option<bool>,
        fees: FeeSchedule,
    ) -> &mut Self {
        let year_label = year.to_string();
        let year_index = match self.structures.iter().position(|s| s.year == year_label) {
            Some(index) => index,
            None => {
                self.structures.push(YearStructure {
                    year: year_label,
                    classes: Vec::new(),
                });
                self.structures.len() - 1
            }
        };
        let structure = &mut self.structures[year_index];

        let class_index = match structure.classes.iter().position(|c| c.name == class) {
            Some(index) => index,
            None => {
                structure.classes.push(ClassFees {
                    name: class.to_string(),
                    student_type: Vec::new(),
                });
                structure.classes.len() - 1
            }
        };
        let class_fees = &mut structure.classes[class_index];

        match class_fees
            .student_type
            .iter_mut()
            .find(|t| t.name == student_type && t.english_medium == english_medium)
        {
            Some(entry) => entry.fee_structure = fees,
            None => class_fees.student_type.push(StudentTypeFee {
                name: student_type.to_string(),
                english_medium,
                fee_structure: fees,
            }),
        }

        self
    }
}
