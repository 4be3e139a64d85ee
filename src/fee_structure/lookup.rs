use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::decimal::Money;
use crate::types::{AcademicYear, StudentType};

use super::{FeeSchedule, FeeStructureDocument, StudentTypeFee, YearStructure};

/// how a fee lookup was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LookupOutcome {
    /// structure for the requested year found
    Exact,
    /// requested year absent, latest year used instead
    YearFallback {
        requested: AcademicYear,
        used: AcademicYear,
    },
    /// school has no fee structure document
    MissingDocument,
    /// document exists but holds no year that parses
    NoUsableYear,
    MissingClass,
    MissingStudentType,
}

/// fees found for a lookup; misses resolve to zero fees
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeLookup {
    pub fees: FeeSchedule,
    pub outcome: LookupOutcome,
}

impl FeeLookup {
    fn miss(outcome: LookupOutcome) -> Self {
        Self {
            fees: FeeSchedule::ZERO,
            outcome,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.outcome, LookupOutcome::YearFallback { .. })
    }

    pub fn is_miss(&self) -> bool {
        !matches!(self.outcome, LookupOutcome::Exact | LookupOutcome::YearFallback { .. })
    }
}

/// resolves fee schedules from a school's fee structure document
pub struct FeeStructureLookup<'a> {
    document: Option<&'a FeeStructureDocument>,
    baseline: &'a StudentType,
}

impl<'a> FeeStructureLookup<'a> {
    pub fn new(document: Option<&'a FeeStructureDocument>, baseline: &'a StudentType) -> Self {
        Self { document, baseline }
    }

    /// fees for (class, year, type); misconfiguration yields zero fees
    pub fn fees_for(
        &self,
        class: &str,
        year: AcademicYear,
        student_type: &StudentType,
        english_medium: bool,
    ) -> FeeLookup {
        let Some(document) = self.document else {
            warn!(class, year = %year, "no fee structure document, using zero fees");
            return FeeLookup::miss(LookupOutcome::MissingDocument);
        };

        let Some((structure, outcome)) = select_year(document, year) else {
            warn!(
                school_code = %document.school_code,
                year = %year,
                "fee structure has no usable year, using zero fees"
            );
            return FeeLookup::miss(LookupOutcome::NoUsableYear);
        };

        let entries: Vec<&StudentTypeFee> = structure
            .classes
            .iter()
            .filter(|c| c.name.trim() == class.trim())
            .flat_map(|c| c.student_type.iter())
            .collect();

        if entries.is_empty() && !structure.classes.iter().any(|c| c.name.trim() == class.trim()) {
            warn!(
                school_code = %document.school_code,
                class,
                year = %structure.year,
                "class missing from fee structure, using zero fees"
            );
            return FeeLookup::miss(LookupOutcome::MissingClass);
        }

        match select_student_type(&entries, student_type, english_medium) {
            Some(entry) => FeeLookup {
                fees: entry.fee_structure,
                outcome,
            },
            None => {
                warn!(
                    school_code = %document.school_code,
                    class,
                    student_type = %student_type,
                    year = %structure.year,
                    "student type missing from fee structure, using zero fees"
                );
                FeeLookup::miss(LookupOutcome::MissingStudentType)
            }
        }
    }

    /// undiscounted fees for the same class and year
    pub fn baseline_for(&self, class: &str, year: AcademicYear, english_medium: bool) -> FeeLookup {
        self.fees_for(class, year, self.baseline, english_medium)
    }

    /// baseline total minus the fees of `student_type`
    pub fn discount_for(
        &self,
        class: &str,
        year: AcademicYear,
        student_type: &StudentType,
        english_medium: bool,
    ) -> Money {
        let baseline = self.baseline_for(class, year, english_medium).fees;
        let fees = self.fees_for(class, year, student_type, english_medium).fees;
        baseline.total() - fees.total()
    }
}

fn select_year(
    document: &FeeStructureDocument,
    year: AcademicYear,
) -> Option<(&YearStructure, LookupOutcome)> {
    if let Some(exact) = document
        .structures
        .iter()
        .find(|s| s.academic_year() == Some(year))
    {
        return Some((exact, LookupOutcome::Exact));
    }

    // greatest starting YY wins
    let (latest, used) = document
        .structures
        .iter()
        .filter_map(|s| s.academic_year().map(|y| (s, y)))
        .max_by_key(|(_, y)| y.start())?;

    info!(
        school_code = %document.school_code,
        requested = %year,
        used = %used,
        "fee structure year missing, falling back to latest"
    );

    Some((latest, LookupOutcome::YearFallback { requested: year, used }))
}

/// non-English-medium students take the non-English variant when both exist
fn select_student_type<'e>(
    entries: &[&'e StudentTypeFee],
    student_type: &StudentType,
    english_medium: bool,
) -> Option<&'e StudentTypeFee> {
    let candidates: Vec<&StudentTypeFee> = entries
        .iter()
        .copied()
        .filter(|entry| student_type.is(&entry.name))
        .collect();

    let preferred = candidates.iter().copied().find(|entry| {
        if english_medium {
            entry.english_medium != Some(false)
        } else {
            entry.english_medium == Some(false)
        }
    });

    preferred.or_else(|| candidates.first().copied())
}
