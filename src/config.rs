use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::types::StudentType;

/// ledger rules that vary per deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// largest single admission fee payment accepted
    pub admission_fee_ceiling: Money,
    /// undiscounted type that discounts are measured against
    pub baseline_student_type: StudentType,
    /// types that never pay an admission fee
    pub admission_exempt_types: Vec<StudentType>,
    /// payment modes treated as cheques (case-insensitive)
    pub cheque_modes: Vec<String>,
    /// chrono formats tried in order when parsing a payment date
    pub date_formats: Vec<String>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            admission_fee_ceiling: Money::from_major(1000),
            baseline_student_type: StudentType::new("DS"),
            admission_exempt_types: vec![StudentType::new("DSR")],
            cheque_modes: vec!["Cheque".to_string()],
            date_formats: vec![
                "%Y-%m-%d".to_string(),
                "%d-%m-%Y".to_string(),
                "%d/%m/%Y".to_string(),
            ],
        }
    }
}

impl LedgerConfig {
    /// load from a json document, falling back to defaults for missing keys
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LedgerConfig = serde_json::from_str(json).map_err(|e| {
            LedgerError::InvalidConfiguration {
                message: e.to_string(),
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.admission_fee_ceiling.is_negative() {
            return Err(LedgerError::InvalidConfiguration {
                message: format!("negative admission fee ceiling {}", self.admission_fee_ceiling),
            });
        }
        if self.baseline_student_type.as_str().is_empty() {
            return Err(LedgerError::InvalidConfiguration {
                message: "baseline student type is empty".to_string(),
            });
        }
        if self.date_formats.is_empty() {
            return Err(LedgerError::InvalidConfiguration {
                message: "no date formats configured".to_string(),
            });
        }
        Ok(())
    }

    pub fn is_cheque(&self, payment_mode: &str) -> bool {
        self.cheque_modes
            .iter()
            .any(|mode| mode.eq_ignore_ascii_case(payment_mode.trim()))
    }

    pub fn is_admission_exempt(&self, student_type: &StudentType) -> bool {
        self.admission_exempt_types
            .iter()
            .any(|exempt| student_type.is(exempt.as_str()))
    }
}
