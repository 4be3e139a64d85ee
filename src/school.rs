use serde::{Deserialize, Serialize};

use crate::errors::{LedgerError, Result};
use crate::types::ReceiptCounter;

/// per-school counters; receipt numbers are counter + 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ReceiptCounters {
    pub tuition_receipt_count: u64,
    pub bus_receipt_count: u64,
    pub stock_receipt_count: u64,
    pub fee_id_count: u64,
}

impl ReceiptCounters {
    pub fn get(&self, counter: ReceiptCounter) -> u64 {
        match counter {
            ReceiptCounter::Tuition => self.tuition_receipt_count,
            ReceiptCounter::Bus => self.bus_receipt_count,
            ReceiptCounter::Stock => self.stock_receipt_count,
            ReceiptCounter::FeeId => self.fee_id_count,
        }
    }

    /// bump and return the new value
    pub fn advance(&mut self, counter: ReceiptCounter) -> u64 {
        let slot = match counter {
            ReceiptCounter::Tuition => &mut self.tuition_receipt_count,
            ReceiptCounter::Bus => &mut self.bus_receipt_count,
            ReceiptCounter::Stock => &mut self.stock_receipt_count,
            ReceiptCounter::FeeId => &mut self.fee_id_count,
        };
        *slot += 1;
        *slot
    }
}

/// school configuration document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct School {
    pub code: String,
    #[serde(default)]
    pub name: String,
    /// ordered; the order is the promotion sequence
    #[serde(rename = "class", default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub divisions: Vec<String>,
    #[serde(default)]
    pub payment_modes: Vec<String>,
    #[serde(default)]
    pub accounts: Vec<String>,
    #[serde(default)]
    pub fee_structure_ref: Option<String>,
    #[serde(flatten)]
    pub counters: ReceiptCounters,
}

impl School {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            classes: Vec::new(),
            divisions: Vec::new(),
            payment_modes: Vec::new(),
            accounts: Vec::new(),
            fee_structure_ref: None,
            counters: ReceiptCounters::default(),
        }
    }

    pub fn with_classes<I, T>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.classes = classes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_payment_modes<I, T>(mut self, modes: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.payment_modes = modes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_accounts<I, T>(mut self, accounts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.accounts = accounts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_counters(mut self, counters: ReceiptCounters) -> Self {
        self.counters = counters;
        self
    }

    /// class that follows `class` in the promotion sequence
    pub fn next_class(&self, class: &str) -> Result<&str> {
        let position = self
            .classes
            .iter()
            .position(|c| c == class)
            .ok_or_else(|| LedgerError::ClassNotConfigured {
                class: class.to_string(),
            })?;

        self.classes
            .get(position + 1)
            .map(String::as_str)
            .ok_or_else(|| LedgerError::NoFurtherClass {
                class: class.to_string(),
            })
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn has_payment_mode(&self, mode: &str) -> bool {
        self.payment_modes.iter().any(|m| m == mode)
    }

    pub fn has_account(&self, account: &str) -> bool {
        self.accounts.iter().any(|a| a == account)
    }
}
