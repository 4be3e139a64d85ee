pub mod dues;
pub mod transaction;
pub mod validation;

pub use dues::{previous_payments, DueCalculator, DueLine, DuesReport};
pub use transaction::{HistoricalSnapshot, Receipt, Transaction};
pub use validation::{TransactionRequest, TransactionValidator, ValidatedPayment};
