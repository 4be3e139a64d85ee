pub mod config;
pub mod decimal;
pub mod enrollment;
pub mod errors;
pub mod events;
pub mod fee_structure;
pub mod ledger;
pub mod promotion;
pub mod school;
pub mod service;
pub mod state;
pub mod store;
pub mod student;
pub mod types;
pub mod views;

// re-export key types
pub use config::LedgerConfig;
pub use decimal::Money;
pub use enrollment::Enrollment;
pub use errors::{LedgerError, Result};
pub use events::{Event, EventStore};
pub use fee_structure::{
    FeeLookup, FeeSchedule, FeeStructureDocument, FeeStructureLookup, LookupOutcome,
};
pub use ledger::{
    DueCalculator, DueLine, DuesReport, HistoricalSnapshot, Receipt, Transaction,
    TransactionRequest, TransactionValidator,
};
pub use promotion::{BatchProgress, BatchPromotionResult, PromotionPlan, PromotionSummary, Rollover};
pub use school::{ReceiptCounters, School};
pub use service::FeeLedgerService;
pub use state::{FeeLedgerState, LedgerSnapshot, TuitionFees};
pub use store::{LedgerStore, MemoryStore, Versioned};
pub use student::Student;
pub use types::{
    AcademicYear, ChequeOutcome, FeeType, ReceiptCounter, StudentId, StudentStatus, StudentType,
    TransactionId, TransactionStatus, YearRelation,
};
pub use views::StudentLedgerView;

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
