use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{
    AcademicYear, FeeType, StudentId, StudentStatus, TransactionId, TransactionStatus,
};

/// all events that can be emitted by the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // enrollment events
    StudentEnrolled {
        student_id: StudentId,
        fee_id: u64,
        academic_year: AcademicYear,
        class: String,
        timestamp: DateTime<Utc>,
    },

    // payment events
    TransactionRecorded {
        student_id: StudentId,
        transaction_id: TransactionId,
        fee_type: FeeType,
        amount: Money,
        receipt_id: Option<u64>,
        temp_receipt_id: Option<String>,
        status: TransactionStatus,
        timestamp: DateTime<Utc>,
    },
    ChequeCleared {
        student_id: StudentId,
        transaction_id: TransactionId,
        receipt_id: u64,
        settled_previous_year: Money,
        timestamp: DateTime<Utc>,
    },
    ChequeRejected {
        student_id: StudentId,
        transaction_id: TransactionId,
        timestamp: DateTime<Utc>,
    },
    TransactionDeleted {
        student_id: StudentId,
        transaction_id: TransactionId,
        fee_type: FeeType,
        amount: Money,
        status: TransactionStatus,
        timestamp: DateTime<Utc>,
    },

    // rollover events
    StudentPromoted {
        student_id: StudentId,
        from_year: AcademicYear,
        to_year: AcademicYear,
        from_class: String,
        to_class: String,
        new_status: StudentStatus,
        rolled_to_balance: Money,
        rolled_to_bus: Money,
        timestamp: DateTime<Utc>,
    },

    // fee edits
    DiscountUpdated {
        student_id: StudentId,
        old_discount: Money,
        new_discount: Money,
        new_total: Money,
        timestamp: DateTime<Utc>,
    },
    BusFeeUpdated {
        student_id: StudentId,
        bus_fee: Money,
        discount: Money,
        timestamp: DateTime<Utc>,
    },
    BoardingFeesUpdated {
        student_id: StudentId,
        mess_fee: Money,
        hostel_fee: Money,
        timestamp: DateTime<Utc>,
    },

    // configuration
    FeeStructureFallback {
        school_code: String,
        requested_year: AcademicYear,
        used_year: AcademicYear,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
