pub mod memory;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::fee_structure::FeeStructureDocument;
use crate::school::School;
use crate::student::Student;
use crate::types::{ReceiptCounter, StudentId};

pub use memory::MemoryStore;

/// a stored document and the version it was read at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub value: T,
    pub version: u64,
}

impl<T> Versioned<T> {
    pub fn new(value: T, version: u64) -> Self {
        Self { value, version }
    }
}

/// persistence the ledger needs from a document store
pub trait LedgerStore {
    fn load_school(&self, code: &str) -> Result<School>;

    fn fee_structure(&self, school_code: &str) -> Result<Option<FeeStructureDocument>>;

    fn load_student(&self, id: StudentId) -> Result<Versioned<Student>>;

    /// store a new student at version 1
    fn insert_student(&self, student: Student) -> Result<u64>;

    /// replace the student if still at `expected_version`; returns the new version
    fn update_student(&self, student: &Student, expected_version: u64) -> Result<u64>;

    /// atomically increment a school counter and return the new value
    fn next_counter_value(&self, school_code: &str, counter: ReceiptCounter) -> Result<u64>;
}

impl<T: LedgerStore + ?Sized> LedgerStore for Arc<T> {
    fn load_school(&self, code: &str) -> Result<School> {
        (**self).load_school(code)
    }

    fn fee_structure(&self, school_code: &str) -> Result<Option<FeeStructureDocument>> {
        (**self).fee_structure(school_code)
    }

    fn load_student(&self, id: StudentId) -> Result<Versioned<Student>> {
        (**self).load_student(id)
    }

    fn insert_student(&self, student: Student) -> Result<u64> {
        (**self).insert_student(student)
    }

    fn update_student(&self, student: &Student, expected_version: u64) -> Result<u64> {
        (**self).update_student(student, expected_version)
    }

    fn next_counter_value(&self, school_code: &str, counter: ReceiptCounter) -> Result<u64> {
        (**self).next_counter_value(school_code, counter)
    }
}
