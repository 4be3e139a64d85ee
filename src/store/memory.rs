use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, RwLock};

use tracing::debug;

use crate::errors::{LedgerError, Result};
use crate::fee_structure::FeeStructureDocument;
use crate::school::School;
use crate::student::Student;
use crate::types::{ReceiptCounter, StudentId};

use super::{LedgerStore, Versioned};

/// in-process document store
///
/// Schools sit behind one mutex so a counter read and its increment can't
/// interleave with another caller's.
#[derive(Debug, Default)]
pub struct MemoryStore {
    schools: Mutex<HashMap<String, School>>,
    fee_structures: RwLock<HashMap<String, FeeStructureDocument>>,
    students: RwLock<HashMap<StudentId, Versioned<Student>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_school(&self, school: School) -> Result<()> {
        self.lock_schools()?.insert(school.code.clone(), school);
        Ok(())
    }

    pub fn put_fee_structure(&self, document: FeeStructureDocument) -> Result<()> {
        self.fee_structures
            .write()
            .map_err(poisoned)?
            .insert(document.school_code.clone(), document);
        Ok(())
    }

    fn lock_schools(&self) -> Result<MutexGuard<'_, HashMap<String, School>>> {
        self.schools.lock().map_err(poisoned)
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> LedgerError {
    LedgerError::Storage {
        message: format!("store lock poisoned: {}", e),
    }
}

impl LedgerStore for MemoryStore {
    fn load_school(&self, code: &str) -> Result<School> {
        self.lock_schools()?
            .get(code)
            .cloned()
            .ok_or_else(|| LedgerError::SchoolNotFound {
                code: code.to_string(),
            })
    }

    fn fee_structure(&self, school_code: &str) -> Result<Option<FeeStructureDocument>> {
        Ok(self
            .fee_structures
            .read()
            .map_err(poisoned)?
            .get(school_code)
            .cloned())
    }

    fn load_student(&self, id: StudentId) -> Result<Versioned<Student>> {
        self.students
            .read()
            .map_err(poisoned)?
            .get(&id)
            .cloned()
            .ok_or(LedgerError::StudentNotFound { id })
    }

    fn insert_student(&self, student: Student) -> Result<u64> {
        let mut students = self.students.write().map_err(poisoned)?;
        if students.contains_key(&student.id) {
            return Err(LedgerError::Storage {
                message: format!("student {} already exists", student.id),
            });
        }
        students.insert(student.id, Versioned::new(student, 1));
        Ok(1)
    }

    fn update_student(&self, student: &Student, expected_version: u64) -> Result<u64> {
        let mut students = self.students.write().map_err(poisoned)?;
        let stored = students
            .get_mut(&student.id)
            .ok_or(LedgerError::StudentNotFound { id: student.id })?;

        if stored.version != expected_version {
            return Err(LedgerError::VersionConflict {
                expected: expected_version,
                found: stored.version,
            });
        }

        stored.value = student.clone();
        stored.version += 1;
        debug!(student_id = %student.id, version = stored.version, "student document updated");
        Ok(stored.version)
    }

    fn next_counter_value(&self, school_code: &str, counter: ReceiptCounter) -> Result<u64> {
        let mut schools = self.lock_schools()?;
        let school = schools
            .get_mut(school_code)
            .ok_or_else(|| LedgerError::SchoolNotFound {
                code: school_code.to_string(),
            })?;
        let value = school.counters.advance(counter);
        debug!(school_code, counter = counter.field_name(), value, "counter advanced");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AcademicYear, StudentType};
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn student() -> Student {
        Student::new(
            "Noor",
            "SCH01",
            AcademicYear::parse("24-25").unwrap(),
            "1st",
            StudentType::new("DS"),
            1,
        )
    }

    #[test]
    fn test_versioned_update() {
        let store = MemoryStore::new();
        let mut student = student();
        assert_eq!(store.insert_student(student.clone()).unwrap(), 1);
        assert!(store.insert_student(student.clone()).is_err());

        student.division = "A".to_string();
        assert_eq!(store.update_student(&student, 1).unwrap(), 2);

        // stale writer loses
        student.division = "B".to_string();
        assert_eq!(
            store.update_student(&student, 1).unwrap_err(),
            LedgerError::VersionConflict { expected: 1, found: 2 }
        );

        let loaded = store.load_student(student.id).unwrap();
        assert_eq!(loaded.version, 2);
        assert_eq!(loaded.value.division, "A");
    }

    #[test]
    fn test_missing_documents() {
        let store = MemoryStore::new();
        assert!(matches!(store.load_school("NOPE"), Err(LedgerError::SchoolNotFound { .. })));
        assert!(matches!(
            store.next_counter_value("NOPE", ReceiptCounter::Tuition),
            Err(LedgerError::SchoolNotFound { .. })
        ));
        assert!(store.fee_structure("NOPE").unwrap().is_none());
        assert!(matches!(
            store.load_student(uuid::Uuid::new_v4()),
            Err(LedgerError::StudentNotFound { .. })
        ));
    }

    #[test]
    fn test_concurrent_counter_values_unique() {
        let store = Arc::new(MemoryStore::new());
        store.put_school(School::new("SCH01", "Green Valley")).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    (0..50)
                        .map(|_| {
                            store.next_counter_value("SCH01", ReceiptCounter::Tuition).unwrap()
                        })
                        .collect::<Vec<u64>>()
                })
            })
            .collect();

        let mut all = Vec::new();
        for handle in handles {
            let values = handle.join().unwrap();
            // each caller sees its own values strictly increasing
            assert!(values.windows(2).all(|w| w[0] < w[1]));
            all.extend(values);
        }

        let unique: HashSet<u64> = all.iter().copied().collect();
        assert_eq!(unique.len(), 400);
        assert_eq!(all.iter().max(), Some(&400));
        assert_eq!(
            store.load_school("SCH01").unwrap().counters.get(ReceiptCounter::Tuition),
            400
        );
    }
}
