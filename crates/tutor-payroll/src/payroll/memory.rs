//! In-process store used by the service binary and the test suites.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    AdminActionLog, ClassRecord, LessonSlot, RecordId, RecordStatus, Student, StudentId, Tutor,
    TutorId,
};
use super::repository::{ActionLog, PayrollStore, RecordFilter, RepositoryError};

#[derive(Debug, Default)]
struct Collections {
    tutors: HashMap<TutorId, Tutor>,
    students: HashMap<StudentId, Student>,
    records: HashMap<RecordId, ClassRecord>,
}

impl Collections {
    fn overlapping(&self, slot: &LessonSlot, exclude: Option<&RecordId>) -> Option<&ClassRecord> {
        self.records
            .values()
            .filter(|record| exclude != Some(&record.id))
            .find(|record| record.slot().overlaps(slot))
    }
}

/// Single-lock store; overlap checks and writes happen under the same guard.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Collections>>,
}

impl MemoryStore {
    fn lock(&self) -> Result<MutexGuard<'_, Collections>, RepositoryError> {
        self.inner
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
    }
}

fn sorted_by_name<T>(mut items: Vec<T>, name: impl Fn(&T) -> &str) -> Vec<T> {
    items.sort_by(|left, right| name(left).cmp(name(right)));
    items
}

impl PayrollStore for MemoryStore {
    fn insert_tutor(&self, tutor: Tutor) -> Result<Tutor, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.tutors.contains_key(&tutor.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.tutors.insert(tutor.id.clone(), tutor.clone());
        Ok(tutor)
    }

    fn fetch_tutor(&self, id: &TutorId) -> Result<Option<Tutor>, RepositoryError> {
        Ok(self.lock()?.tutors.get(id).cloned())
    }

    fn list_tutors(&self) -> Result<Vec<Tutor>, RepositoryError> {
        let tutors = self.lock()?.tutors.values().cloned().collect();
        Ok(sorted_by_name(tutors, |tutor: &Tutor| tutor.name.as_str()))
    }

    fn insert_student(&self, student: Student) -> Result<Student, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.students.contains_key(&student.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.students.insert(student.id.clone(), student.clone());
        Ok(student)
    }

    fn fetch_student(&self, id: &StudentId) -> Result<Option<Student>, RepositoryError> {
        Ok(self.lock()?.students.get(id).cloned())
    }

    fn list_students(&self) -> Result<Vec<Student>, RepositoryError> {
        let students = self.lock()?.students.values().cloned().collect();
        Ok(sorted_by_name(students, |student: &Student| {
            student.name.as_str()
        }))
    }

    fn insert_record(&self, record: ClassRecord) -> Result<ClassRecord, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.records.contains_key(&record.id)
            || guard.overlapping(&record.slot(), None).is_some()
        {
            return Err(RepositoryError::Conflict);
        }
        guard.records.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update_record(
        &self,
        record: ClassRecord,
        expected: RecordStatus,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        let found = guard
            .records
            .get(&record.id)
            .map(|stored| stored.status)
            .ok_or(RepositoryError::NotFound)?;
        if found != expected {
            return Err(RepositoryError::StatusChanged { found });
        }
        if guard.overlapping(&record.slot(), Some(&record.id)).is_some() {
            return Err(RepositoryError::Conflict);
        }
        guard.records.insert(record.id.clone(), record);
        Ok(())
    }

    fn fetch_record(&self, id: &RecordId) -> Result<Option<ClassRecord>, RepositoryError> {
        Ok(self.lock()?.records.get(id).cloned())
    }

    fn delete_record(&self, id: &RecordId) -> Result<bool, RepositoryError> {
        Ok(self.lock()?.records.remove(id).is_some())
    }

    fn delete_records(&self, ids: &[RecordId]) -> Result<usize, RepositoryError> {
        let mut guard = self.lock()?;
        Ok(ids
            .iter()
            .filter(|id| guard.records.remove(*id).is_some())
            .count())
    }

    fn find_records(&self, filter: &RecordFilter) -> Result<Vec<ClassRecord>, RepositoryError> {
        let guard = self.lock()?;
        let mut records: Vec<ClassRecord> = guard
            .records
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        records.sort_by(|left, right| {
            right
                .date_submitted
                .cmp(&left.date_submitted)
                .then_with(|| left.id.cmp(&right.id))
        });
        Ok(records)
    }

    fn find_overlapping(
        &self,
        slot: &LessonSlot,
        exclude: Option<&RecordId>,
    ) -> Result<Option<ClassRecord>, RepositoryError> {
        Ok(self.lock()?.overlapping(slot, exclude).cloned())
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryActionLog {
    entries: Arc<Mutex<Vec<AdminActionLog>>>,
}

impl ActionLog for MemoryActionLog {
    fn append(&self, entry: AdminActionLog) -> Result<AdminActionLog, RepositoryError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| RepositoryError::Unavailable("action log mutex poisoned".to_string()))?;
        guard.push(entry.clone());
        Ok(entry)
    }

    fn entries(&self) -> Result<Vec<AdminActionLog>, RepositoryError> {
        self.entries
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| RepositoryError::Unavailable("action log mutex poisoned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, hour, minute, 0).unwrap()
    }

    fn record(id: &str, start: DateTime<Utc>, minutes: i64) -> ClassRecord {
        ClassRecord {
            id: RecordId(id.to_string()),
            tutor_id: TutorId("tut-1".to_string()),
            student_id: StudentId("stu-1".to_string()),
            class_level: "Year 4".to_string(),
            subject: "Mathematics".to_string(),
            topic: "Fractions".to_string(),
            start_time: start,
            end_time: start + Duration::minutes(minutes),
            date_submitted: start + Duration::minutes(minutes),
            payment_amount: 3800,
            status: RecordStatus::Valid,
            comment: None,
            late_approval: None,
            approval_request: None,
        }
    }

    #[test]
    fn insert_rejects_overlapping_slot() {
        let store = MemoryStore::default();
        store
            .insert_record(record("rec-1", at(10, 0), 60))
            .expect("first record stored");

        assert!(matches!(
            store.insert_record(record("rec-2", at(10, 30), 60)),
            Err(RepositoryError::Conflict)
        ));
        store
            .insert_record(record("rec-3", at(11, 0), 60))
            .expect("adjacent record stored");
    }

    #[test]
    fn update_ignores_the_record_being_replaced() {
        let store = MemoryStore::default();
        store
            .insert_record(record("rec-1", at(10, 0), 60))
            .expect("record stored");

        let mut moved = record("rec-1", at(10, 30), 60);
        moved.topic = "Decimals".to_string();
        store
            .update_record(moved, RecordStatus::Valid)
            .expect("self overlap is allowed");

        assert!(matches!(
            store.update_record(record("rec-missing", at(14, 0), 60), RecordStatus::Valid),
            Err(RepositoryError::NotFound)
        ));
    }

    #[test]
    fn update_refuses_when_status_moved_on() {
        let store = MemoryStore::default();
        store
            .insert_record(record("rec-1", at(10, 0), 60))
            .expect("record stored");

        let mut overridden = record("rec-1", at(10, 0), 60);
        overridden.status = RecordStatus::LateApproved;
        store
            .update_record(overridden.clone(), RecordStatus::Valid)
            .expect("first transition lands");

        assert!(matches!(
            store.update_record(overridden, RecordStatus::Valid),
            Err(RepositoryError::StatusChanged {
                found: RecordStatus::LateApproved
            })
        ));
    }

    #[test]
    fn find_records_orders_by_submission_descending() {
        let store = MemoryStore::default();
        store
            .insert_record(record("rec-early", at(8, 0), 60))
            .expect("stored");
        store
            .insert_record(record("rec-late", at(15, 0), 60))
            .expect("stored");

        let ids: Vec<String> = store
            .find_records(&RecordFilter::default())
            .expect("query succeeds")
            .into_iter()
            .map(|record| record.id.0)
            .collect();
        assert_eq!(ids, vec!["rec-late".to_string(), "rec-early".to_string()]);
    }

    #[test]
    fn bulk_delete_counts_only_existing_records() {
        let store = MemoryStore::default();
        store
            .insert_record(record("rec-1", at(8, 0), 60))
            .expect("stored");
        store
            .insert_record(record("rec-2", at(12, 0), 60))
            .expect("stored");

        let deleted = store
            .delete_records(&[
                RecordId("rec-1".to_string()),
                RecordId("rec-unknown".to_string()),
            ])
            .expect("delete succeeds");
        assert_eq!(deleted, 1);
        assert!(store
            .fetch_record(&RecordId("rec-2".to_string()))
            .expect("fetch succeeds")
            .is_some());
    }
}
