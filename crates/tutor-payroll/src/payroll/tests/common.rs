use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use axum::body::to_bytes;
use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::config::PayrollPolicy;
use crate::payroll::auth::SharedSecretVerifier;
use crate::payroll::domain::{
    AdminActionLog, ClassRecord, LessonSlot, RecordId, RecordStatus, RecordSubmission, Student,
    StudentId, StudentRegistration, Tutor, TutorId, TutorRegistration,
};
use crate::payroll::memory::{MemoryActionLog, MemoryStore};
use crate::payroll::repository::{ActionLog, PayrollStore, RecordFilter, RepositoryError};
use crate::payroll::router::payroll_router;
use crate::payroll::service::PayrollService;

pub(super) const ADMIN_SECRET: &str = "test-admin-secret";

pub(super) type MemoryService = PayrollService<MemoryStore, MemoryActionLog>;

/// 10 March 2025, 10:00 in the reference timezone (09:00 UTC).
pub(super) fn lesson_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
}

/// Afternoon of the lesson day.
pub(super) fn same_day() -> DateTime<Utc> {
    lesson_start() + Duration::hours(6)
}

pub(super) fn next_day() -> DateTime<Utc> {
    lesson_start() + Duration::days(1)
}

pub(super) fn build_service() -> (MemoryService, Arc<MemoryStore>, Arc<MemoryActionLog>) {
    let store = Arc::new(MemoryStore::default());
    let log = Arc::new(MemoryActionLog::default());
    let service = PayrollService::new(store.clone(), log.clone(), PayrollPolicy::default());
    (service, store, log)
}

pub(super) fn seed<S, L>(service: &PayrollService<S, L>) -> (Tutor, Student)
where
    S: PayrollStore + 'static,
    L: ActionLog + 'static,
{
    let tutor = service
        .register_tutor(
            TutorRegistration {
                name: Some("Ada Obi".to_string()),
                account_number: Some("0123456789".to_string()),
                bank: Some("Zenith Bank".to_string()),
                subjects: vec!["Mathematics".to_string(), "English".to_string()],
            },
            lesson_start(),
        )
        .expect("tutor registers");
    let student = service
        .register_student(
            StudentRegistration {
                name: Some("Kemi Ade".to_string()),
                class_level: Some("Year 8".to_string()),
                enrolled_subjects: vec!["Mathematics".to_string()],
            },
            lesson_start(),
        )
        .expect("student registers");
    (tutor, student)
}

pub(super) fn submission(
    tutor: &Tutor,
    student: &Student,
    start: DateTime<Utc>,
    minutes: i64,
) -> RecordSubmission {
    RecordSubmission {
        tutor_id: Some(tutor.id.0.clone()),
        student_id: Some(student.id.0.clone()),
        class_level: Some(student.class_level.clone()),
        subject: Some("Mathematics".to_string()),
        topic: Some("Simultaneous equations".to_string()),
        start_time: Some(start.to_rfc3339()),
        end_time: Some((start + Duration::minutes(minutes)).to_rfc3339()),
        comment: None,
        reason: None,
    }
}

pub(super) fn late_submission(
    tutor: &Tutor,
    student: &Student,
    start: DateTime<Utc>,
    minutes: i64,
) -> RecordSubmission {
    RecordSubmission {
        reason: Some("Power outage at home".to_string()),
        ..submission(tutor, student, start, minutes)
    }
}

pub(super) fn router_with_service(service: Arc<MemoryService>) -> axum::Router {
    payroll_router(service, Arc::new(SharedSecretVerifier::new(ADMIN_SECRET)))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("valid json body")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

/// Store whose backend is down.
pub(super) struct UnavailableStore;

fn unavailable<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl PayrollStore for UnavailableStore {
    fn insert_tutor(&self, _tutor: Tutor) -> Result<Tutor, RepositoryError> {
        unavailable()
    }

    fn fetch_tutor(&self, _id: &TutorId) -> Result<Option<Tutor>, RepositoryError> {
        unavailable()
    }

    fn list_tutors(&self) -> Result<Vec<Tutor>, RepositoryError> {
        unavailable()
    }

    fn insert_student(&self, _student: Student) -> Result<Student, RepositoryError> {
        unavailable()
    }

    fn fetch_student(&self, _id: &StudentId) -> Result<Option<Student>, RepositoryError> {
        unavailable()
    }

    fn list_students(&self) -> Result<Vec<Student>, RepositoryError> {
        unavailable()
    }

    fn insert_record(&self, _record: ClassRecord) -> Result<ClassRecord, RepositoryError> {
        unavailable()
    }

    fn update_record(
        &self,
        _record: ClassRecord,
        _expected: RecordStatus,
    ) -> Result<(), RepositoryError> {
        unavailable()
    }

    fn fetch_record(&self, _id: &RecordId) -> Result<Option<ClassRecord>, RepositoryError> {
        unavailable()
    }

    fn delete_record(&self, _id: &RecordId) -> Result<bool, RepositoryError> {
        unavailable()
    }

    fn delete_records(&self, _ids: &[RecordId]) -> Result<usize, RepositoryError> {
        unavailable()
    }

    fn find_records(&self, _filter: &RecordFilter) -> Result<Vec<ClassRecord>, RepositoryError> {
        unavailable()
    }

    fn find_overlapping(
        &self,
        _slot: &LessonSlot,
        _exclude: Option<&RecordId>,
    ) -> Result<Option<ClassRecord>, RepositoryError> {
        unavailable()
    }
}

/// Memory store that stalls every record read, so concurrent callers both
/// observe the same status before either writes.
#[derive(Default)]
pub(super) struct SlowReadStore {
    inner: MemoryStore,
}

const READ_STALL: std::time::Duration = std::time::Duration::from_millis(50);

impl PayrollStore for SlowReadStore {
    fn insert_tutor(&self, tutor: Tutor) -> Result<Tutor, RepositoryError> {
        self.inner.insert_tutor(tutor)
    }

    fn fetch_tutor(&self, id: &TutorId) -> Result<Option<Tutor>, RepositoryError> {
        self.inner.fetch_tutor(id)
    }

    fn list_tutors(&self) -> Result<Vec<Tutor>, RepositoryError> {
        self.inner.list_tutors()
    }

    fn insert_student(&self, student: Student) -> Result<Student, RepositoryError> {
        self.inner.insert_student(student)
    }

    fn fetch_student(&self, id: &StudentId) -> Result<Option<Student>, RepositoryError> {
        self.inner.fetch_student(id)
    }

    fn list_students(&self) -> Result<Vec<Student>, RepositoryError> {
        self.inner.list_students()
    }

    fn insert_record(&self, record: ClassRecord) -> Result<ClassRecord, RepositoryError> {
        self.inner.insert_record(record)
    }

    fn update_record(
        &self,
        record: ClassRecord,
        expected: RecordStatus,
    ) -> Result<(), RepositoryError> {
        self.inner.update_record(record, expected)
    }

    fn fetch_record(&self, id: &RecordId) -> Result<Option<ClassRecord>, RepositoryError> {
        let record = self.inner.fetch_record(id);
        thread::sleep(READ_STALL);
        record
    }

    fn delete_record(&self, id: &RecordId) -> Result<bool, RepositoryError> {
        self.inner.delete_record(id)
    }

    fn delete_records(&self, ids: &[RecordId]) -> Result<usize, RepositoryError> {
        self.inner.delete_records(ids)
    }

    fn find_records(&self, filter: &RecordFilter) -> Result<Vec<ClassRecord>, RepositoryError> {
        self.inner.find_records(filter)
    }

    fn find_overlapping(
        &self,
        slot: &LessonSlot,
        exclude: Option<&RecordId>,
    ) -> Result<Option<ClassRecord>, RepositoryError> {
        self.inner.find_overlapping(slot, exclude)
    }
}

/// Action log that rejects its first `failures` writes, then recovers.
#[derive(Default)]
pub(super) struct FlakyLog {
    failures: usize,
    attempts: AtomicUsize,
    inner: MemoryActionLog,
}

impl FlakyLog {
    pub(super) fn failing(failures: usize) -> Self {
        Self {
            failures,
            ..Self::default()
        }
    }

    pub(super) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl ActionLog for FlakyLog {
    fn append(&self, entry: AdminActionLog) -> Result<AdminActionLog, RepositoryError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures {
            return Err(RepositoryError::Unavailable("audit table locked".to_string()));
        }
        self.inner.append(entry)
    }

    fn entries(&self) -> Result<Vec<AdminActionLog>, RepositoryError> {
        self.inner.entries()
    }
}
