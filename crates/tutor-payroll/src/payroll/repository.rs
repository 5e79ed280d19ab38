use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{
    AdminActionLog, ClassRecord, LessonSlot, RecordId, RecordStatus, Student, StudentId, Tutor,
    TutorId,
};

/// Which timestamp a date window applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Submitted,
    LessonStart,
}

/// Inclusive range over one of the record timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub field: DateField,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateWindow {
    pub fn contains(&self, record: &ClassRecord) -> bool {
        let instant = match self.field {
            DateField::Submitted => record.date_submitted,
            DateField::LessonStart => record.start_time,
        };
        self.from.map_or(true, |from| instant >= from) && self.to.map_or(true, |to| instant <= to)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub tutor_id: Option<TutorId>,
    pub status: Option<RecordStatus>,
    pub window: Option<DateWindow>,
}

impl RecordFilter {
    pub fn with_status(status: RecordStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn matches(&self, record: &ClassRecord) -> bool {
        self.tutor_id
            .as_ref()
            .map_or(true, |tutor_id| &record.tutor_id == tutor_id)
            && self.status.map_or(true, |status| record.status == status)
            && self.window.map_or(true, |window| window.contains(record))
    }
}

/// A class record with its tutor and student resolved, when they still exist.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HydratedRecord {
    #[serde(flatten)]
    pub record: ClassRecord,
    pub tutor: Option<Tutor>,
    pub student: Option<Student>,
}

/// Storage abstraction over the tutor, student, and class record collections.
///
/// `insert_record` and `update_record` must reject a record whose lesson slot
/// overlaps another stored record with [`RepositoryError::Conflict`], checked
/// atomically with the write. `update_record` is also a compare-and-swap on the
/// status: the write only lands while the stored record still has `expected`,
/// otherwise [`RepositoryError::StatusChanged`] is returned.
pub trait PayrollStore: Send + Sync {
    fn insert_tutor(&self, tutor: Tutor) -> Result<Tutor, RepositoryError>;
    fn fetch_tutor(&self, id: &TutorId) -> Result<Option<Tutor>, RepositoryError>;
    fn list_tutors(&self) -> Result<Vec<Tutor>, RepositoryError>;

    fn insert_student(&self, student: Student) -> Result<Student, RepositoryError>;
    fn fetch_student(&self, id: &StudentId) -> Result<Option<Student>, RepositoryError>;
    fn list_students(&self) -> Result<Vec<Student>, RepositoryError>;

    fn insert_record(&self, record: ClassRecord) -> Result<ClassRecord, RepositoryError>;
    fn update_record(
        &self,
        record: ClassRecord,
        expected: RecordStatus,
    ) -> Result<(), RepositoryError>;
    fn fetch_record(&self, id: &RecordId) -> Result<Option<ClassRecord>, RepositoryError>;
    fn delete_record(&self, id: &RecordId) -> Result<bool, RepositoryError>;
    fn delete_records(&self, ids: &[RecordId]) -> Result<usize, RepositoryError>;
    /// Matching records, most recently submitted first.
    fn find_records(&self, filter: &RecordFilter) -> Result<Vec<ClassRecord>, RepositoryError>;
    fn find_overlapping(
        &self,
        slot: &LessonSlot,
        exclude: Option<&RecordId>,
    ) -> Result<Option<ClassRecord>, RepositoryError>;

    fn find_hydrated(&self, filter: &RecordFilter) -> Result<Vec<HydratedRecord>, RepositoryError> {
        self.find_records(filter)?
            .into_iter()
            .map(|record| {
                let tutor = self.fetch_tutor(&record.tutor_id)?;
                let student = self.fetch_student(&record.student_id)?;
                Ok(HydratedRecord {
                    record,
                    tutor,
                    student,
                })
            })
            .collect()
    }
}

/// Append-only sink for admin overrides.
pub trait ActionLog: Send + Sync {
    fn append(&self, entry: AdminActionLog) -> Result<AdminActionLog, RepositoryError>;
    /// Entries in the order they were appended.
    fn entries(&self) -> Result<Vec<AdminActionLog>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists or overlaps an existing record")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("record status changed to {}", .found.label())]
    StatusChanged { found: RecordStatus },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
