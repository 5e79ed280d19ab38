use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for registered tutors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TutorId(pub String);

/// Identifier wrapper for registered students.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudentId(pub String);

/// Identifier wrapper for submitted class records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogEntryId(pub String);

impl fmt::Display for TutorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Grade taxonomy used for students and for pricing lessons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClassLevel {
    Nursery,
    Year(u8),
}

impl ClassLevel {
    /// Accepts `Nursery` and `Year 1` through `Year 12`, ignoring case and inner spacing.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        if normalized == "nursery" {
            return Some(Self::Nursery);
        }

        let year: u8 = normalized.strip_prefix("year")?.trim().parse().ok()?;
        (1..=12).contains(&year).then_some(Self::Year(year))
    }

    pub fn ordered() -> Vec<Self> {
        std::iter::once(Self::Nursery)
            .chain((1..=12).map(Self::Year))
            .collect()
    }
}

impl fmt::Display for ClassLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassLevel::Nursery => f.write_str("Nursery"),
            ClassLevel::Year(year) => write!(f, "Year {year}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tutor {
    pub id: TutorId,
    pub name: String,
    pub account_number: String,
    pub bank: String,
    pub subjects: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Tutor {
    pub fn teaches(&self, subject: &str) -> bool {
        self.subjects.iter().any(|taught| taught == subject)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub class_level: String,
    pub enrolled_subjects: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of a class record, see `workflow` for the permitted transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Valid,
    PendingApproval,
    Approved,
    Rejected,
    LateApproved,
}

impl RecordStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RecordStatus::Valid => "Valid",
            RecordStatus::PendingApproval => "Pending Approval",
            RecordStatus::Approved => "Approved",
            RecordStatus::Rejected => "Rejected",
            RecordStatus::LateApproved => "Late Approved",
        }
    }
}

/// Justification attached to a late submission and the admin decision on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub reason: String,
    pub request_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_date: Option<DateTime<Utc>>,
}

/// Administrative override metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LateApproval {
    pub approved_by: String,
    pub approved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub id: RecordId,
    pub tutor_id: TutorId,
    pub student_id: StudentId,
    pub class_level: String,
    pub subject: String,
    pub topic: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub date_submitted: DateTime<Utc>,
    pub payment_amount: u64,
    pub status: RecordStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub late_approval: Option<LateApproval>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_request: Option<ApprovalRequest>,
}

impl ClassRecord {
    pub fn slot(&self) -> LessonSlot {
        LessonSlot {
            tutor_id: self.tutor_id.clone(),
            student_id: self.student_id.clone(),
            subject: self.subject.clone(),
            start: self.start_time,
            end: self.end_time,
        }
    }

    /// Lesson length in hours; inverted or empty intervals count as zero.
    pub fn billable_hours(&self) -> f64 {
        if self.end_time <= self.start_time {
            return 0.0;
        }
        (self.end_time - self.start_time).num_milliseconds() as f64 / 3_600_000.0
    }
}

/// The tutor/student/subject triple and half-open interval a lesson occupies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonSlot {
    pub tutor_id: TutorId,
    pub student_id: StudentId,
    pub subject: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl LessonSlot {
    pub fn same_lesson_key(&self, other: &LessonSlot) -> bool {
        self.tutor_id == other.tutor_id
            && self.student_id == other.student_id
            && self.subject == other.subject
    }

    /// `[start, end)` intersection test for slots sharing the same key.
    pub fn overlaps(&self, other: &LessonSlot) -> bool {
        self.same_lesson_key(other) && other.start < self.end && other.end > self.start
    }
}

/// Raw class record payload as submitted by a tutor.
///
/// Every field is optional so that missing values surface as validation errors
/// naming the absent fields rather than as deserialization failures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordSubmission {
    #[serde(alias = "tutorId")]
    pub tutor_id: Option<String>,
    #[serde(alias = "studentId")]
    pub student_id: Option<String>,
    #[serde(alias = "classLevel")]
    pub class_level: Option<String>,
    pub subject: Option<String>,
    pub topic: Option<String>,
    #[serde(alias = "startTime")]
    pub start_time: Option<String>,
    #[serde(alias = "endTime")]
    pub end_time: Option<String>,
    pub comment: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TutorRegistration {
    pub name: Option<String>,
    #[serde(alias = "accountNumber")]
    pub account_number: Option<String>,
    pub bank: Option<String>,
    pub subjects: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StudentRegistration {
    pub name: Option<String>,
    #[serde(alias = "classLevel")]
    pub class_level: Option<String>,
    #[serde(alias = "enrolledSubjects")]
    pub enrolled_subjects: Vec<String>,
}

/// Admin verdict on a pending late submission.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApprovalDecision {
    pub approved: bool,
    #[serde(default, alias = "adminId")]
    pub admin_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LateApprovalRequest {
    #[serde(alias = "adminName")]
    pub admin_name: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminActionKind {
    LateRecordOverride,
}

impl AdminActionKind {
    pub const fn label(self) -> &'static str {
        match self {
            AdminActionKind::LateRecordOverride => "Late Record Override",
        }
    }
}

/// Append-only audit entry written whenever an admin overrides a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminActionLog {
    pub id: LogEntryId,
    pub admin_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tutor_id: Option<TutorId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<RecordId>,
    pub action: AdminActionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
