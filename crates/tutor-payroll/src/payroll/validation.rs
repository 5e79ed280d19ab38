use chrono::{DateTime, Utc};

use super::calendar::{local_date, parse_instant};
use super::domain::{
    ApprovalRequest, ClassRecord, LessonSlot, RecordId, RecordStatus, RecordSubmission, Student,
    StudentId, Tutor, TutorId,
};
use super::error::{PayrollError, OVERLAP_MESSAGE};
use super::rates::compute_payment;
use super::repository::PayrollStore;
use crate::config::PayrollPolicy;

pub const ALLOWED_DURATIONS_MINUTES: [f64; 4] = [30.0, 60.0, 90.0, 120.0];
pub const DURATION_TOLERANCE_MINUTES: f64 = 1.0;

const DURATION_MESSAGE: &str =
    "Class duration must be 30 minutes, 1 hour, 1 hour 30 minutes, or 2 hours.";
const SAME_DAY_MESSAGE: &str = "Class records must be submitted the same day as the lesson. \
     Please use the late-submission endpoint for late submissions.";

/// Entry point a record arrives through; each applies a slightly different rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPath {
    /// Normal submission, must happen on the lesson day.
    SameDay,
    /// Late submission carrying a justification.
    Late,
    /// Edit of an already stored record.
    Amendment,
}

pub fn matches_allowed_duration(minutes: f64) -> bool {
    ALLOWED_DURATIONS_MINUTES
        .iter()
        .any(|allowed| (minutes - allowed).abs() <= DURATION_TOLERANCE_MINUTES)
}

/// A submission that passed every rule, with its references resolved.
#[derive(Debug, Clone)]
pub struct ValidatedSubmission {
    pub tutor: Tutor,
    pub student: Student,
    pub class_level: String,
    pub subject: String,
    pub topic: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub comment: Option<String>,
    pub reason: Option<String>,
}

impl ValidatedSubmission {
    pub fn payment_amount(&self) -> u64 {
        compute_payment(&self.class_level, self.start, self.end)
    }

    /// Build the record to persist for a new submission.
    pub fn into_record(self, id: RecordId, submitted_at: DateTime<Utc>) -> ClassRecord {
        let payment_amount = self.payment_amount();
        let (status, approval_request) = match self.reason {
            Some(reason) => (
                RecordStatus::PendingApproval,
                Some(ApprovalRequest {
                    reason,
                    request_date: submitted_at,
                    approved_by: None,
                    approval_date: None,
                }),
            ),
            None => (RecordStatus::Valid, None),
        };

        ClassRecord {
            id,
            tutor_id: self.tutor.id,
            student_id: self.student.id,
            class_level: self.class_level,
            subject: self.subject,
            topic: self.topic,
            start_time: self.start,
            end_time: self.end,
            date_submitted: submitted_at,
            payment_amount,
            status,
            comment: self.comment,
            late_approval: None,
            approval_request,
        }
    }

    /// Overwrite the lesson details of `record`, keeping its lifecycle metadata.
    pub fn amend(self, record: &mut ClassRecord) {
        record.payment_amount = self.payment_amount();
        record.tutor_id = self.tutor.id;
        record.student_id = self.student.id;
        record.class_level = self.class_level;
        record.subject = self.subject;
        record.topic = self.topic;
        record.start_time = self.start;
        record.end_time = self.end;
        record.comment = self.comment;
    }
}

struct RequiredFields {
    tutor_id: String,
    student_id: String,
    class_level: String,
    subject: String,
    topic: String,
    start_time: String,
    end_time: String,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn required_fields(
    submission: &RecordSubmission,
) -> Result<RequiredFields, PayrollError> {
    let fields = [
        ("tutor_id", &submission.tutor_id),
        ("student_id", &submission.student_id),
        ("class_level", &submission.class_level),
        ("subject", &submission.subject),
        ("topic", &submission.topic),
        ("start_time", &submission.start_time),
        ("end_time", &submission.end_time),
    ];
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| present((*value).clone()).is_none())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(PayrollError::validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let take = |value: &Option<String>| present(value.clone()).unwrap_or_default();
    Ok(RequiredFields {
        tutor_id: take(&submission.tutor_id),
        student_id: take(&submission.student_id),
        class_level: take(&submission.class_level),
        subject: take(&submission.subject),
        topic: take(&submission.topic),
        start_time: take(&submission.start_time),
        end_time: take(&submission.end_time),
    })
}

/// Enforces the business rules a class record must satisfy before it is stored.
#[derive(Debug, Clone, Default)]
pub struct RecordValidator {
    policy: PayrollPolicy,
}

impl RecordValidator {
    pub fn new(policy: PayrollPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &PayrollPolicy {
        &self.policy
    }

    /// Run every rule for `path`; `exclude` names the record being amended, if any.
    pub fn validate<S>(
        &self,
        store: &S,
        submission: RecordSubmission,
        path: SubmissionPath,
        submitted_at: DateTime<Utc>,
        exclude: Option<&RecordId>,
    ) -> Result<ValidatedSubmission, PayrollError>
    where
        S: PayrollStore + ?Sized,
    {
        let fields = required_fields(&submission)?;

        let reason = match path {
            SubmissionPath::Late => Some(present(submission.reason).ok_or_else(|| {
                PayrollError::validation("Reason for late submission required")
            })?),
            SubmissionPath::SameDay | SubmissionPath::Amendment => None,
        };

        let tutor = store.fetch_tutor(&TutorId(fields.tutor_id))?;
        let student = store.fetch_student(&StudentId(fields.student_id))?;
        let (tutor, student) = match (tutor, student) {
            (Some(tutor), Some(student)) => (tutor, student),
            _ => {
                return Err(PayrollError::NotFound(
                    "Tutor or Student not found".to_string(),
                ))
            }
        };

        if !tutor.teaches(&fields.subject) {
            return Err(PayrollError::validation(
                "Selected subject is not in tutor's subjects",
            ));
        }

        let offset = self.policy.reference_offset();
        let (start, end) = match (
            parse_instant(&fields.start_time, offset),
            parse_instant(&fields.end_time, offset),
        ) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(PayrollError::validation("Invalid start or end time")),
        };
        if end <= start {
            return Err(PayrollError::validation(
                "End time must be after start time",
            ));
        }

        let minutes = (end - start).num_milliseconds() as f64 / 60_000.0;
        if !matches_allowed_duration(minutes) {
            return Err(PayrollError::validation(DURATION_MESSAGE));
        }

        let slot = LessonSlot {
            tutor_id: tutor.id.clone(),
            student_id: student.id.clone(),
            subject: fields.subject.clone(),
            start,
            end,
        };
        if store.find_overlapping(&slot, exclude)?.is_some() {
            return Err(PayrollError::Conflict(OVERLAP_MESSAGE.to_string()));
        }

        if path == SubmissionPath::SameDay
            && local_date(start, offset) != local_date(submitted_at, offset)
        {
            return Err(PayrollError::validation(SAME_DAY_MESSAGE));
        }

        Ok(ValidatedSubmission {
            tutor,
            student,
            class_level: fields.class_level,
            subject: fields.subject,
            topic: fields.topic,
            start,
            end,
            comment: present(submission.comment),
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_whitelist_allows_one_minute_of_jitter() {
        for minutes in [29.0, 30.0, 31.0, 59.0, 61.0, 89.0, 91.0, 119.0, 121.0] {
            assert!(matches_allowed_duration(minutes), "{minutes} minutes");
        }
        for minutes in [28.0, 45.0, 62.0, 75.0, 100.0, 122.0, 180.0] {
            assert!(!matches_allowed_duration(minutes), "{minutes} minutes");
        }
    }

    #[test]
    fn missing_fields_are_listed_in_order() {
        let submission = RecordSubmission {
            tutor_id: Some("tut-1".to_string()),
            class_level: Some("Year 3".to_string()),
            topic: Some("   ".to_string()),
            start_time: Some("2025-01-01T10:00:00Z".to_string()),
            end_time: Some("2025-01-01T11:00:00Z".to_string()),
            ..RecordSubmission::default()
        };

        match required_fields(&submission) {
            Err(PayrollError::Validation(message)) => {
                assert_eq!(message, "Missing required fields: student_id, subject, topic")
            }
            Ok(_) => panic!("expected missing field error"),
            Err(other) => panic!("expected validation error, got {other:?}"),
        }
    }
}
