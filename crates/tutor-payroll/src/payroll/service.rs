use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::domain::{
    AdminActionKind, AdminActionLog, ApprovalDecision, ClassLevel, ClassRecord,
    LateApprovalRequest, LogEntryId, RecordId, RecordStatus, RecordSubmission, Student,
    StudentId, StudentRegistration, Tutor, TutorId, TutorRegistration,
};
use super::error::PayrollError;
use super::report::{render_csv, ExportDocument, ExportFilter, ExportKind, ReportAggregator};
use super::repository::{ActionLog, HydratedRecord, PayrollStore, RecordFilter};
use super::validation::{RecordValidator, SubmissionPath};
use super::workflow::{apply_decision, apply_late_override};
use crate::config::PayrollPolicy;

/// Per-service counter handing out prefixed, zero-padded ids.
#[derive(Debug, Default)]
struct IdSequence {
    issued: AtomicU64,
}

impl IdSequence {
    fn next(&self, prefix: &str) -> String {
        let id = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}-{id:06}")
    }
}

#[derive(Debug, Default)]
struct IdSequences {
    tutors: IdSequence,
    students: IdSequence,
    records: IdSequence,
    log_entries: IdSequence,
}

fn required_text(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn clean_subjects(subjects: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(subjects.len());
    for subject in subjects {
        let subject = subject.trim();
        if !subject.is_empty() && !cleaned.iter().any(|seen| seen == subject) {
            cleaned.push(subject.to_string());
        }
    }
    cleaned
}

/// Service composing the record store, validator, workflow, and exports.
pub struct PayrollService<S, L> {
    store: Arc<S>,
    action_log: Arc<L>,
    validator: RecordValidator,
    aggregator: ReportAggregator,
    policy: PayrollPolicy,
    ids: IdSequences,
}

impl<S, L> PayrollService<S, L>
where
    S: PayrollStore + 'static,
    L: ActionLog + 'static,
{
    pub fn new(store: Arc<S>, action_log: Arc<L>, policy: PayrollPolicy) -> Self {
        Self {
            store,
            action_log,
            validator: RecordValidator::new(policy),
            aggregator: ReportAggregator::new(policy),
            policy,
            ids: IdSequences::default(),
        }
    }

    pub fn policy(&self) -> &PayrollPolicy {
        &self.policy
    }

    pub fn register_tutor(
        &self,
        registration: TutorRegistration,
        now: DateTime<Utc>,
    ) -> Result<Tutor, PayrollError> {
        let subjects = clean_subjects(registration.subjects);
        let (Some(name), Some(account_number), Some(bank)) = (
            required_text(registration.name),
            required_text(registration.account_number),
            required_text(registration.bank),
        ) else {
            return Err(PayrollError::validation("Missing required fields"));
        };
        if subjects.is_empty() {
            return Err(PayrollError::validation(
                "Tutor must teach at least one subject",
            ));
        }

        let tutor = self.store.insert_tutor(Tutor {
            id: TutorId(self.ids.tutors.next("tut")),
            name,
            account_number,
            bank,
            subjects,
            created_at: now,
        })?;
        info!(tutor_id = %tutor.id, "tutor registered");
        Ok(tutor)
    }

    pub fn list_tutors(&self) -> Result<Vec<Tutor>, PayrollError> {
        Ok(self.store.list_tutors()?)
    }

    pub fn register_student(
        &self,
        registration: StudentRegistration,
        now: DateTime<Utc>,
    ) -> Result<Student, PayrollError> {
        let (Some(name), Some(class_level)) = (
            required_text(registration.name),
            required_text(registration.class_level),
        ) else {
            return Err(PayrollError::validation("Missing required fields"));
        };
        let Some(level) = ClassLevel::parse(&class_level) else {
            return Err(PayrollError::validation(format!(
                "Unknown class level '{class_level}', expected Nursery or Year 1 to Year 12"
            )));
        };

        let student = self.store.insert_student(Student {
            id: StudentId(self.ids.students.next("stu")),
            name,
            class_level: level.to_string(),
            enrolled_subjects: clean_subjects(registration.enrolled_subjects),
            created_at: now,
        })?;
        info!(student_id = %student.id, "student registered");
        Ok(student)
    }

    pub fn list_students(&self) -> Result<Vec<Student>, PayrollError> {
        Ok(self.store.list_students()?)
    }

    /// Tutors teaching at least one of `subjects`, ordered by name.
    pub fn suggest_tutors(&self, subjects: &[String]) -> Result<Vec<Tutor>, PayrollError> {
        let wanted = clean_subjects(subjects.to_vec());
        if wanted.is_empty() {
            return Err(PayrollError::validation(
                "subjects must be a non-empty array",
            ));
        }

        Ok(self
            .store
            .list_tutors()?
            .into_iter()
            .filter(|tutor| wanted.iter().any(|subject| tutor.teaches(subject)))
            .collect())
    }

    /// Same-day submission; the record is stored as `Valid`.
    pub fn submit_record(
        &self,
        submission: RecordSubmission,
        now: DateTime<Utc>,
    ) -> Result<ClassRecord, PayrollError> {
        let submission = RecordSubmission {
            reason: None,
            ..submission
        };
        let validated = self.validator.validate(
            self.store.as_ref(),
            submission,
            SubmissionPath::SameDay,
            now,
            None,
        )?;
        let record = validated.into_record(RecordId(self.ids.records.next("rec")), now);
        let stored = self.store.insert_record(record)?;
        info!(
            record_id = %stored.id,
            tutor_id = %stored.tutor_id,
            payment = stored.payment_amount,
            "class record created"
        );
        Ok(stored)
    }

    /// Late submission; the record waits in `PendingApproval` with its reason.
    pub fn submit_late_record(
        &self,
        submission: RecordSubmission,
        now: DateTime<Utc>,
    ) -> Result<ClassRecord, PayrollError> {
        let validated = self.validator.validate(
            self.store.as_ref(),
            submission,
            SubmissionPath::Late,
            now,
            None,
        )?;
        let record = validated.into_record(RecordId(self.ids.records.next("rec")), now);
        let stored = self.store.insert_record(record)?;
        info!(
            record_id = %stored.id,
            tutor_id = %stored.tutor_id,
            "late class record queued for approval"
        );
        Ok(stored)
    }

    pub fn list_records(&self, filter: &RecordFilter) -> Result<Vec<HydratedRecord>, PayrollError> {
        Ok(self.store.find_hydrated(filter)?)
    }

    pub fn pending_records(&self) -> Result<Vec<HydratedRecord>, PayrollError> {
        self.list_records(&RecordFilter::with_status(RecordStatus::PendingApproval))
    }

    pub fn get_record(&self, record_id: &RecordId) -> Result<ClassRecord, PayrollError> {
        self.store
            .fetch_record(record_id)?
            .ok_or_else(|| PayrollError::NotFound("Record not found".to_string()))
    }

    /// Approve or reject a pending late submission.
    pub fn decide_approval(
        &self,
        record_id: &RecordId,
        decision: ApprovalDecision,
        now: DateTime<Utc>,
    ) -> Result<ClassRecord, PayrollError> {
        let mut record = self.get_record(record_id)?;
        let read_status = record.status;
        let admin_id = decision.admin_id.unwrap_or_default();
        apply_decision(&mut record, decision.approved, &admin_id, now)?;
        self.store.update_record(record.clone(), read_status)?;
        info!(
            record_id = %record.id,
            status = record.status.label(),
            "approval decision recorded"
        );
        Ok(record)
    }

    /// Administrative override to `LateApproved`, recorded in the action log.
    pub fn late_approve(
        &self,
        record_id: &RecordId,
        request: LateApprovalRequest,
        now: DateTime<Utc>,
    ) -> Result<ClassRecord, PayrollError> {
        let admin_name = required_text(request.admin_name)
            .ok_or_else(|| PayrollError::validation("admin_name is required"))?;
        let previous = self.get_record(record_id)?;
        let mut record = previous.clone();
        apply_late_override(&mut record, &admin_name, now)?;
        self.store.update_record(record.clone(), previous.status)?;

        let entry = AdminActionLog {
            id: LogEntryId(self.ids.log_entries.next("log")),
            admin_name,
            tutor_id: Some(record.tutor_id.clone()),
            record_id: Some(record.id.clone()),
            action: AdminActionKind::LateRecordOverride,
            notes: required_text(request.notes),
            created_at: now,
        };
        if let Err(err) = self.action_log.append(entry) {
            warn!(
                record_id = %record.id,
                error = %err,
                "action log append failed, reverting override"
            );
            if let Err(revert) = self
                .store
                .update_record(previous, RecordStatus::LateApproved)
            {
                warn!(
                    record_id = %record.id,
                    error = %revert,
                    "late approval could not be reverted"
                );
            }
            return Err(err.into());
        }
        info!(record_id = %record.id, "late approval override applied");
        Ok(record)
    }

    /// Replace the lesson details of a stored record and recompute its payment.
    pub fn update_record(
        &self,
        record_id: &RecordId,
        submission: RecordSubmission,
        now: DateTime<Utc>,
    ) -> Result<ClassRecord, PayrollError> {
        let mut record = self.get_record(record_id)?;
        let validated = self.validator.validate(
            self.store.as_ref(),
            submission,
            SubmissionPath::Amendment,
            now,
            Some(record_id),
        )?;
        let read_status = record.status;
        validated.amend(&mut record);
        self.store.update_record(record.clone(), read_status)?;
        info!(record_id = %record.id, "class record updated");
        Ok(record)
    }

    pub fn delete_record(&self, record_id: &RecordId) -> Result<(), PayrollError> {
        if !self.store.delete_record(record_id)? {
            return Err(PayrollError::NotFound("Record not found".to_string()));
        }
        info!(%record_id, "class record deleted");
        Ok(())
    }

    pub fn bulk_delete(&self, ids: &[RecordId]) -> Result<usize, PayrollError> {
        if ids.is_empty() {
            return Err(PayrollError::validation(
                "No records specified for deletion",
            ));
        }
        let deleted = self.store.delete_records(ids)?;
        info!(requested = ids.len(), deleted, "bulk delete completed");
        Ok(deleted)
    }

    pub fn action_log(&self) -> Result<Vec<AdminActionLog>, PayrollError> {
        Ok(self.action_log.entries()?)
    }

    /// Aggregate the filtered records and render the chosen CSV layout.
    pub fn export(
        &self,
        kind: ExportKind,
        filter: &ExportFilter,
    ) -> Result<ExportDocument, PayrollError> {
        let record_filter = filter.record_filter(kind.date_field(), &self.policy)?;
        let records = self.store.find_hydrated(&record_filter)?;

        let (rows, csv) = match kind {
            ExportKind::ByTutor => {
                let rows = self.aggregator.by_tutor(&records);
                (rows.len(), render_csv(&rows)?)
            }
            ExportKind::ByStudent => {
                let rows = self.aggregator.by_student(&records);
                (rows.len(), render_csv(&rows)?)
            }
            ExportKind::ByTutorByMonth => {
                let rows = self.aggregator.by_tutor_by_month(&records);
                (rows.len(), render_csv(&rows)?)
            }
        };

        info!(
            export = kind.filename(),
            records = records.len(),
            rows,
            "payroll export generated"
        );
        Ok(ExportDocument {
            kind,
            filename: kind.filename(),
            rows,
            csv,
        })
    }
}
