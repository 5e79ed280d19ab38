//! Record lifecycle state machine.
//!
//! Same-day submissions start as `Valid`; late submissions start as
//! `PendingApproval` and are resolved to `Approved` or `Rejected` by an admin.
//! The late-approve override moves any record to `LateApproved`, except one
//! that already is.

use chrono::{DateTime, Utc};

use super::domain::{ApprovalRequest, ClassRecord, LateApproval, RecordStatus};
use super::error::PayrollError;

/// Events that move a record between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowEvent {
    Decision { approved: bool },
    LateOverride,
}

impl RecordStatus {
    pub fn next(self, event: WorkflowEvent) -> Result<RecordStatus, PayrollError> {
        match (self, event) {
            (RecordStatus::PendingApproval, WorkflowEvent::Decision { approved: true }) => {
                Ok(RecordStatus::Approved)
            }
            (RecordStatus::PendingApproval, WorkflowEvent::Decision { approved: false }) => {
                Ok(RecordStatus::Rejected)
            }
            (_, WorkflowEvent::Decision { .. }) => Err(PayrollError::InvalidState(
                "Record is not pending approval".to_string(),
            )),
            (RecordStatus::LateApproved, WorkflowEvent::LateOverride) => Err(
                PayrollError::InvalidState("Record is already late approved".to_string()),
            ),
            (_, WorkflowEvent::LateOverride) => Ok(RecordStatus::LateApproved),
        }
    }
}

fn required_name(raw: &str, field: &str) -> Result<String, PayrollError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PayrollError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// Resolve a pending late submission.
pub fn apply_decision(
    record: &mut ClassRecord,
    approved: bool,
    admin_id: &str,
    decided_at: DateTime<Utc>,
) -> Result<(), PayrollError> {
    let admin_id = required_name(admin_id, "admin_id")?;
    let next = record.status.next(WorkflowEvent::Decision { approved })?;

    let submitted = record.date_submitted;
    let request = record
        .approval_request
        .get_or_insert_with(|| ApprovalRequest {
            reason: String::new(),
            request_date: submitted,
            approved_by: None,
            approval_date: None,
        });
    request.approved_by = Some(admin_id);
    request.approval_date = Some(decided_at);
    record.status = next;
    Ok(())
}

/// Administrative override to `LateApproved`.
pub fn apply_late_override(
    record: &mut ClassRecord,
    admin_name: &str,
    approved_at: DateTime<Utc>,
) -> Result<(), PayrollError> {
    let approved_by = required_name(admin_name, "admin_name")?;
    record.status = record.status.next(WorkflowEvent::LateOverride)?;
    record.late_approval = Some(LateApproval {
        approved_by,
        approved_at,
    });
    Ok(())
}
