//! Class record intake, payment calculation, approval workflow, and payroll exports.

pub mod auth;
pub mod calendar;
pub mod domain;
pub mod error;
pub mod memory;
pub mod rates;
pub mod report;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;
pub mod workflow;

#[cfg(test)]
mod tests;

pub use auth::{CredentialVerifier, SharedSecretVerifier};
pub use domain::{
    AdminActionKind, AdminActionLog, ApprovalDecision, ApprovalRequest, ClassLevel, ClassRecord,
    LateApproval, LateApprovalRequest, LessonSlot, RecordId, RecordStatus, RecordSubmission,
    Student, StudentId, StudentRegistration, Tutor, TutorId, TutorRegistration,
};
pub use error::PayrollError;
pub use memory::{MemoryActionLog, MemoryStore};
pub use rates::{compute_payment, quote_payment, rate_for, RateTier};
pub use report::{ExportDocument, ExportFilter, ExportKind};
pub use repository::{
    ActionLog, DateField, DateWindow, HydratedRecord, PayrollStore, RecordFilter, RepositoryError,
};
pub use router::payroll_router;
pub use service::PayrollService;
