use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use super::auth::{presented_credential, CredentialVerifier};
use super::calendar::parse_date;
use super::domain::{
    AdminActionLog, ApprovalDecision, ClassRecord, LateApprovalRequest, RecordId, RecordStatus,
    RecordSubmission, Student, StudentRegistration, Tutor, TutorId, TutorRegistration,
};
use super::error::PayrollError;
use super::report::{ExportFilter, ExportKind};
use super::repository::{ActionLog, DateField, HydratedRecord, PayrollStore};
use super::service::PayrollService;

/// Shared handler state: the service plus the admin credential check.
pub struct PayrollState<S, L> {
    pub service: Arc<PayrollService<S, L>>,
    pub verifier: Arc<dyn CredentialVerifier>,
}

impl<S, L> Clone for PayrollState<S, L> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            verifier: Arc::clone(&self.verifier),
        }
    }
}

/// Router builder exposing the tutor, student, class record, and admin endpoints.
pub fn payroll_router<S, L>(
    service: Arc<PayrollService<S, L>>,
    verifier: Arc<dyn CredentialVerifier>,
) -> Router
where
    S: PayrollStore + 'static,
    L: ActionLog + 'static,
{
    let state = PayrollState { service, verifier };

    let admin = Router::new()
        .route(
            "/api/class-records/:record_id/approve",
            patch(approve_handler::<S, L>),
        )
        .route("/api/admin/export", get(export_by_tutor_handler::<S, L>))
        .route(
            "/api/admin/export-student-summary",
            get(export_by_student_handler::<S, L>),
        )
        .route(
            "/api/admin/export-monthly",
            get(export_monthly_handler::<S, L>),
        )
        .route(
            "/api/admin/late-approve/:record_id",
            post(late_approve_handler::<S, L>),
        )
        .route("/api/admin/tutors", get(list_tutors_handler::<S, L>))
        .route("/api/admin/actions", get(action_log_handler::<S, L>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_admin::<S, L>,
        ));

    Router::new()
        .route(
            "/api/tutors",
            post(register_tutor_handler::<S, L>).get(list_tutors_handler::<S, L>),
        )
        .route(
            "/api/students",
            post(register_student_handler::<S, L>).get(list_students_handler::<S, L>),
        )
        .route(
            "/api/students/suggest-tutors",
            post(suggest_tutors_handler::<S, L>),
        )
        .route(
            "/api/class-records",
            post(submit_handler::<S, L>).get(list_records_handler::<S, L>),
        )
        .route(
            "/api/class-records/late-submission",
            post(late_submission_handler::<S, L>),
        )
        .route(
            "/api/class-records/pending",
            get(pending_records_handler::<S, L>),
        )
        .route(
            "/api/class-records/bulk-delete",
            axum::routing::delete(bulk_delete_handler::<S, L>),
        )
        .route(
            "/api/class-records/:record_id",
            put(update_record_handler::<S, L>).delete(delete_record_handler::<S, L>),
        )
        .merge(admin)
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
struct AdminCredentialQuery {
    #[serde(rename = "adminPassword")]
    admin_password: Option<String>,
}

pub(crate) async fn require_admin<S, L>(
    State(state): State<PayrollState<S, L>>,
    request: Request,
    next: Next,
) -> Response
where
    S: PayrollStore + 'static,
    L: ActionLog + 'static,
{
    let from_query = Query::<AdminCredentialQuery>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(query)| query.admin_password);
    let presented = presented_credential(request.headers(), from_query.as_deref());

    match presented {
        Some(credential) if state.verifier.verify(&credential) => next.run(request).await,
        _ => {
            warn!(path = %request.uri().path(), "rejected admin request");
            PayrollError::Unauthorized.into_response()
        }
    }
}

/// Optional narrowing accepted by the record listing and export endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct RecordQuery {
    #[serde(default, alias = "tutorId")]
    pub tutor_id: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

impl RecordQuery {
    pub fn export_filter(&self) -> Result<ExportFilter, PayrollError> {
        let date = |raw: &Option<String>| {
            raw.as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(|value| parse_date(value).map_err(PayrollError::Validation))
                .transpose()
        };
        Ok(ExportFilter {
            tutor_id: self
                .tutor_id
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(|value| TutorId(value.to_string())),
            from: date(&self.from)?,
            to: date(&self.to)?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SubmissionReceipt {
    pub message: &'static str,
    pub record_id: RecordId,
    pub status: RecordStatus,
    pub payment_amount: u64,
}

#[derive(Debug, Default, Deserialize)]
struct SuggestTutorsRequest {
    #[serde(default)]
    subjects: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BulkDeleteRequest {
    #[serde(default)]
    ids: Vec<String>,
}

type Service<S, L> = State<PayrollState<S, L>>;

pub(crate) async fn register_tutor_handler<S, L>(
    State(state): Service<S, L>,
    Json(registration): Json<TutorRegistration>,
) -> Result<(StatusCode, Json<Tutor>), PayrollError>
where
    S: PayrollStore + 'static,
    L: ActionLog + 'static,
{
    let tutor = state.service.register_tutor(registration, Utc::now())?;
    Ok((StatusCode::CREATED, Json(tutor)))
}

pub(crate) async fn list_tutors_handler<S, L>(
    State(state): Service<S, L>,
) -> Result<Json<Vec<Tutor>>, PayrollError>
where
    S: PayrollStore + 'static,
    L: ActionLog + 'static,
{
    Ok(Json(state.service.list_tutors()?))
}

pub(crate) async fn register_student_handler<S, L>(
    State(state): Service<S, L>,
    Json(registration): Json<StudentRegistration>,
) -> Result<(StatusCode, Json<Student>), PayrollError>
where
    S: PayrollStore + 'static,
    L: ActionLog + 'static,
{
    let student = state.service.register_student(registration, Utc::now())?;
    Ok((StatusCode::CREATED, Json(student)))
}

pub(crate) async fn list_students_handler<S, L>(
    State(state): Service<S, L>,
) -> Result<Json<Vec<Student>>, PayrollError>
where
    S: PayrollStore + 'static,
    L: ActionLog + 'static,
{
    Ok(Json(state.service.list_students()?))
}

async fn suggest_tutors_handler<S, L>(
    State(state): Service<S, L>,
    Json(request): Json<SuggestTutorsRequest>,
) -> Result<Json<Vec<Tutor>>, PayrollError>
where
    S: PayrollStore + 'static,
    L: ActionLog + 'static,
{
    Ok(Json(state.service.suggest_tutors(&request.subjects)?))
}

pub(crate) async fn submit_handler<S, L>(
    State(state): Service<S, L>,
    Json(submission): Json<RecordSubmission>,
) -> Result<(StatusCode, Json<SubmissionReceipt>), PayrollError>
where
    S: PayrollStore + 'static,
    L: ActionLog + 'static,
{
    let record = state.service.submit_record(submission, Utc::now())?;
    Ok((
        StatusCode::CREATED,
        Json(SubmissionReceipt {
            message: "Class record created successfully",
            record_id: record.id,
            status: record.status,
            payment_amount: record.payment_amount,
        }),
    ))
}

pub(crate) async fn late_submission_handler<S, L>(
    State(state): Service<S, L>,
    Json(submission): Json<RecordSubmission>,
) -> Result<(StatusCode, Json<SubmissionReceipt>), PayrollError>
where
    S: PayrollStore + 'static,
    L: ActionLog + 'static,
{
    let record = state.service.submit_late_record(submission, Utc::now())?;
    Ok((
        StatusCode::CREATED,
        Json(SubmissionReceipt {
            message: "Late class record submitted successfully. Awaiting admin approval.",
            record_id: record.id,
            status: record.status,
            payment_amount: record.payment_amount,
        }),
    ))
}

pub(crate) async fn list_records_handler<S, L>(
    State(state): Service<S, L>,
    Query(query): Query<RecordQuery>,
) -> Result<Json<Vec<HydratedRecord>>, PayrollError>
where
    S: PayrollStore + 'static,
    L: ActionLog + 'static,
{
    let filter = query
        .export_filter()?
        .record_filter(DateField::Submitted, state.service.policy())?;
    Ok(Json(state.service.list_records(&filter)?))
}

async fn pending_records_handler<S, L>(
    State(state): Service<S, L>,
) -> Result<Json<Vec<HydratedRecord>>, PayrollError>
where
    S: PayrollStore + 'static,
    L: ActionLog + 'static,
{
    Ok(Json(state.service.pending_records()?))
}

async fn bulk_delete_handler<S, L>(
    State(state): Service<S, L>,
    Json(request): Json<BulkDeleteRequest>,
) -> Result<Json<Value>, PayrollError>
where
    S: PayrollStore + 'static,
    L: ActionLog + 'static,
{
    let ids: Vec<RecordId> = request.ids.into_iter().map(RecordId).collect();
    let deleted = state.service.bulk_delete(&ids)?;
    Ok(Json(json!({
        "message": format!("{deleted} records deleted successfully"),
        "deleted": deleted,
    })))
}

async fn update_record_handler<S, L>(
    State(state): Service<S, L>,
    Path(record_id): Path<String>,
    Json(submission): Json<RecordSubmission>,
) -> Result<Json<ClassRecord>, PayrollError>
where
    S: PayrollStore + 'static,
    L: ActionLog + 'static,
{
    let record = state
        .service
        .update_record(&RecordId(record_id), submission, Utc::now())?;
    Ok(Json(record))
}

pub(crate) async fn delete_record_handler<S, L>(
    State(state): Service<S, L>,
    Path(record_id): Path<String>,
) -> Result<Json<Value>, PayrollError>
where
    S: PayrollStore + 'static,
    L: ActionLog + 'static,
{
    state.service.delete_record(&RecordId(record_id))?;
    Ok(Json(json!({ "message": "Record deleted successfully" })))
}

pub(crate) async fn approve_handler<S, L>(
    State(state): Service<S, L>,
    Path(record_id): Path<String>,
    Json(decision): Json<ApprovalDecision>,
) -> Result<Json<ClassRecord>, PayrollError>
where
    S: PayrollStore + 'static,
    L: ActionLog + 'static,
{
    let record = state
        .service
        .decide_approval(&RecordId(record_id), decision, Utc::now())?;
    Ok(Json(record))
}

pub(crate) async fn late_approve_handler<S, L>(
    State(state): Service<S, L>,
    Path(record_id): Path<String>,
    Json(request): Json<LateApprovalRequest>,
) -> Result<Json<Value>, PayrollError>
where
    S: PayrollStore + 'static,
    L: ActionLog + 'static,
{
    let record = state
        .service
        .late_approve(&RecordId(record_id), request, Utc::now())?;
    Ok(Json(json!({
        "message": "Late submission approved. Tutor can re-submit record.",
        "record": record,
    })))
}

async fn action_log_handler<S, L>(
    State(state): Service<S, L>,
) -> Result<Json<Vec<AdminActionLog>>, PayrollError>
where
    S: PayrollStore + 'static,
    L: ActionLog + 'static,
{
    Ok(Json(state.service.action_log()?))
}

fn export_response<S, L>(
    state: &PayrollState<S, L>,
    kind: ExportKind,
    query: &RecordQuery,
) -> Result<Response, PayrollError>
where
    S: PayrollStore + 'static,
    L: ActionLog + 'static,
{
    let document = state.service.export(kind, &query.export_filter()?)?;
    let disposition = format!("attachment; filename=\"{}\"", document.filename);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.csv,
    )
        .into_response())
}

pub(crate) async fn export_by_tutor_handler<S, L>(
    State(state): Service<S, L>,
    Query(query): Query<RecordQuery>,
) -> Result<Response, PayrollError>
where
    S: PayrollStore + 'static,
    L: ActionLog + 'static,
{
    export_response(&state, ExportKind::ByTutor, &query)
}

async fn export_by_student_handler<S, L>(
    State(state): Service<S, L>,
    Query(query): Query<RecordQuery>,
) -> Result<Response, PayrollError>
where
    S: PayrollStore + 'static,
    L: ActionLog + 'static,
{
    export_response(&state, ExportKind::ByStudent, &query)
}

async fn export_monthly_handler<S, L>(
    State(state): Service<S, L>,
    Query(query): Query<RecordQuery>,
) -> Result<Response, PayrollError>
where
    S: PayrollStore + 'static,
    L: ActionLog + 'static,
{
    export_response(&state, ExportKind::ByTutorByMonth, &query)
}
