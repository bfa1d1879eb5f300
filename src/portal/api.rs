use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Local;
use tracing::{info, warn};
use uuid::Uuid;

use super::db::DbHandle;
#[cfg(test)]
use super::db::PortalDb;
use super::models::*;
use crate::config::Theme;
use crate::errors::{FlowError, PortalError, ValidationError};
use crate::export::{RowSink, fill_plan, sheet_row};
use crate::flow::{FlowPosition, OnboardingFlow, find_step};
use crate::record::ApplicantRecord;
use crate::steps::{StepCatalog, StepId};
use crate::validator::Validator;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub db: DbHandle,
    pub catalog: StepCatalog,
    pub validator: Validator,
    pub theme: Theme,
    pub row_sink: Arc<dyn RowSink>,
}

pub type SharedState = Arc<AppState>;

// ── Error handling ────────────────────────────────────────────────────

pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Invalid(ValidationError),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, serde_json::json!({"error": msg})),
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({"error": msg}))
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, serde_json::json!({"error": msg})),
            ApiError::Invalid(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                serde_json::json!({
                    "error": err.to_string(),
                    "field": err.field(),
                    "code": err.code(),
                }),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({"error": msg}),
            ),
        };
        (status, Json(body)).into_response()
    }
}

impl From<FlowError> for ApiError {
    fn from(err: FlowError) -> Self {
        match err {
            FlowError::Validation(inner) => ApiError::Invalid(inner),
            FlowError::AlreadyComplete => ApiError::Conflict(err.to_string()),
            FlowError::UnknownStep(_) => ApiError::NotFound(err.to_string()),
        }
    }
}

impl From<PortalError> for ApiError {
    fn from(err: PortalError) -> Self {
        match err {
            PortalError::ApplicantNotFound { .. } => ApiError::NotFound(err.to_string()),
            PortalError::BadRequest(msg) => ApiError::BadRequest(msg),
            PortalError::Flow(inner) => inner.into(),
            PortalError::Database(_) | PortalError::Other(_) => ApiError::Internal(err.to_string()),
        }
    }
}

fn db_error(e: anyhow::Error) -> ApiError {
    PortalError::Database(e).into()
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/ui", get(get_ui))
        .route("/api/steps", get(list_steps))
        .route("/api/applicants", get(list_applicants).post(create_applicant))
        .route("/api/applicants/{id}", get(get_applicant))
        .route("/api/applicants/{id}/current", get(current_step))
        .route("/api/applicants/{id}/validate", post(validate_step))
        .route("/api/applicants/{id}/advance", post(advance))
        .route("/api/applicants/{id}/retreat", post(retreat))
        .route("/api/applicants/{id}/export/sheet", get(export_sheet))
        .route("/api/applicants/{id}/export/pdf/{step}", get(export_pdf))
        .route("/health", get(health_check))
}

// ── Helpers ───────────────────────────────────────────────────────────

async fn load_applicant(state: &SharedState, id: &str) -> Result<Applicant, ApiError> {
    let lookup = id.to_string();
    state
        .db
        .call(move |db| db.get_applicant(&lookup))
        .await
        .map_err(db_error)?
        .ok_or_else(|| PortalError::ApplicantNotFound { id: id.to_string() }.into())
}

async fn save_progress(
    state: &SharedState,
    id: String,
    step_index: usize,
    record: ApplicantRecord,
) -> Result<Applicant, ApiError> {
    let status = if step_index >= state.catalog.len() {
        ApplicantStatus::Complete
    } else {
        ApplicantStatus::InProgress
    };
    let missing = id.clone();
    state
        .db
        .call(move |db| db.save_progress(&id, step_index, status, &record))
        .await
        .map_err(db_error)?
        .ok_or_else(|| PortalError::ApplicantNotFound { id: missing }.into())
}

fn session(state: &AppState, applicant: Applicant) -> ApplicantSession {
    let flow = OnboardingFlow::resume(
        &state.catalog,
        &state.validator,
        applicant.step_index,
        ApplicantRecord::new(),
    );
    ApplicantSession {
        id: applicant.id,
        position: flow.position(),
        step_index: flow.index(),
        total_steps: state.catalog.len(),
        record: applicant.record,
        created_at: applicant.created_at,
        updated_at: applicant.updated_at,
    }
}

/// Hand the finished applicant's row to the sink without waiting on it.
fn append_sheet_row(state: &SharedState, id: &str, record: &ApplicantRecord) {
    let row = sheet_row(&state.catalog, record);
    let sink = state.row_sink.clone();
    let id = id.to_string();
    tokio::task::spawn_blocking(move || {
        if let Err(e) = sink.append(&id, &row) {
            warn!(applicant_id = %id, error = %e, "Failed to append sheet row");
        }
    });
}

// ── Handlers ──────────────────────────────────────────────────────────

async fn health_check() -> &'static str {
    "ok"
}

async fn get_ui(State(state): State<SharedState>) -> impl IntoResponse {
    Json(serde_json::json!({"theme": state.theme}))
}

async fn list_steps(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.catalog.clone())
}

async fn create_applicant(
    State(state): State<SharedState>,
    Json(req): Json<CreateApplicantRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Step sub-records are only written by a validated advance.
    if let Some(key) = req
        .fields
        .keys()
        .find(|key| StepId::from_record_key(key).is_some())
    {
        return Err(ApiError::BadRequest(format!(
            "Seed field '{}' is a step record; submit it through the step instead",
            key
        )));
    }

    let id = Uuid::new_v4().to_string();
    let record = ApplicantRecord::with_shared(req.fields);

    let new_id = id.clone();
    let applicant = state
        .db
        .call(move |db| db.create_applicant(&new_id, &record))
        .await
        .map_err(db_error)?;

    info!(applicant_id = %id, "Applicant created");
    Ok((StatusCode::CREATED, Json(session(&state, applicant))))
}

async fn list_applicants(State(state): State<SharedState>) -> Result<impl IntoResponse, ApiError> {
    let applicants = state
        .db
        .call(|db| db.list_applicants())
        .await
        .map_err(db_error)?;

    let summaries: Vec<ApplicantSummary> = applicants
        .into_iter()
        .map(|a| ApplicantSummary {
            full_name: a
                .record
                .shared_value("fullName")
                .map(crate::record::display_value)
                .unwrap_or_default(),
            id: a.id,
            status: a.status,
            step_index: a.step_index,
            updated_at: a.updated_at,
        })
        .collect();
    Ok(Json(summaries))
}

async fn get_applicant(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let applicant = load_applicant(&state, &id).await?;
    Ok(Json(session(&state, applicant)))
}

async fn current_step(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let applicant = load_applicant(&state, &id).await?;
    let flow = OnboardingFlow::resume(
        &state.catalog,
        &state.validator,
        applicant.step_index,
        applicant.record,
    );

    let prefill = flow.prefill();
    let advisories = match (flow.current_step(), &prefill) {
        (Some(step), Some(fields)) => {
            state
                .validator
                .advisories(step, fields, Local::now().date_naive())
        }
        _ => Vec::new(),
    };

    Ok(Json(CurrentStepView {
        position: flow.position(),
        step: flow.current_step().cloned(),
        prefill,
        advisories,
    }))
}

async fn validate_step(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<StepFieldsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let applicant = load_applicant(&state, &id).await?;
    let flow = OnboardingFlow::resume(
        &state.catalog,
        &state.validator,
        applicant.step_index,
        applicant.record,
    );
    let step = flow.current_step().ok_or(FlowError::AlreadyComplete)?;

    let error = match flow.validate(&req.fields) {
        Ok(()) => None,
        Err(FlowError::Validation(err)) => Some(FieldIssue {
            field: err.field().to_string(),
            code: err.code().to_string(),
            message: err.to_string(),
        }),
        Err(other) => return Err(other.into()),
    };
    let advisories = state
        .validator
        .advisories(step, &req.fields, Local::now().date_naive());

    Ok(Json(ValidationReport {
        ok: error.is_none(),
        error,
        advisories,
    }))
}

async fn advance(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<StepFieldsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let applicant = load_applicant(&state, &id).await?;
    let mut flow = OnboardingFlow::resume(
        &state.catalog,
        &state.validator,
        applicant.step_index,
        applicant.record,
    );

    let position = flow.advance(req.fields)?;
    let (index, record) = flow.into_parts();
    let saved = save_progress(&state, id, index, record).await?;

    if position == FlowPosition::Complete {
        info!(applicant_id = %saved.id, "Onboarding complete");
        append_sheet_row(&state, &saved.id, &saved.record);
    }

    Ok(Json(session(&state, saved)))
}

async fn retreat(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let applicant = load_applicant(&state, &id).await?;
    let mut flow = OnboardingFlow::resume(
        &state.catalog,
        &state.validator,
        applicant.step_index,
        applicant.record,
    );

    flow.retreat();
    let (index, record) = flow.into_parts();
    let saved = save_progress(&state, id, index, record).await?;
    Ok(Json(session(&state, saved)))
}

async fn export_sheet(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let applicant = load_applicant(&state, &id).await?;
    Ok(Json(sheet_row(&state.catalog, &applicant.record)))
}

async fn export_pdf(
    State(state): State<SharedState>,
    Path((id, step)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let step = find_step(&state.catalog, &step)?;
    let applicant = load_applicant(&state, &id).await?;
    Ok(Json(fill_plan(&state.catalog, &applicant.record, step)))
}

// ── Tests ─────────────────────────────────────────────────────────────
