use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::validation::validate_source;
use crate::models::transfer::{
    transfer_key, MatchCandidate, SourceCourse, TargetCourse, TransferLog, TransferLogEntry,
};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CompareRequest {
    #[serde(flatten)]
    pub source: SourceCourse,
    /// When present, candidates are annotated against this student's
    /// existing transfer log.
    #[serde(default, rename = "studentId")]
    pub student_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateView {
    #[serde(flatten)]
    pub candidate: MatchCandidate,
    pub log_key: String,
    pub is_approved: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareResponse {
    pub request_id: Uuid,
    pub candidates: Vec<CandidateView>,
}

/// POST /api/v1/match/compare
pub async fn handle_compare(
    State(state): State<AppState>,
    Json(req): Json<CompareRequest>,
) -> Result<Json<CompareResponse>, AppError> {
    // Gate the input before the catalog round-trip.
    validate_source(&req.source)?;

    let request_id = Uuid::new_v4();
    let courses = state.store.list_courses().await?;
    let targets: Vec<TargetCourse> = courses.iter().map(TargetCourse::from).collect();

    let candidates = state
        .orchestrator
        .compare_courses(&req.source, &targets)
        .await?;

    let log = match &req.student_id {
        Some(student_id) => state.store.get_transfer_log(student_id).await?,
        None => TransferLog::new(),
    };
    let candidates = candidates
        .into_iter()
        .map(|candidate| {
            let log_key =
                transfer_key(&candidate.target_course_code, &candidate.matched_course_code);
            let is_approved = log.contains_key(&log_key);
            CandidateView {
                candidate,
                log_key,
                is_approved,
            }
        })
        .collect();

    Ok(Json(CompareResponse {
        request_id,
        candidates,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    pub student_id: String,
    pub candidate: MatchCandidate,
    pub source: SourceCourse,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveResponse {
    pub log_key: String,
    pub entry: TransferLogEntry,
}

/// POST /api/v1/match/approve
pub async fn handle_approve(
    State(state): State<AppState>,
    Json(req): Json<ApproveRequest>,
) -> Result<Json<ApproveResponse>, AppError> {
    if req.student_id.trim().is_empty() {
        return Err(AppError::Validation("studentId is required".to_string()));
    }
    let (log_key, entry) = state
        .orchestrator
        .approve_match(&req.student_id, &req.candidate, &req.source)
        .await?;
    Ok(Json(ApproveResponse { log_key, entry }))
}

#[derive(Deserialize)]
pub struct TransferListQuery {
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Serialize)]
pub struct TransferListItem {
    pub key: String,
    #[serde(flatten)]
    pub entry: TransferLogEntry,
}

/// GET /api/v1/students/:student_id/transfers
pub async fn handle_list_transfers(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Query(params): Query<TransferListQuery>,
) -> Result<Json<Vec<TransferListItem>>, AppError> {
    let log = state.store.get_transfer_log(&student_id).await?;
    Ok(Json(list_entries(log, params.q.as_deref())))
}

/// DELETE /api/v1/students/:student_id/transfers/:key
pub async fn handle_delete_transfer(
    State(state): State<AppState>,
    Path((student_id, key)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    state
        .orchestrator
        .delete_transfer_entry(&student_id, &key)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Newest first, optionally filtered by a case-insensitive term over the
/// course codes and names.
fn list_entries(log: TransferLog, term: Option<&str>) -> Vec<TransferListItem> {
    let mut items: Vec<TransferListItem> = log
        .into_iter()
        .filter(|(_, entry)| matches_term(entry, term))
        .map(|(key, entry)| TransferListItem { key, entry })
        .collect();
    items.sort_by(|a, b| b.entry.timestamp.cmp(&a.entry.timestamp));
    items
}

fn matches_term(entry: &TransferLogEntry, term: Option<&str>) -> bool {
    let term = match term {
        Some(t) if !t.trim().is_empty() => t.trim().to_lowercase(),
        _ => return true,
    };
    [
        &entry.source,
        &entry.source_course_name,
        &entry.target,
        &entry.target_course_name,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(&term))
}
