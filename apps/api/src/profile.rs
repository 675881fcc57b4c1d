//! Student profile endpoints. Updates are gated on re-entering the current
//! password; password changes additionally enforce the minimum length.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::user::{User, UserPatch, MIN_PASSWORD_CHARS};
use crate::state::AppState;

/// GET /api/v1/students/:student_id
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
) -> Result<Json<User>, AppError> {
    let user = state.store.get_user_by_student_id(&student_id).await?;
    Ok(Json(user))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Current password, re-entered to confirm the change.
    pub password_confirm: String,
}

/// PATCH /api/v1/students/:student_id
pub async fn handle_update_profile(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Json(req): Json<ProfileUpdateRequest>,
) -> Result<Json<User>, AppError> {
    let user = state.store.get_user_by_student_id(&student_id).await?;
    check_password_confirm(user.password.as_deref(), &req.password_confirm)?;

    let patch = UserPatch {
        username: req.username,
        full_name: req.full_name,
        student_id: req.student_id,
        email: req.email,
        ..UserPatch::default()
    };
    let updated = state.store.update_user(user.id, &patch).await?;
    info!("student {student_id} updated profile");
    Ok(Json(updated))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChangeRequest {
    pub old_password: String,
    pub new_password: String,
    pub confirm_new_password: String,
}

/// POST /api/v1/students/:student_id/password
pub async fn handle_change_password(
    State(state): State<AppState>,
    Path(student_id): Path<String>,
    Json(req): Json<PasswordChangeRequest>,
) -> Result<StatusCode, AppError> {
    validate_password_change(&req.new_password, &req.confirm_new_password)?;

    let user = state.store.get_user_by_student_id(&student_id).await?;
    check_password_confirm(user.password.as_deref(), &req.old_password)?;

    let patch = UserPatch {
        password: Some(req.new_password),
        ..UserPatch::default()
    };
    state.store.update_user(user.id, &patch).await?;
    info!("student {student_id} changed password");
    Ok(StatusCode::NO_CONTENT)
}

fn check_password_confirm(current: Option<&str>, entered: &str) -> Result<(), AppError> {
    if current != Some(entered) {
        return Err(AppError::Validation(
            "Current password is incorrect".to_string(),
        ));
    }
    Ok(())
}

fn validate_password_change(new_password: &str, confirm: &str) -> Result<(), AppError> {
    if new_password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AppError::Validation(format!(
            "New password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    if new_password != confirm {
        return Err(AppError::Validation(
            "New password and confirmation do not match".to_string(),
        ));
    }
    Ok(())
}
