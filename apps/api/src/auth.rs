//! Login endpoint. Credentials live in the `users` table and are checked
//! by plain column equality; the response is a session object the client
//! keeps, with no token machinery.

use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::user::UserSession;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    /// Username, email, or student id.
    pub identifier: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "student".to_string()
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<UserSession>, AppError> {
    let identifier = req.identifier.trim().to_lowercase();
    if identifier.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Identifier and password are required".to_string(),
        ));
    }

    let user = state
        .store
        .find_login_user(&identifier, &req.password, &req.role)
        .await?
        .ok_or(AppError::Unauthorized)?;

    info!("login: {identifier} ({})", req.role);
    Ok(Json(UserSession::from(&user)))
}
