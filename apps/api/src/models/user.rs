//! User records and the login session object. The `users` table predates
//! this service and uses camelCase column names, so every wire type here
//! renames accordingly.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Minimum password length accepted when creating or changing a password.
pub const MIN_PASSWORD_CHARS: usize = 6;

/// A row in the `users` table. The password column is deserialized for
/// credential checks but never serialized back to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// The stored transfer log, kept opaque here. The store parses it into
    /// a typed mapping when the log is actually needed.
    #[serde(default)]
    pub description: Option<Value>,
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
}

/// What a client holds after login: identity fields only, no token
/// machinery. Matches the object the portal has always stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub full_name: Option<String>,
    pub student_id: String,
}

impl From<&User> for UserSession {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            full_name: user.full_name.clone(),
            student_id: user.student_id.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    pub email: String,
    pub role: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Projection used by the dashboard: users carrying a non-empty transfer
/// log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferActivityRow {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub description: Option<Value>,
}
