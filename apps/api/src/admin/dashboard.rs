//! Dashboard statistics: row counts per table plus per-student transfer
//! activity read from the stored logs.

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::Value;

use crate::errors::AppError;
use crate::models::user::TransferActivityRow;
use crate::state::AppState;
use crate::store::Table;

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferDetail {
    pub full_name: String,
    pub student_id: String,
    pub transfer_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub user_count: u64,
    pub course_count: u64,
    pub category_count: u64,
    pub subcategory_count: u64,
    pub users_who_transferred_count: usize,
    pub transfer_details: Vec<TransferDetail>,
}

/// GET /api/v1/admin/dashboard
pub async fn handle_dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, AppError> {
    let (user_count, course_count, category_count, subcategory_count, activity) = tokio::try_join!(
        state.store.count_rows(Table::Users),
        state.store.count_rows(Table::Courses),
        state.store.count_rows(Table::Categories),
        state.store.count_rows(Table::Subcategories),
        state.store.list_transfer_activity(),
    )?;
    Ok(Json(build_stats(
        user_count,
        course_count,
        category_count,
        subcategory_count,
        &activity,
    )))
}

/// Number of entries in a stored log value. Text columns holding
/// serialized JSON are tolerated; anything unreadable counts as zero.
fn transfer_count(description: &Option<Value>) -> usize {
    match description {
        Some(Value::Object(map)) => map.len(),
        Some(Value::String(text)) => serde_json::from_str::<serde_json::Map<String, Value>>(text)
            .map(|map| map.len())
            .unwrap_or(0),
        _ => 0,
    }
}

fn build_stats(
    user_count: u64,
    course_count: u64,
    category_count: u64,
    subcategory_count: u64,
    activity: &[TransferActivityRow],
) -> DashboardStats {
    let mut transfer_details: Vec<TransferDetail> = activity
        .iter()
        .filter_map(|row| {
            let count = transfer_count(&row.description);
            (count > 0).then(|| TransferDetail {
                full_name: row
                    .full_name
                    .clone()
                    .unwrap_or_else(|| "ไม่มีชื่อ".to_string()),
                student_id: row
                    .student_id
                    .clone()
                    .unwrap_or_else(|| "ไม่มีรหัส".to_string()),
                transfer_count: count,
            })
        })
        .collect();
    transfer_details.sort_by(|a, b| b.transfer_count.cmp(&a.transfer_count));

    DashboardStats {
        user_count,
        course_count,
        category_count,
        subcategory_count,
        users_who_transferred_count: transfer_details.len(),
        transfer_details,
    }
}
