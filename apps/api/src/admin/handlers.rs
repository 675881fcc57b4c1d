use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::course::{
    Category, CategoryPatch, Course, CoursePatch, NewCategory, NewCourse, NewSubcategory,
    Subcategory, SubcategoryPatch,
};
use crate::models::user::{NewUser, User, UserPatch, MIN_PASSWORD_CHARS};
use crate::state::AppState;

#[derive(Serialize)]
pub struct AdminOverview {
    pub users: Vec<User>,
    pub courses: Vec<Course>,
    pub categories: Vec<Category>,
    pub subcategories: Vec<Subcategory>,
}

/// GET /api/v1/admin/overview
pub async fn handle_overview(
    State(state): State<AppState>,
) -> Result<Json<AdminOverview>, AppError> {
    let (users, courses, categories, subcategories) = tokio::try_join!(
        state.store.list_users(),
        state.store.list_courses(),
        state.store.list_categories(),
        state.store.list_subcategories(),
    )?;
    Ok(Json(AdminOverview {
        users,
        courses,
        categories,
        subcategories,
    }))
}

// ── users ───────────────────────────────────────────────────────────────

/// POST /api/v1/admin/users
pub async fn handle_create_user(
    State(state): State<AppState>,
    Json(req): Json<NewUser>,
) -> Result<Json<User>, AppError> {
    validate_new_user(&req)?;
    let user = state.store.insert_user(&req).await?;
    info!("admin created user {}", user.id);
    Ok(Json(user))
}

/// PATCH /api/v1/admin/users/:id
pub async fn handle_update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UserPatch>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.store.update_user(id, &req).await?))
}

/// DELETE /api/v1/admin/users/:id
pub async fn handle_delete_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.store.delete_user(id).await?;
    info!("admin deleted user {id}");
    Ok(StatusCode::NO_CONTENT)
}

// ── courses ─────────────────────────────────────────────────────────────

/// POST /api/v1/admin/courses
pub async fn handle_create_course(
    State(state): State<AppState>,
    Json(req): Json<NewCourse>,
) -> Result<Json<Course>, AppError> {
    validate_new_course(&req)?;
    let course = state.store.insert_course(&req).await?;
    info!("admin created course {} ({})", course.code, course.id);
    Ok(Json(course))
}

/// PATCH /api/v1/admin/courses/:id
pub async fn handle_update_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<CoursePatch>,
) -> Result<Json<Course>, AppError> {
    Ok(Json(state.store.update_course(id, &req).await?))
}

/// DELETE /api/v1/admin/courses/:id
pub async fn handle_delete_course(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.store.delete_course(id).await?;
    info!("admin deleted course {id}");
    Ok(StatusCode::NO_CONTENT)
}

// ── categories ──────────────────────────────────────────────────────────

/// POST /api/v1/admin/categories
pub async fn handle_create_category(
    State(state): State<AppState>,
    Json(req): Json<NewCategory>,
) -> Result<Json<Category>, AppError> {
    validate_new_category(&req)?;
    let category = state.store.insert_category(&req).await?;
    info!("admin created category {}", category.id);
    Ok(Json(category))
}

/// PATCH /api/v1/admin/categories/:id
pub async fn handle_update_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<CategoryPatch>,
) -> Result<Json<Category>, AppError> {
    Ok(Json(state.store.update_category(id, &req).await?))
}

/// DELETE /api/v1/admin/categories/:id
pub async fn handle_delete_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.store.delete_category(id).await?;
    info!("admin deleted category {id}");
    Ok(StatusCode::NO_CONTENT)
}

// ── subcategories ───────────────────────────────────────────────────────

/// POST /api/v1/admin/subcategories
pub async fn handle_create_subcategory(
    State(state): State<AppState>,
    Json(req): Json<NewSubcategory>,
) -> Result<Json<Subcategory>, AppError> {
    validate_new_subcategory(&req)?;
    let subcategory = state.store.insert_subcategory(&req).await?;
    info!("admin created subcategory {}", subcategory.id);
    Ok(Json(subcategory))
}

/// PATCH /api/v1/admin/subcategories/:id
pub async fn handle_update_subcategory(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<SubcategoryPatch>,
) -> Result<Json<Subcategory>, AppError> {
    Ok(Json(state.store.update_subcategory(id, &req).await?))
}

/// DELETE /api/v1/admin/subcategories/:id
pub async fn handle_delete_subcategory(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.store.delete_subcategory(id).await?;
    info!("admin deleted subcategory {id}");
    Ok(StatusCode::NO_CONTENT)
}

fn validate_new_user(user: &NewUser) -> Result<(), AppError> {
    if user.full_name.trim().is_empty()
        || user.email.trim().is_empty()
        || user.role.trim().is_empty()
    {
        return Err(AppError::Validation(
            "fullName, email, and role are required".to_string(),
        ));
    }
    if user.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AppError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters"
        )));
    }
    Ok(())
}

fn validate_new_course(course: &NewCourse) -> Result<(), AppError> {
    if course.code.trim().is_empty() || course.name.trim().is_empty() {
        return Err(AppError::Validation(
            "Course code and name are required".to_string(),
        ));
    }
    if course.subcategory_id <= 0 {
        return Err(AppError::Validation(
            "A course must belong to a subcategory".to_string(),
        ));
    }
    Ok(())
}

fn validate_new_category(category: &NewCategory) -> Result<(), AppError> {
    if category.name.trim().is_empty() {
        return Err(AppError::Validation(
            "Category name is required".to_string(),
        ));
    }
    Ok(())
}

fn validate_new_subcategory(subcategory: &NewSubcategory) -> Result<(), AppError> {
    if subcategory.name.trim().is_empty() {
        return Err(AppError::Validation(
            "Subcategory name is required".to_string(),
        ));
    }
    if subcategory.category_id <= 0 {
        return Err(AppError::Validation(
            "A subcategory must belong to a category".to_string(),
        ));
    }
    Ok(())
}
