pub mod health;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::admin;
use crate::auth;
use crate::catalog;
use crate::matching;
use crate::profile;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/v1/auth/login", post(auth::handle_login))
        // Catalog
        .route("/api/v1/catalog", get(catalog::handle_get_catalog))
        .route(
            "/api/v1/catalog/structure",
            get(catalog::handle_get_structure),
        )
        // Matching
        .route(
            "/api/v1/match/compare",
            post(matching::handlers::handle_compare),
        )
        .route(
            "/api/v1/match/approve",
            post(matching::handlers::handle_approve),
        )
        .route(
            "/api/v1/students/:student_id/transfers",
            get(matching::handlers::handle_list_transfers),
        )
        .route(
            "/api/v1/students/:student_id/transfers/:key",
            delete(matching::handlers::handle_delete_transfer),
        )
        // Profile
        .route(
            "/api/v1/students/:student_id",
            get(profile::handle_get_profile).patch(profile::handle_update_profile),
        )
        .route(
            "/api/v1/students/:student_id/password",
            post(profile::handle_change_password),
        )
        // Admin console
        .route(
            "/api/v1/admin/overview",
            get(admin::handlers::handle_overview),
        )
        .route(
            "/api/v1/admin/dashboard",
            get(admin::dashboard::handle_dashboard),
        )
        .route(
            "/api/v1/admin/users",
            post(admin::handlers::handle_create_user),
        )
        .route(
            "/api/v1/admin/users/:id",
            patch(admin::handlers::handle_update_user).delete(admin::handlers::handle_delete_user),
        )
        .route(
            "/api/v1/admin/courses",
            post(admin::handlers::handle_create_course),
        )
        .route(
            "/api/v1/admin/courses/:id",
            patch(admin::handlers::handle_update_course)
                .delete(admin::handlers::handle_delete_course),
        )
        .route(
            "/api/v1/admin/categories",
            post(admin::handlers::handle_create_category),
        )
        .route(
            "/api/v1/admin/categories/:id",
            patch(admin::handlers::handle_update_category)
                .delete(admin::handlers::handle_delete_category),
        )
        .route(
            "/api/v1/admin/subcategories",
            post(admin::handlers::handle_create_subcategory),
        )
        .route(
            "/api/v1/admin/subcategories/:id",
            patch(admin::handlers::handle_update_subcategory)
                .delete(admin::handlers::handle_delete_subcategory),
        )
        .with_state(state)
}
