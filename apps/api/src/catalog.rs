//! Read-only curriculum endpoints for the browsing page: the three raw
//! tables in one payload, and a nested category tree with course counts.

use std::collections::HashMap;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::course::{Category, Course, Subcategory};
use crate::state::AppState;

#[derive(Serialize)]
pub struct CatalogResponse {
    pub categories: Vec<Category>,
    pub subcategories: Vec<Subcategory>,
    pub courses: Vec<Course>,
}

/// GET /api/v1/catalog
pub async fn handle_get_catalog(
    State(state): State<AppState>,
) -> Result<Json<CatalogResponse>, AppError> {
    let (categories, subcategories, courses) = tokio::try_join!(
        state.store.list_categories(),
        state.store.list_subcategories(),
        state.store.list_courses(),
    )?;
    Ok(Json(CatalogResponse {
        categories,
        subcategories,
        courses,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubcategoryNode {
    pub id: i64,
    pub name: String,
    pub course_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryNode {
    pub id: i64,
    pub name: String,
    pub course_count: usize,
    pub subcategories: Vec<SubcategoryNode>,
}

#[derive(Serialize)]
pub struct CatalogStructure {
    pub categories: Vec<CategoryNode>,
}

/// GET /api/v1/catalog/structure
pub async fn handle_get_structure(
    State(state): State<AppState>,
) -> Result<Json<CatalogStructure>, AppError> {
    let (categories, subcategories, courses) = tokio::try_join!(
        state.store.list_categories(),
        state.store.list_subcategories(),
        state.store.list_courses(),
    )?;
    Ok(Json(build_structure(&categories, &subcategories, &courses)))
}

/// Nests subcategories under their category with per-level course counts.
/// Subcategories without courses are omitted; categories stay listed even
/// when empty.
fn build_structure(
    categories: &[Category],
    subcategories: &[Subcategory],
    courses: &[Course],
) -> CatalogStructure {
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for course in courses {
        *counts.entry(course.subcategory_id).or_default() += 1;
    }

    let categories = categories
        .iter()
        .map(|category| {
            let subcategories: Vec<SubcategoryNode> = subcategories
                .iter()
                .filter(|s| s.category_id == category.id)
                .filter_map(|s| {
                    let course_count = counts.get(&s.id).copied().unwrap_or(0);
                    (course_count > 0).then(|| SubcategoryNode {
                        id: s.id,
                        name: s.name.clone(),
                        course_count,
                    })
                })
                .collect();
            CategoryNode {
                id: category.id,
                name: category.name.clone(),
                course_count: subcategories.iter().map(|s| s.course_count).sum(),
                subcategories,
            }
        })
        .collect();

    CatalogStructure { categories }
}
