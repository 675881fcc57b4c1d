//! Record store — every read and write against the hosted data service
//! goes through the [`RecordStore`] trait.
//!
//! `SupabaseStore` is the production implementation (PostgREST over HTTP).
//! Tests swap in `MemoryStore` so handlers and the orchestrator run without
//! a network.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::course::{
    Category, CategoryPatch, Course, CoursePatch, NewCategory, NewCourse, NewSubcategory,
    Subcategory, SubcategoryPatch,
};
use crate::models::transfer::TransferLog;
use crate::models::user::{NewUser, TransferActivityRow, User, UserPatch};

#[cfg(test)]
pub mod memory;
pub mod supabase;

/// Tables the portal touches. Fixed set; also names the row-count targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Users,
    Courses,
    Categories,
    Subcategories,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Courses => "courses",
            Table::Categories => "categories",
            Table::Subcategories => "subcategories",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("row not found: {0}")]
    NotFound(String),

    #[error("malformed stored data: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    // ── users ───────────────────────────────────────────────────────────

    /// Finds the user whose username, email, or student id equals
    /// `identifier` and whose password and role match. Credential matching
    /// is plain column equality, exactly as the portal has always done it.
    async fn find_login_user(
        &self,
        identifier: &str,
        password: &str,
        role: &str,
    ) -> Result<Option<User>, StoreError>;

    async fn get_user_by_student_id(&self, student_id: &str) -> Result<User, StoreError>;
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
    async fn insert_user(&self, user: &NewUser) -> Result<User, StoreError>;
    async fn update_user(&self, id: i64, patch: &UserPatch) -> Result<User, StoreError>;
    async fn delete_user(&self, id: i64) -> Result<(), StoreError>;

    // ── transfer log (users.description) ────────────────────────────────

    async fn get_transfer_log(&self, student_id: &str) -> Result<TransferLog, StoreError>;

    /// Replaces the student's whole stored log. Concurrent writers race at
    /// mapping granularity; the last write wins.
    async fn put_transfer_log(&self, student_id: &str, log: &TransferLog)
        -> Result<(), StoreError>;

    // ── curriculum ──────────────────────────────────────────────────────

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;
    async fn list_subcategories(&self) -> Result<Vec<Subcategory>, StoreError>;
    async fn list_courses(&self) -> Result<Vec<Course>, StoreError>;

    async fn insert_course(&self, course: &NewCourse) -> Result<Course, StoreError>;
    async fn update_course(&self, id: i64, patch: &CoursePatch) -> Result<Course, StoreError>;
    async fn delete_course(&self, id: i64) -> Result<(), StoreError>;

    async fn insert_category(&self, category: &NewCategory) -> Result<Category, StoreError>;
    async fn update_category(&self, id: i64, patch: &CategoryPatch)
        -> Result<Category, StoreError>;
    async fn delete_category(&self, id: i64) -> Result<(), StoreError>;

    async fn insert_subcategory(&self, subcategory: &NewSubcategory)
        -> Result<Subcategory, StoreError>;
    async fn update_subcategory(
        &self,
        id: i64,
        patch: &SubcategoryPatch,
    ) -> Result<Subcategory, StoreError>;
    async fn delete_subcategory(&self, id: i64) -> Result<(), StoreError>;

    // ── dashboard ───────────────────────────────────────────────────────

    async fn count_rows(&self, table: Table) -> Result<u64, StoreError>;

    /// Users whose stored log is non-null and non-empty.
    async fn list_transfer_activity(&self) -> Result<Vec<TransferActivityRow>, StoreError>;
}
