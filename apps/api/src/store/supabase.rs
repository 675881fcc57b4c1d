//! PostgREST-backed implementation of [`RecordStore`].
//!
//! Talks to the hosted data service's REST dialect directly: filters as
//! query parameters (`eq.`, `or=(...)`, `not.is.null`), `Prefer` headers
//! for representations and exact counts, and the
//! `application/vnd.pgrst.object+json` accept type for single-row results.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_RANGE};
use reqwest::{Client, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::models::course::{
    Category, CategoryPatch, Course, CoursePatch, NewCategory, NewCourse, NewSubcategory,
    Subcategory, SubcategoryPatch,
};
use crate::models::transfer::TransferLog;
use crate::models::user::{NewUser, TransferActivityRow, User, UserPatch};
use crate::store::{RecordStore, StoreError, Table};

const PGRST_OBJECT: &str = "application/vnd.pgrst.object+json";

pub struct SupabaseStore {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseStore {
    pub fn new(base_url: String, anon_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
        }
    }

    fn request(&self, method: Method, table: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}/rest/v1/{}", self.base_url, table))
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    async fn check(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        warn!("PostgREST returned {status}: {message}");
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Like [`check`], but a 406 means the single-row accept type matched
    /// zero rows, which callers treat as a missing row.
    async fn check_row(response: Response, what: &str) -> Result<Response, StoreError> {
        if response.status() == StatusCode::NOT_ACCEPTABLE {
            return Err(StoreError::NotFound(what.to_string()));
        }
        Self::check(response).await
    }

    async fn fetch_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, StoreError> {
        let response = self.request(Method::GET, table).query(query).send().await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn insert_row<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<T, StoreError> {
        let response = self
            .request(Method::POST, table)
            .header(ACCEPT, PGRST_OBJECT)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn update_row<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        id: i64,
        body: &B,
    ) -> Result<T, StoreError> {
        let response = self
            .request(Method::PATCH, table)
            .query(&[("id", eq(&id.to_string()))])
            .header(ACCEPT, PGRST_OBJECT)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let response = Self::check_row(response, &format!("{table} id {id}")).await?;
        Ok(response.json().await?)
    }

    async fn delete_row(&self, table: &str, id: i64) -> Result<(), StoreError> {
        let response = self
            .request(Method::DELETE, table)
            .query(&[("id", eq(&id.to_string()))])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

/// Decodes the `users.description` column into a typed log. Null means an
/// empty log; text columns holding serialized JSON are tolerated. Anything
/// else is reported as malformed rather than silently replaced, so a
/// read-modify-write cycle can never destroy an unreadable log.
pub(crate) fn parse_transfer_log(value: Value) -> Result<TransferLog, StoreError> {
    let value = match value {
        Value::Null => return Ok(TransferLog::new()),
        Value::String(text) if text.trim().is_empty() => return Ok(TransferLog::new()),
        Value::String(text) => serde_json::from_str(&text)
            .map_err(|e| StoreError::Malformed(format!("transfer log is not valid JSON: {e}")))?,
        other => other,
    };
    serde_json::from_value(value)
        .map_err(|e| StoreError::Malformed(format!("transfer log has unexpected shape: {e}")))
}

/// Extracts the total from a `Content-Range` value such as `0-24/3573` or
/// `*/0`.
fn parse_content_range_total(header: &str) -> Option<u64> {
    header.rsplit('/').next()?.trim().parse().ok()
}

#[derive(Debug, Deserialize)]
struct DescriptionRow {
    #[serde(default)]
    description: Option<Value>,
}

#[async_trait]
impl RecordStore for SupabaseStore {
    async fn find_login_user(
        &self,
        identifier: &str,
        password: &str,
        role: &str,
    ) -> Result<Option<User>, StoreError> {
        let password = eq(password);
        let role = eq(role);
        let or_filter = format!(
            "(username.eq.{identifier},email.eq.{identifier},studentId.eq.{identifier})"
        );
        let rows: Vec<User> = self
            .fetch_rows(
                "users",
                &[
                    ("select", "*"),
                    ("password", &password),
                    ("role", &role),
                    ("or", &or_filter),
                    ("limit", "1"),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn get_user_by_student_id(&self, student_id: &str) -> Result<User, StoreError> {
        let filter = eq(student_id);
        let rows: Vec<User> = self
            .fetch_rows("users", &[("select", "*"), ("studentId", &filter)])
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(format!("student {student_id}")))
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        self.fetch_rows("users", &[("select", "*")]).await
    }

    async fn insert_user(&self, user: &NewUser) -> Result<User, StoreError> {
        self.insert_row("users", user).await
    }

    async fn update_user(&self, id: i64, patch: &UserPatch) -> Result<User, StoreError> {
        self.update_row("users", id, patch).await
    }

    async fn delete_user(&self, id: i64) -> Result<(), StoreError> {
        self.delete_row("users", id).await
    }

    async fn get_transfer_log(&self, student_id: &str) -> Result<TransferLog, StoreError> {
        let filter = eq(student_id);
        let rows: Vec<DescriptionRow> = self
            .fetch_rows("users", &[("select", "description"), ("studentId", &filter)])
            .await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(format!("student {student_id}")))?;
        parse_transfer_log(row.description.unwrap_or(Value::Null))
    }

    async fn put_transfer_log(
        &self,
        student_id: &str,
        log: &TransferLog,
    ) -> Result<(), StoreError> {
        let response = self
            .request(Method::PATCH, "users")
            .query(&[("studentId", eq(student_id))])
            .header(ACCEPT, PGRST_OBJECT)
            .header("Prefer", "return=representation")
            .json(&json!({ "description": log }))
            .send()
            .await?;
        Self::check_row(response, &format!("student {student_id}")).await?;
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        self.fetch_rows("categories", &[("select", "*")]).await
    }

    async fn list_subcategories(&self) -> Result<Vec<Subcategory>, StoreError> {
        self.fetch_rows("subcategories", &[("select", "*")]).await
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StoreError> {
        self.fetch_rows("courses", &[("select", "*")]).await
    }

    async fn insert_course(&self, course: &NewCourse) -> Result<Course, StoreError> {
        self.insert_row("courses", course).await
    }

    async fn update_course(&self, id: i64, patch: &CoursePatch) -> Result<Course, StoreError> {
        self.update_row("courses", id, patch).await
    }

    async fn delete_course(&self, id: i64) -> Result<(), StoreError> {
        self.delete_row("courses", id).await
    }

    async fn insert_category(&self, category: &NewCategory) -> Result<Category, StoreError> {
        self.insert_row("categories", category).await
    }

    async fn update_category(
        &self,
        id: i64,
        patch: &CategoryPatch,
    ) -> Result<Category, StoreError> {
        self.update_row("categories", id, patch).await
    }

    async fn delete_category(&self, id: i64) -> Result<(), StoreError> {
        self.delete_row("categories", id).await
    }

    async fn insert_subcategory(
        &self,
        subcategory: &NewSubcategory,
    ) -> Result<Subcategory, StoreError> {
        self.insert_row("subcategories", subcategory).await
    }

    async fn update_subcategory(
        &self,
        id: i64,
        patch: &SubcategoryPatch,
    ) -> Result<Subcategory, StoreError> {
        self.update_row("subcategories", id, patch).await
    }

    async fn delete_subcategory(&self, id: i64) -> Result<(), StoreError> {
        self.delete_row("subcategories", id).await
    }

    async fn count_rows(&self, table: Table) -> Result<u64, StoreError> {
        let response = self
            .request(Method::HEAD, table.as_str())
            .query(&[("select", "*")])
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = Self::check(response).await?;
        let header = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        parse_content_range_total(&header)
            .ok_or_else(|| StoreError::Malformed(format!("unparseable Content-Range: {header:?}")))
    }

    async fn list_transfer_activity(&self) -> Result<Vec<TransferActivityRow>, StoreError> {
        self.fetch_rows(
            "users",
            &[
                ("select", "fullName,studentId,description"),
                ("description", "not.is.null"),
                ("description", "neq.{}"),
            ],
        )
        .await
    }
}
