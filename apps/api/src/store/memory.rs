//! In-memory [`RecordStore`] for tests. Keeps the transfer log inside
//! `User::description` the way the hosted schema does, so reads go through
//! the same parsing as production rows.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::models::course::{
    Category, CategoryPatch, Course, CoursePatch, NewCategory, NewCourse, NewSubcategory,
    Subcategory, SubcategoryPatch,
};
use crate::models::transfer::TransferLog;
use crate::models::user::{NewUser, TransferActivityRow, User, UserPatch};
use crate::store::supabase::parse_transfer_log;
use crate::store::{RecordStore, StoreError, Table};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    courses: Vec<Course>,
    categories: Vec<Category>,
    subcategories: Vec<Subcategory>,
    next_id: i64,
    list_courses_calls: u32,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_user(&self, user: User) {
        self.inner.lock().unwrap().users.push(user);
    }

    pub fn seed_course(&self, course: Course) {
        self.inner.lock().unwrap().courses.push(course);
    }

    pub fn seed_category(&self, category: Category) {
        self.inner.lock().unwrap().categories.push(category);
    }

    pub fn seed_subcategory(&self, subcategory: Subcategory) {
        self.inner.lock().unwrap().subcategories.push(subcategory);
    }

    /// How many times `list_courses` has been called on this store.
    pub fn list_courses_calls(&self) -> u32 {
        self.inner.lock().unwrap().list_courses_calls
    }
}

fn alloc_id(inner: &mut Inner) -> i64 {
    inner.next_id += 1;
    inner.next_id
}

fn missing(table: &str, id: i64) -> StoreError {
    StoreError::NotFound(format!("{table} id {id}"))
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_login_user(
        &self,
        identifier: &str,
        password: &str,
        role: &str,
    ) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .iter()
            .find(|u| {
                let id_match = u.username.as_deref() == Some(identifier)
                    || u.email.as_deref() == Some(identifier)
                    || u.student_id.as_deref() == Some(identifier);
                id_match
                    && u.password.as_deref() == Some(password)
                    && u.role.as_deref() == Some(role)
            })
            .cloned())
    }

    async fn get_user_by_student_id(&self, student_id: &str) -> Result<User, StoreError> {
        let inner = self.inner.lock().unwrap();
        inner
            .users
            .iter()
            .find(|u| u.student_id.as_deref() == Some(student_id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("student {student_id}")))
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.inner.lock().unwrap().users.clone())
    }

    async fn insert_user(&self, user: &NewUser) -> Result<User, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let created = User {
            id: alloc_id(&mut inner),
            username: user.username.clone(),
            full_name: Some(user.full_name.clone()),
            student_id: user.student_id.clone(),
            email: Some(user.email.clone()),
            role: Some(user.role.clone()),
            description: None,
            password: Some(user.password.clone()),
        };
        inner.users.push(created.clone());
        Ok(created)
    }

    async fn update_user(&self, id: i64, patch: &UserPatch) -> Result<User, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| missing("users", id))?;
        if let Some(username) = &patch.username {
            user.username = Some(username.clone());
        }
        if let Some(full_name) = &patch.full_name {
            user.full_name = Some(full_name.clone());
        }
        if let Some(student_id) = &patch.student_id {
            user.student_id = Some(student_id.clone());
        }
        if let Some(email) = &patch.email {
            user.email = Some(email.clone());
        }
        if let Some(role) = &patch.role {
            user.role = Some(role.clone());
        }
        if let Some(password) = &patch.password {
            user.password = Some(password.clone());
        }
        Ok(user.clone())
    }

    async fn delete_user(&self, id: i64) -> Result<(), StoreError> {
        self.inner.lock().unwrap().users.retain(|u| u.id != id);
        Ok(())
    }

    async fn get_transfer_log(&self, student_id: &str) -> Result<TransferLog, StoreError> {
        let description = self
            .get_user_by_student_id(student_id)
            .await?
            .description;
        parse_transfer_log(description.unwrap_or(Value::Null))
    }

    async fn put_transfer_log(
        &self,
        student_id: &str,
        log: &TransferLog,
    ) -> Result<(), StoreError> {
        let value = serde_json::to_value(log)
            .map_err(|e| StoreError::Malformed(format!("unserializable transfer log: {e}")))?;
        let mut inner = self.inner.lock().unwrap();
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.student_id.as_deref() == Some(student_id))
            .ok_or_else(|| StoreError::NotFound(format!("student {student_id}")))?;
        user.description = Some(value);
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        Ok(self.inner.lock().unwrap().categories.clone())
    }

    async fn list_subcategories(&self) -> Result<Vec<Subcategory>, StoreError> {
        Ok(self.inner.lock().unwrap().subcategories.clone())
    }

    async fn list_courses(&self) -> Result<Vec<Course>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.list_courses_calls += 1;
        Ok(inner.courses.clone())
    }

    async fn insert_course(&self, course: &NewCourse) -> Result<Course, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let created = Course {
            id: alloc_id(&mut inner),
            subcategory_id: course.subcategory_id,
            code: course.code.clone(),
            name: course.name.clone(),
            credit: course.credit.clone(),
            course_type: course.course_type.clone(),
            description: course.description.clone(),
        };
        inner.courses.push(created.clone());
        Ok(created)
    }

    async fn update_course(&self, id: i64, patch: &CoursePatch) -> Result<Course, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let course = inner
            .courses
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| missing("courses", id))?;
        if let Some(subcategory_id) = patch.subcategory_id {
            course.subcategory_id = subcategory_id;
        }
        if let Some(code) = &patch.code {
            course.code = code.clone();
        }
        if let Some(name) = &patch.name {
            course.name = name.clone();
        }
        if let Some(credit) = &patch.credit {
            course.credit = Some(credit.clone());
        }
        if let Some(course_type) = &patch.course_type {
            course.course_type = Some(course_type.clone());
        }
        if let Some(description) = &patch.description {
            course.description = Some(description.clone());
        }
        Ok(course.clone())
    }

    async fn delete_course(&self, id: i64) -> Result<(), StoreError> {
        self.inner.lock().unwrap().courses.retain(|c| c.id != id);
        Ok(())
    }

    async fn insert_category(&self, category: &NewCategory) -> Result<Category, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let created = Category {
            id: alloc_id(&mut inner),
            name: category.name.clone(),
        };
        inner.categories.push(created.clone());
        Ok(created)
    }

    async fn update_category(
        &self,
        id: i64,
        patch: &CategoryPatch,
    ) -> Result<Category, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let category = inner
            .categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| missing("categories", id))?;
        if let Some(name) = &patch.name {
            category.name = name.clone();
        }
        Ok(category.clone())
    }

    async fn delete_category(&self, id: i64) -> Result<(), StoreError> {
        self.inner.lock().unwrap().categories.retain(|c| c.id != id);
        Ok(())
    }

    async fn insert_subcategory(
        &self,
        subcategory: &NewSubcategory,
    ) -> Result<Subcategory, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let created = Subcategory {
            id: alloc_id(&mut inner),
            category_id: subcategory.category_id,
            name: subcategory.name.clone(),
        };
        inner.subcategories.push(created.clone());
        Ok(created)
    }

    async fn update_subcategory(
        &self,
        id: i64,
        patch: &SubcategoryPatch,
    ) -> Result<Subcategory, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let subcategory = inner
            .subcategories
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| missing("subcategories", id))?;
        if let Some(category_id) = patch.category_id {
            subcategory.category_id = category_id;
        }
        if let Some(name) = &patch.name {
            subcategory.name = name.clone();
        }
        Ok(subcategory.clone())
    }

    async fn delete_subcategory(&self, id: i64) -> Result<(), StoreError> {
        self.inner
            .lock()
            .unwrap()
            .subcategories
            .retain(|s| s.id != id);
        Ok(())
    }

    async fn count_rows(&self, table: Table) -> Result<u64, StoreError> {
        let inner = self.inner.lock().unwrap();
        let count = match table {
            Table::Users => inner.users.len(),
            Table::Courses => inner.courses.len(),
            Table::Categories => inner.categories.len(),
            Table::Subcategories => inner.subcategories.len(),
        };
        Ok(count as u64)
    }

    async fn list_transfer_activity(&self) -> Result<Vec<TransferActivityRow>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .iter()
            .filter(|u| match &u.description {
                None | Some(Value::Null) => false,
                Some(Value::Object(map)) => !map.is_empty(),
                Some(_) => true,
            })
            .map(|u| TransferActivityRow {
                full_name: u.full_name.clone(),
                student_id: u.student_id.clone(),
                description: u.description.clone(),
            })
            .collect())
    }
}
