//! Core matching data model: the submitted source course, catalog targets,
//! candidates proposed by the matcher, and the persisted transfer log.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::course::Course;

/// A prior-institution course as submitted by the student. Request scoped;
/// never stored on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceCourse {
    pub code: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub credit: Option<String>,
    #[serde(default, rename = "type")]
    pub course_type: Option<String>,
}

/// The catalog view handed to the matcher: one entry per target course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetCourse {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<&Course> for TargetCourse {
    fn from(course: &Course) -> Self {
        Self {
            code: course.code.clone(),
            name: course.name.clone(),
            description: course.description.clone(),
        }
    }
}

/// One match proposed by the matcher. Ephemeral; becomes a
/// [`TransferLogEntry`] only on approval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCandidate {
    pub target_course_code: String,
    pub target_course_name: String,
    pub matched_course_code: String,
    pub similarity_score: f64,
    pub match_reason: String,
}

/// An approved transfer as stored in the student's log. Field names match
/// the JSON the portal has always written; `timestamp` is RFC 3339.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferLogEntry {
    pub target: String,
    #[serde(default)]
    pub target_course_name: String,
    pub source: String,
    #[serde(default)]
    pub source_course_code: String,
    #[serde(default)]
    pub source_course_name: String,
    #[serde(default)]
    pub source_description: String,
    #[serde(default)]
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// A student's full transfer log, keyed by [`transfer_key`].
pub type TransferLog = BTreeMap<String, TransferLogEntry>;

/// Composite key that makes an approved transfer unique within one log:
/// `{target course code}:{source course code}`.
pub fn transfer_key(target_code: &str, source_code: &str) -> String {
    format!("{target_code}:{source_code}")
}
