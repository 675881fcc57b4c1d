//! Gates on both sides of the matcher call: the submitted source course
//! before any tokens are spent, and the matcher's reply before anything
//! reaches a client.

use serde_json::Value;
use tracing::warn;

use crate::errors::AppError;
use crate::llm_client::strip_json_fences;
use crate::models::transfer::{MatchCandidate, SourceCourse};

/// Minimum description length, counted in characters, not bytes.
pub const MIN_DESCRIPTION_CHARS: usize = 250;

/// Score range the matcher is instructed to stay within. Candidates
/// outside it are dropped rather than surfaced.
pub const SIMILARITY_MIN: f64 = 0.92;
pub const SIMILARITY_MAX: f64 = 1.00;

pub fn validate_source(source: &SourceCourse) -> Result<(), AppError> {
    let current = source.description.trim().chars().count();
    if current < MIN_DESCRIPTION_CHARS {
        return Err(AppError::Validation(format!(
            "Course description must be at least {MIN_DESCRIPTION_CHARS} characters (currently {current})"
        )));
    }
    if source.code.trim().is_empty() || source.name.trim().is_empty() {
        return Err(AppError::Validation(
            "Course code and course name are required".to_string(),
        ));
    }
    Ok(())
}

/// Decodes the matcher's reply. The reply must be a bare JSON array
/// (fenced output is tolerated); anything else is a validation failure
/// and is never retried.
pub fn parse_candidates(content: &str) -> Result<Vec<MatchCandidate>, AppError> {
    let text = strip_json_fences(content);
    let value: Value = serde_json::from_str(text)
        .map_err(|e| AppError::Validation(format!("Matcher output is not valid JSON: {e}")))?;
    if !value.is_array() {
        return Err(AppError::Validation(
            "Matcher output must be a JSON array of candidates".to_string(),
        ));
    }
    let candidates: Vec<MatchCandidate> = serde_json::from_value(value)
        .map_err(|e| AppError::Validation(format!("Matcher output has unexpected shape: {e}")))?;

    Ok(candidates
        .into_iter()
        .filter(|c| {
            let in_range = (SIMILARITY_MIN..=SIMILARITY_MAX).contains(&c.similarity_score);
            if !in_range {
                warn!(
                    "dropping candidate {} with out-of-range score {}",
                    c.target_course_code, c.similarity_score
                );
            }
            in_range
        })
        .collect())
}
