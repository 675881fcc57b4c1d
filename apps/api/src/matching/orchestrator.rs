//! The matching core. One orchestrator instance drives every comparison
//! and every change to a student's transfer log; handlers stay thin.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::matching::prompts::{build_match_prompt, MATCH_SYSTEM_PROMPT};
use crate::matching::validation::{parse_candidates, validate_source};
use crate::models::transfer::{
    transfer_key, MatchCandidate, SourceCourse, TargetCourse, TransferLogEntry,
};
use crate::store::RecordStore;

pub struct CourseMatchOrchestrator {
    store: Arc<dyn RecordStore>,
    llm: LlmClient,
}

impl CourseMatchOrchestrator {
    pub fn new(store: Arc<dyn RecordStore>, llm: LlmClient) -> Self {
        Self { store, llm }
    }

    /// Compares one submitted course against the target catalog and returns
    /// the candidates the matcher proposes. Input is validated before any
    /// call leaves the process; an empty target list short-circuits to an
    /// empty result.
    pub async fn compare_courses(
        &self,
        source: &SourceCourse,
        targets: &[TargetCourse],
    ) -> Result<Vec<MatchCandidate>, AppError> {
        validate_source(source)?;

        if targets.is_empty() {
            debug!("no target courses to compare against");
            return Ok(Vec::new());
        }

        let prompt = build_match_prompt(source, targets);
        let content = self.llm.chat(MATCH_SYSTEM_PROMPT, &prompt).await?;
        let candidates = parse_candidates(&content)?;

        info!(
            "comparison for {} returned {} candidate(s) against {} target(s)",
            source.code,
            candidates.len(),
            targets.len()
        );
        Ok(candidates)
    }

    /// Records an approved candidate in the student's transfer log. The log
    /// key is `{target}:{source}`; approving the same pair twice is a
    /// conflict and leaves the log untouched.
    pub async fn approve_match(
        &self,
        student_id: &str,
        candidate: &MatchCandidate,
        source: &SourceCourse,
    ) -> Result<(String, TransferLogEntry), AppError> {
        let key = transfer_key(&candidate.target_course_code, &candidate.matched_course_code);

        let mut log = self.store.get_transfer_log(student_id).await?;
        if log.contains_key(&key) {
            return Err(AppError::DuplicateTransfer(key));
        }

        let entry = TransferLogEntry {
            target: candidate.target_course_code.clone(),
            target_course_name: candidate.target_course_name.clone(),
            source: candidate.matched_course_code.clone(),
            source_course_code: source.code.clone(),
            source_course_name: source.name.clone(),
            source_description: source.description.clone(),
            reason: candidate.match_reason.clone(),
            timestamp: Utc::now(),
        };
        log.insert(key.clone(), entry.clone());
        self.store.put_transfer_log(student_id, &log).await?;

        info!("student {student_id} approved transfer {key}");
        Ok((key, entry))
    }

    /// Removes one entry from the student's log. Deleting a key that is not
    /// present is a no-op and does not touch the store.
    pub async fn delete_transfer_entry(
        &self,
        student_id: &str,
        key: &str,
    ) -> Result<bool, AppError> {
        let mut log = self.store.get_transfer_log(student_id).await?;
        if log.remove(key).is_none() {
            debug!("student {student_id} has no transfer {key}, nothing to delete");
            return Ok(false);
        }
        self.store.put_transfer_log(student_id, &log).await?;

        info!("student {student_id} deleted transfer {key}");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::retry::RetryPolicy;
    use crate::models::user::User;
    use crate::store::memory::MemoryStore;
    use crate::store::StoreError;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;
    use std::time::Duration;

    fn student(student_id: &str) -> User {
        User {
            id: 1,
            username: Some("somchai".to_string()),
            full_name: Some("Somchai Jaidee".to_string()),
            student_id: Some(student_id.to_string()),
            email: Some("somchai@example.ac.th".to_string()),
            role: Some("student".to_string()),
            description: None,
            password: Some("s3cret".to_string()),
        }
    }

    fn source() -> SourceCourse {
        SourceCourse {
            code: "CS101".to_string(),
            name: "Introduction to Computing".to_string(),
            description: "x".repeat(300),
            credit: None,
            course_type: None,
        }
    }

    fn candidate() -> MatchCandidate {
        MatchCandidate {
            target_course_code: "01076001".to_string(),
            target_course_name: "Computer Programming".to_string(),
            matched_course_code: "CS101".to_string(),
            similarity_score: 0.95,
            match_reason: "เนื้อหาตรงกัน".to_string(),
        }
    }

    /// Points at a closed port so any attempted call fails loudly instead
    /// of hanging.
    fn unroutable_llm() -> LlmClient {
        LlmClient::new(
            "test-key".to_string(),
            "http://127.0.0.1:1".to_string(),
            "http://localhost".to_string(),
            "Test".to_string(),
        )
        .with_retry_policy(RetryPolicy {
            max_attempts: 1,
            base_delay: Duration::from_millis(1),
            max_jitter: Duration::from_millis(1),
        })
    }

    fn orchestrator_with(store: Arc<MemoryStore>, llm: LlmClient) -> CourseMatchOrchestrator {
        CourseMatchOrchestrator::new(store, llm)
    }

    #[tokio::test]
    async fn test_compare_rejects_short_description_before_any_call() {
        let orchestrator = orchestrator_with(Arc::new(MemoryStore::new()), unroutable_llm());
        let short = SourceCourse {
            description: "too short".to_string(),
            ..source()
        };
        let targets = vec![TargetCourse {
            code: "01076001".to_string(),
            name: "Computer Programming".to_string(),
            description: None,
        }];

        let err = orchestrator.compare_courses(&short, &targets).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_compare_with_no_targets_skips_the_matcher() {
        let orchestrator = orchestrator_with(Arc::new(MemoryStore::new()), unroutable_llm());
        let candidates = orchestrator.compare_courses(&source(), &[]).await.unwrap();
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn test_compare_returns_in_range_candidates_only() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route(
            "/chat/completions",
            post(|| async {
                let reply = json!([
                    {
                        "targetCourseCode": "01076001",
                        "targetCourseName": "Computer Programming",
                        "matchedCourseCode": "CS101",
                        "similarityScore": 0.96,
                        "matchReason": "เนื้อหาตรงกัน"
                    },
                    {
                        "targetCourseCode": "01076002",
                        "targetCourseName": "Data Structures",
                        "matchedCourseCode": "CS101",
                        "similarityScore": 0.4,
                        "matchReason": "คล้ายกันเพียงบางส่วน"
                    }
                ]);
                Json(json!({
                    "choices": [{"message": {"role": "assistant", "content": reply.to_string()}}],
                    "usage": {"prompt_tokens": 100, "completion_tokens": 40}
                }))
            }),
        );
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let llm = LlmClient::new(
            "test-key".to_string(),
            format!("http://{addr}"),
            "http://localhost".to_string(),
            "Test".to_string(),
        );
        let orchestrator = orchestrator_with(Arc::new(MemoryStore::new()), llm);
        let targets = vec![
            TargetCourse {
                code: "01076001".to_string(),
                name: "Computer Programming".to_string(),
                description: Some("Programming basics.".to_string()),
            },
            TargetCourse {
                code: "01076002".to_string(),
                name: "Data Structures".to_string(),
                description: None,
            },
        ];

        let candidates = orchestrator.compare_courses(&source(), &targets).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].target_course_code, "01076001");
    }

    #[tokio::test]
    async fn test_approve_writes_one_entry() {
        let store = Arc::new(MemoryStore::new());
        store.seed_user(student("65010001"));
        let orchestrator = orchestrator_with(store.clone(), unroutable_llm());

        let (key, entry) = orchestrator
            .approve_match("65010001", &candidate(), &source())
            .await
            .unwrap();
        assert_eq!(key, "01076001:CS101");
        assert_eq!(entry.source_course_name, "Introduction to Computing");

        let log = store.get_transfer_log("65010001").await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[&key], entry);
    }

    #[tokio::test]
    async fn test_approving_the_same_pair_twice_is_a_conflict() {
        let store = Arc::new(MemoryStore::new());
        store.seed_user(student("65010001"));
        let orchestrator = orchestrator_with(store.clone(), unroutable_llm());

        orchestrator
            .approve_match("65010001", &candidate(), &source())
            .await
            .unwrap();
        let err = orchestrator
            .approve_match("65010001", &candidate(), &source())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::DuplicateTransfer(ref key) if key == "01076001:CS101"));
        let log = store.get_transfer_log("65010001").await.unwrap();
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_approve_for_unknown_student_fails() {
        let orchestrator = orchestrator_with(Arc::new(MemoryStore::new()), unroutable_llm());
        let err = orchestrator
            .approve_match("99999999", &candidate(), &source())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Store(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_removes_only_the_named_entry() {
        let store = Arc::new(MemoryStore::new());
        store.seed_user(student("65010001"));
        let orchestrator = orchestrator_with(store.clone(), unroutable_llm());

        orchestrator
            .approve_match("65010001", &candidate(), &source())
            .await
            .unwrap();
        let other = MatchCandidate {
            target_course_code: "01076002".to_string(),
            ..candidate()
        };
        orchestrator
            .approve_match("65010001", &other, &source())
            .await
            .unwrap();

        let deleted = orchestrator
            .delete_transfer_entry("65010001", "01076001:CS101")
            .await
            .unwrap();
        assert!(deleted);

        let log = store.get_transfer_log("65010001").await.unwrap();
        assert_eq!(log.len(), 1);
        assert!(log.contains_key("01076002:CS101"));
    }

    #[tokio::test]
    async fn test_delete_of_absent_key_is_a_noop() {
        let store = Arc::new(MemoryStore::new());
        store.seed_user(student("65010001"));
        let orchestrator = orchestrator_with(store, unroutable_llm());

        let deleted = orchestrator
            .delete_transfer_entry("65010001", "01076001:CS101")
            .await
            .unwrap();
        assert!(!deleted);
    }

    #[tokio::test]
    async fn test_delete_frees_the_key_for_a_new_approval() {
        let store = Arc::new(MemoryStore::new());
        store.seed_user(student("65010001"));
        let orchestrator = orchestrator_with(store.clone(), unroutable_llm());

        orchestrator
            .approve_match("65010001", &candidate(), &source())
            .await
            .unwrap();
        let deleted = orchestrator
            .delete_transfer_entry("65010001", "01076001:CS101")
            .await
            .unwrap();
        assert!(deleted);

        let reconsidered = MatchCandidate {
            match_reason: "พิจารณาใหม่แล้วเนื้อหาครอบคลุมกัน".to_string(),
            ..candidate()
        };
        let (key, entry) = orchestrator
            .approve_match("65010001", &reconsidered, &source())
            .await
            .unwrap();
        assert_eq!(key, "01076001:CS101");

        let log = store.get_transfer_log("65010001").await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[&key], entry);
        assert_eq!(log[&key].reason, "พิจารณาใหม่แล้วเนื้อหาครอบคลุมกัน");
    }
}
