use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestAttempt {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub test_id: Uuid,
    pub score: i32,
    pub total_questions: i32,
    pub passed: bool,
    pub answers: Vec<i32>,
    pub attempted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub test_id: Uuid,
    pub score: i32,
    pub total_questions: i32,
    pub score_percentage: i32,
    pub passed: bool,
}

impl From<&TestAttempt> for TestResult {
    fn from(attempt: &TestAttempt) -> Self {
        let score_percentage = if attempt.total_questions > 0 {
            attempt.score * 100 / attempt.total_questions
        } else {
            0
        };
        Self {
            test_id: attempt.test_id,
            score: attempt.score,
            total_questions: attempt.total_questions,
            score_percentage,
            passed: attempt.passed,
        }
    }
}
