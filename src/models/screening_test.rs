use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::question::Question;

/// Percentage a candidate must reach to pass.
pub const PASS_THRESHOLD: i32 = 60;
pub const QUESTIONS_PER_TEST: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningTest {
    pub id: Uuid,
    pub referral_id: Uuid,
    pub questions: Vec<Question>,
    pub pass_threshold: i32,
    pub created_at: DateTime<Utc>,
}

/// The `screening_tests` row without its questions.
#[derive(Debug, Clone, FromRow)]
pub struct ScreeningTestRecord {
    pub id: Uuid,
    pub referral_id: Uuid,
    pub pass_threshold: i32,
    pub created_at: DateTime<Utc>,
}

impl ScreeningTestRecord {
    pub fn with_questions(self, questions: Vec<Question>) -> ScreeningTest {
        ScreeningTest {
            id: self.id,
            referral_id: self.referral_id,
            questions,
            pass_threshold: self.pass_threshold,
            created_at: self.created_at,
        }
    }
}
