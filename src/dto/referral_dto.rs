use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::connection::Connection;
use crate::models::referral::{NewReferral, Referral};
use crate::models::screening_test::ScreeningTest;
use crate::models::test_attempt::TestResult;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateReferralPayload {
    #[validate(length(min = 1))]
    pub company: String,
    #[validate(length(min = 1))]
    pub role: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
    #[serde(default)]
    #[validate(range(min = 0, max = 50))]
    pub experience_required: i32,
    pub location: Option<String>,
}

impl From<CreateReferralPayload> for NewReferral {
    fn from(payload: CreateReferralPayload) -> Self {
        Self {
            company: payload.company,
            role: payload.role,
            description: payload.description,
            tech_stack: payload.tech_stack,
            experience_required: payload.experience_required,
            location: payload.location,
        }
    }
}

/// A referral is stored even when its screening test could not be generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReferralResponse {
    pub referral: Referral,
    pub screening_test: Option<ScreeningTestView>,
    pub generation_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionView {
    pub id: Uuid,
    pub question_text: String,
    pub options: Vec<String>,
}

/// Candidate-facing test: answer keys are never included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningTestView {
    pub id: Uuid,
    pub referral_id: Uuid,
    pub pass_threshold: i32,
    pub questions: Vec<QuestionView>,
}

impl From<ScreeningTest> for ScreeningTestView {
    fn from(test: ScreeningTest) -> Self {
        Self {
            id: test.id,
            referral_id: test.referral_id,
            pass_threshold: test.pass_threshold,
            questions: test
                .questions
                .into_iter()
                .map(|q| QuestionView {
                    id: q.id,
                    question_text: q.question_text,
                    options: q.options,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicantResponse {
    pub connection: Connection,
    pub test_result: Option<TestResult>,
}
