use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitTestPayload {
    #[validate(length(max = 100))]
    pub answers: Vec<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassedResponse {
    pub test_id: Uuid,
    pub passed: bool,
}
