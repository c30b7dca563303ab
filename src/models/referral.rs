use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_LOCATION: &str = "Remote";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Referral {
    pub id: Uuid,
    pub posted_by_user_id: Uuid,
    pub posted_by_user_name: String,
    pub company: String,
    pub role: String,
    pub description: String,
    pub tech_stack: Vec<String>,
    pub experience_required: i32,
    pub location: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReferral {
    pub company: String,
    pub role: String,
    pub description: String,
    pub tech_stack: Vec<String>,
    pub experience_required: i32,
    pub location: Option<String>,
}
