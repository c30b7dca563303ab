use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    Recruiter,
    Seeker,
}

impl UserRole {
    pub fn display_name(self) -> &'static str {
        match self {
            UserRole::Recruiter => "Recruiter",
            UserRole::Seeker => "Seeker",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub company: String,
    pub experience_years: i32,
    pub tech_stack: Vec<String>,
    pub leetcode_url: String,
    pub codeforces_url: String,
    pub codechef_url: String,
    pub github_url: String,
    pub hackathon_experience: String,
    pub achievements: String,
    pub setup_complete: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserWithProfile {
    #[serde(flatten)]
    pub user: User,
    pub profile: Option<Profile>,
}
