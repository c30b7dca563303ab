use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::Profile;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct UpdateProfilePayload {
    #[validate(length(max = 120))]
    pub company: String,
    #[validate(range(min = 0, max = 70))]
    pub experience_years: i32,
    pub tech_stack: Vec<String>,
    pub leetcode_url: String,
    pub codeforces_url: String,
    pub codechef_url: String,
    pub github_url: String,
    pub hackathon_experience: String,
    pub achievements: String,
}

impl From<UpdateProfilePayload> for Profile {
    fn from(payload: UpdateProfilePayload) -> Self {
        Self {
            company: payload.company.trim().to_string(),
            experience_years: payload.experience_years,
            tech_stack: payload
                .tech_stack
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            leetcode_url: payload.leetcode_url.trim().to_string(),
            codeforces_url: payload.codeforces_url.trim().to_string(),
            codechef_url: payload.codechef_url.trim().to_string(),
            github_url: payload.github_url.trim().to_string(),
            hackathon_experience: payload.hackathon_experience,
            achievements: payload.achievements,
            setup_complete: true,
        }
    }
}
