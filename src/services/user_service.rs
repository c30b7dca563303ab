use crate::error::{Error, Result};
use crate::models::user::{Profile, User, UserRole, UserWithProfile};
use crate::session::Session;
use crate::utils::crypto::{hash_password, verify_password};
use chrono::Utc;
use sqlx::types::Json;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

#[derive(FromRow)]
struct ProfileRow {
    company: String,
    experience_years: i32,
    tech_stack: Json<Vec<String>>,
    leetcode_url: String,
    codeforces_url: String,
    codechef_url: String,
    github_url: String,
    hackathon_experience: String,
    achievements: String,
    setup_complete: bool,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            company: row.company,
            experience_years: row.experience_years,
            tech_stack: row.tech_stack.0,
            leetcode_url: row.leetcode_url,
            codeforces_url: row.codeforces_url,
            codechef_url: row.codechef_url,
            github_url: row.github_url,
            hackathon_experience: row.hackathon_experience,
            achievements: row.achievements,
            setup_complete: row.setup_complete,
        }
    }
}

#[derive(Clone)]
pub struct UserService {
    pool: SqlitePool,
}

impl UserService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<User> {
        if let Some(existing) = self.get_by_email(email).await? {
            return Err(role_conflict(existing.role));
        }

        let password_hash = hash_password(password)
            .map_err(|e| Error::Internal(format!("Password hashing failed: {}", e)))?;

        let user = User {
            id: Uuid::new_v4(),
            name: name.trim().to_string(),
            email: normalize_email(email),
            password_hash,
            role,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        tracing::info!(user_id = %user.id, role = ?user.role, "User signed up");
        Ok(user)
    }

    /// A user may only log in with the role they signed up with.
    pub async fn login(&self, email: &str, password: &str, role: UserRole) -> Result<User> {
        let user = self
            .get_by_email(email)
            .await?
            .ok_or_else(|| Error::Unauthorized("invalid_credentials".to_string()))?;

        let valid = verify_password(password, &user.password_hash)
            .map_err(|e| Error::Internal(format!("Stored password hash is invalid: {}", e)))?;
        if !valid {
            return Err(Error::Unauthorized("invalid_credentials".to_string()));
        }

        if user.role != role {
            return Err(role_conflict(user.role));
        }

        Ok(user)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE id = ?"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE email = ?"#)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// The session's user; a session pointing at a deleted user counts as logged out.
    pub async fn current_user(&self, session: &Session) -> Result<User> {
        let user_id = session.require_user()?;
        self.get_by_id(user_id).await?.ok_or(Error::NotAuthenticated)
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        let row = sqlx::query_as::<_, ProfileRow>(r#"SELECT * FROM profiles WHERE user_id = ?"#)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Profile::from))
    }

    pub async fn get_user_with_profile(&self, user_id: Uuid) -> Result<Option<UserWithProfile>> {
        let Some(user) = self.get_by_id(user_id).await? else {
            return Ok(None);
        };
        let profile = self.get_profile(user_id).await?;
        Ok(Some(UserWithProfile { user, profile }))
    }

    pub async fn update_profile(&self, session: &Session, mut profile: Profile) -> Result<Profile> {
        let user = self.current_user(session).await?;
        profile.setup_complete = true;

        sqlx::query(
            r#"
            INSERT INTO profiles (
                user_id, company, experience_years, tech_stack, leetcode_url, codeforces_url,
                codechef_url, github_url, hackathon_experience, achievements, setup_complete
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                company = excluded.company,
                experience_years = excluded.experience_years,
                tech_stack = excluded.tech_stack,
                leetcode_url = excluded.leetcode_url,
                codeforces_url = excluded.codeforces_url,
                codechef_url = excluded.codechef_url,
                github_url = excluded.github_url,
                hackathon_experience = excluded.hackathon_experience,
                achievements = excluded.achievements,
                setup_complete = excluded.setup_complete
            "#,
        )
        .bind(user.id)
        .bind(&profile.company)
        .bind(profile.experience_years)
        .bind(Json(&profile.tech_stack))
        .bind(&profile.leetcode_url)
        .bind(&profile.codeforces_url)
        .bind(&profile.codechef_url)
        .bind(&profile.github_url)
        .bind(&profile.hackathon_experience)
        .bind(&profile.achievements)
        .bind(profile.setup_complete)
        .execute(&self.pool)
        .await?;

        Ok(profile)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn role_conflict(existing: UserRole) -> Error {
    Error::Conflict(format!(
        "A {} profile already exists for this email",
        existing.display_name()
    ))
}
