use crate::error::{Error, Result};
use crate::models::referral::{NewReferral, Referral, DEFAULT_LOCATION};
use crate::models::screening_test::{ScreeningTest, QUESTIONS_PER_TEST};
use crate::services::question_generator::QuestionGenerator;
use crate::services::test_service::TestService;
use crate::services::user_service::UserService;
use crate::session::Session;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

#[derive(FromRow)]
struct ReferralRow {
    id: Uuid,
    posted_by_user_id: Uuid,
    posted_by_user_name: String,
    company: String,
    role: String,
    description: String,
    tech_stack: Json<Vec<String>>,
    experience_required: i32,
    location: String,
    created_at: DateTime<Utc>,
}

impl From<ReferralRow> for Referral {
    fn from(row: ReferralRow) -> Self {
        Self {
            id: row.id,
            posted_by_user_id: row.posted_by_user_id,
            posted_by_user_name: row.posted_by_user_name,
            company: row.company,
            role: row.role,
            description: row.description,
            tech_stack: row.tech_stack.0,
            experience_required: row.experience_required,
            location: row.location,
            created_at: row.created_at,
        }
    }
}

/// Referral lifecycle, including screening-test generation at creation time.
#[derive(Clone)]
pub struct ReferralService {
    pool: SqlitePool,
    users: UserService,
    tests: TestService,
    generator: Arc<dyn QuestionGenerator>,
}

impl ReferralService {
    pub fn new(
        pool: SqlitePool,
        users: UserService,
        tests: TestService,
        generator: Arc<dyn QuestionGenerator>,
    ) -> Self {
        Self {
            pool,
            users,
            tests,
            generator,
        }
    }

    pub fn generator_name(&self) -> &'static str {
        self.generator.name()
    }

    pub async fn create_referral(&self, session: &Session, fields: NewReferral) -> Result<Referral> {
        let poster = self.users.current_user(session).await?;

        let tech_stack: Vec<String> = fields
            .tech_stack
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        let location = fields
            .location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string());

        let referral = Referral {
            id: Uuid::new_v4(),
            posted_by_user_id: poster.id,
            posted_by_user_name: poster.name,
            company: fields.company,
            role: fields.role,
            description: fields.description,
            tech_stack,
            experience_required: fields.experience_required,
            location,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO referrals (
                id, posted_by_user_id, posted_by_user_name, company, role, description,
                tech_stack, experience_required, location, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(referral.id)
        .bind(referral.posted_by_user_id)
        .bind(&referral.posted_by_user_name)
        .bind(&referral.company)
        .bind(&referral.role)
        .bind(&referral.description)
        .bind(Json(&referral.tech_stack))
        .bind(referral.experience_required)
        .bind(&referral.location)
        .bind(referral.created_at)
        .execute(&self.pool)
        .await?;

        tracing::info!(referral_id = %referral.id, poster = %referral.posted_by_user_id, "Referral created");
        Ok(referral)
    }

    /// Persists the referral, then generates its screening test.
    ///
    /// A generation failure leaves the referral in place without a test;
    /// callers can retry with [`ReferralService::ensure_screening_test`].
    pub async fn create_referral_with_test(
        &self,
        session: &Session,
        fields: NewReferral,
    ) -> Result<ScreeningTest> {
        let referral = self.create_referral(session, fields).await?;
        self.generate_screening_test(&referral).await
    }

    /// Always generates a new test, even if the referral already has one.
    pub async fn generate_screening_test(&self, referral: &Referral) -> Result<ScreeningTest> {
        let questions = match self
            .generator
            .generate_questions(&referral.tech_stack, &referral.description, QUESTIONS_PER_TEST)
            .await
        {
            Ok(questions) => questions,
            Err(e) => {
                tracing::error!(
                    referral_id = %referral.id,
                    generator = self.generator.name(),
                    error = %e,
                    "Screening test generation failed; referral kept without a test"
                );
                return Err(e.into());
            }
        };

        self.tests.create_test(referral.id, questions).await
    }

    /// Returns the existing test, or generates one if the referral has none.
    pub async fn ensure_screening_test(&self, referral_id: Uuid) -> Result<(ScreeningTest, bool)> {
        let referral = self.get_referral(referral_id).await?;
        if self.tests.has_screening_test(referral_id).await? {
            let test = self.tests.get_test_for_referral(referral_id).await?;
            return Ok((test, false));
        }
        let test = self.generate_screening_test(&referral).await?;
        Ok((test, true))
    }

    pub async fn get_referral(&self, id: Uuid) -> Result<Referral> {
        let row = sqlx::query_as::<_, ReferralRow>(r#"SELECT * FROM referrals WHERE id = ?"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Referral::from).ok_or(Error::ReferralNotFound(id))
    }

    pub async fn list_referrals(&self) -> Result<Vec<Referral>> {
        let rows = sqlx::query_as::<_, ReferralRow>(
            r#"SELECT * FROM referrals ORDER BY created_at DESC, rowid DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Referral::from).collect())
    }

    pub async fn list_referrals_by_poster(&self, session: &Session) -> Result<Vec<Referral>> {
        let user_id = session.require_user()?;
        let rows = sqlx::query_as::<_, ReferralRow>(
            r#"
            SELECT * FROM referrals
            WHERE posted_by_user_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Referral::from).collect())
    }

    /// Deletes the referral together with its tests, attempts and connections.
    pub async fn delete_referral(&self, session: &Session, id: Uuid) -> Result<()> {
        let user_id = session.require_user()?;
        let referral = self.get_referral(id).await?;
        if referral.posted_by_user_id != user_id {
            return Err(Error::Forbidden("only the poster can delete a referral".to_string()));
        }

        sqlx::query(r#"DELETE FROM referrals WHERE id = ?"#)
            .bind(id)
            .execute(&self.pool)
            .await?;

        tracing::info!(referral_id = %id, "Referral deleted");
        Ok(())
    }

    pub async fn has_screening_test(&self, referral_id: Uuid) -> Result<bool> {
        self.tests.has_screening_test(referral_id).await
    }

    pub async fn get_screening_test(&self, referral_id: Uuid) -> Result<ScreeningTest> {
        self.tests.get_test_for_referral(referral_id).await
    }
}
