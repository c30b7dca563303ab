use crate::error::{Error, Result};
use crate::models::question::Question;
use crate::models::screening_test::{ScreeningTest, ScreeningTestRecord, PASS_THRESHOLD};
use crate::models::test_attempt::{TestAttempt, TestResult};
use crate::services::grading_service::GradingService;
use crate::session::Session;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

#[derive(FromRow)]
struct QuestionRow {
    id: Uuid,
    question_text: String,
    options: Json<Vec<String>>,
    correct_answer_index: i32,
    position: i32,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Self {
            id: row.id,
            question_text: row.question_text,
            options: row.options.0,
            correct_answer_index: row.correct_answer_index,
            position: row.position,
        }
    }
}

#[derive(FromRow)]
struct AttemptRow {
    id: Uuid,
    candidate_id: Uuid,
    test_id: Uuid,
    score: i32,
    total_questions: i32,
    passed: bool,
    answers: Json<Vec<i32>>,
    attempted_at: DateTime<Utc>,
}

impl From<AttemptRow> for TestAttempt {
    fn from(row: AttemptRow) -> Self {
        Self {
            id: row.id,
            candidate_id: row.candidate_id,
            test_id: row.test_id,
            score: row.score,
            total_questions: row.total_questions,
            passed: row.passed,
            answers: row.answers.0,
            attempted_at: row.attempted_at,
        }
    }
}

/// Screening-test storage, grading and attempt history.
#[derive(Clone)]
pub struct TestService {
    pool: SqlitePool,
}

impl TestService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Stores a test and its questions in generation order, atomically.
    pub async fn create_test(&self, referral_id: Uuid, questions: Vec<Question>) -> Result<ScreeningTest> {
        let record = ScreeningTestRecord {
            id: Uuid::new_v4(),
            referral_id,
            pass_threshold: PASS_THRESHOLD,
            created_at: Utc::now(),
        };

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO screening_tests (id, referral_id, pass_threshold, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(record.id)
        .bind(record.referral_id)
        .bind(record.pass_threshold)
        .bind(record.created_at)
        .execute(&mut *tx)
        .await?;

        let mut stored = Vec::with_capacity(questions.len());
        for (position, mut question) in questions.into_iter().enumerate() {
            question.position = position as i32;
            sqlx::query(
                r#"
                INSERT INTO questions (id, test_id, question_text, options, correct_answer_index, position)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(question.id)
            .bind(record.id)
            .bind(&question.question_text)
            .bind(Json(&question.options))
            .bind(question.correct_answer_index)
            .bind(question.position)
            .execute(&mut *tx)
            .await?;
            stored.push(question);
        }
        tx.commit().await?;

        tracing::info!(test_id = %record.id, referral_id = %referral_id, questions = stored.len(), "Screening test stored");
        Ok(record.with_questions(stored))
    }

    pub async fn get_test_by_id(&self, test_id: Uuid) -> Result<ScreeningTest> {
        let record = sqlx::query_as::<_, ScreeningTestRecord>(
            r#"SELECT id, referral_id, pass_threshold, created_at FROM screening_tests WHERE id = ?"#,
        )
        .bind(test_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::TestNotFound)?;

        let questions = self.load_questions(record.id).await?;
        Ok(record.with_questions(questions))
    }

    /// Most recent test generated for the referral.
    pub async fn get_test_for_referral(&self, referral_id: Uuid) -> Result<ScreeningTest> {
        let record = sqlx::query_as::<_, ScreeningTestRecord>(
            r#"
            SELECT id, referral_id, pass_threshold, created_at
            FROM screening_tests
            WHERE referral_id = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT 1
            "#,
        )
        .bind(referral_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(record) = record else {
            tracing::debug!(referral_id = %referral_id, "No screening test for referral");
            return Err(Error::TestNotFound);
        };

        let questions = self.load_questions(record.id).await?;
        Ok(record.with_questions(questions))
    }

    pub async fn has_screening_test(&self, referral_id: Uuid) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar(r#"SELECT COUNT(*) FROM screening_tests WHERE referral_id = ?"#)
                .bind(referral_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }

    async fn load_questions(&self, test_id: Uuid) -> Result<Vec<Question>> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, question_text, options, correct_answer_index, position
            FROM questions
            WHERE test_id = ?
            ORDER BY position ASC
            "#,
        )
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Question::from).collect())
    }

    /// Grades a submission and appends it to the candidate's attempt history.
    pub async fn submit_test(
        &self,
        session: &Session,
        test_id: Uuid,
        answers: Vec<i32>,
    ) -> Result<TestResult> {
        let candidate_id = session.require_user()?;
        let test = self.get_test_by_id(test_id).await?;
        let grade = GradingService::grade(&test.questions, &answers, test.pass_threshold);

        let attempt = TestAttempt {
            id: Uuid::new_v4(),
            candidate_id,
            test_id,
            score: grade.correct,
            total_questions: grade.total,
            passed: grade.passed,
            answers,
            attempted_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO test_attempts (id, candidate_id, test_id, score, total_questions, passed, answers, attempted_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(attempt.id)
        .bind(attempt.candidate_id)
        .bind(attempt.test_id)
        .bind(attempt.score)
        .bind(attempt.total_questions)
        .bind(attempt.passed)
        .bind(Json(&attempt.answers))
        .bind(attempt.attempted_at)
        .execute(&self.pool)
        .await?;

        tracing::info!(
            candidate_id = %candidate_id,
            test_id = %test_id,
            score = grade.correct,
            total = grade.total,
            passed = grade.passed,
            "Screening test submitted"
        );
        Ok(TestResult::from(&attempt))
    }

    /// True once any attempt for the pair has passed, regardless of later attempts.
    pub async fn has_passed_test(&self, candidate_id: Uuid, test_id: Uuid) -> Result<bool> {
        Ok(self.passed_attempt(candidate_id, test_id).await?.is_some())
    }

    pub async fn passed_attempt(&self, candidate_id: Uuid, test_id: Uuid) -> Result<Option<TestAttempt>> {
        let row = sqlx::query_as::<_, AttemptRow>(
            r#"
            SELECT * FROM test_attempts
            WHERE candidate_id = ? AND test_id = ? AND passed = 1
            ORDER BY attempted_at DESC, rowid DESC
            LIMIT 1
            "#,
        )
        .bind(candidate_id)
        .bind(test_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(TestAttempt::from))
    }

    pub async fn latest_attempt(&self, candidate_id: Uuid, test_id: Uuid) -> Result<Option<TestAttempt>> {
        let row = sqlx::query_as::<_, AttemptRow>(
            r#"
            SELECT * FROM test_attempts
            WHERE candidate_id = ? AND test_id = ?
            ORDER BY attempted_at DESC, rowid DESC
            LIMIT 1
            "#,
        )
        .bind(candidate_id)
        .bind(test_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(TestAttempt::from))
    }

    pub async fn list_attempts(&self, candidate_id: Uuid, test_id: Uuid) -> Result<Vec<TestAttempt>> {
        let rows = sqlx::query_as::<_, AttemptRow>(
            r#"
            SELECT * FROM test_attempts
            WHERE candidate_id = ? AND test_id = ?
            ORDER BY attempted_at DESC, rowid DESC
            "#,
        )
        .bind(candidate_id)
        .bind(test_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(TestAttempt::from).collect())
    }

    /// Passed attempt if there is one, else the latest; `None` without a test or attempts.
    pub async fn applicant_test_result(
        &self,
        candidate_id: Uuid,
        referral_id: Uuid,
    ) -> Result<Option<TestResult>> {
        let test = match self.get_test_for_referral(referral_id).await {
            Ok(test) => test,
            Err(Error::TestNotFound) => return Ok(None),
            Err(e) => return Err(e),
        };

        let attempt = match self.passed_attempt(candidate_id, test.id).await? {
            Some(attempt) => Some(attempt),
            None => self.latest_attempt(candidate_id, test.id).await?,
        };
        Ok(attempt.as_ref().map(TestResult::from))
    }
}
