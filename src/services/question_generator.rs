use async_trait::async_trait;

use crate::error::GenerationError;
use crate::models::question::Question;

/// Produces screening questions for a job posting.
///
/// Implementations are picked once at startup (see `AppState::new`) and
/// shared as `Arc<dyn QuestionGenerator>`.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate_questions(
        &self,
        tech_stack: &[String],
        job_description: &str,
        count: usize,
    ) -> Result<Vec<Question>, GenerationError>;

    fn name(&self) -> &'static str;
}

const GENERIC_TOPIC: &str = "General Programming";

/// Offline generator: one self-assessment question per slot, cycling
/// through the tech stack. The first option is always the correct one.
#[derive(Debug, Clone, Default)]
pub struct FallbackQuestionGenerator;

impl FallbackQuestionGenerator {
    pub fn build(&self, tech_stack: &[String], count: usize) -> Vec<Question> {
        (0..count)
            .map(|i| {
                let topic = if tech_stack.is_empty() {
                    GENERIC_TOPIC
                } else {
                    tech_stack[i % tech_stack.len()].as_str()
                };
                let mut question = Question::new(
                    format!("What is your experience level with {}?", topic),
                    vec![
                        "Expert - I have extensive production experience".to_string(),
                        "Intermediate - I have worked on several projects".to_string(),
                        "Beginner - I have basic knowledge".to_string(),
                        "No experience - I am willing to learn".to_string(),
                    ],
                    0,
                );
                question.position = i as i32;
                question
            })
            .collect()
    }
}

#[async_trait]
impl QuestionGenerator for FallbackQuestionGenerator {
    async fn generate_questions(
        &self,
        tech_stack: &[String],
        _job_description: &str,
        count: usize,
    ) -> Result<Vec<Question>, GenerationError> {
        let questions = self.build(tech_stack, count);
        for q in &questions {
            q.validate()?;
        }
        if questions.is_empty() {
            return Err(GenerationError::NoQuestionsGenerated);
        }
        Ok(questions)
    }

    fn name(&self) -> &'static str {
        "fallback"
    }
}
