use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GenerationError;

pub const OPTIONS_PER_QUESTION: usize = 4;

/// A four-option multiple-choice screening question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_answer_index: i32,
    pub position: i32,
}

impl Question {
    pub fn new(question_text: String, options: Vec<String>, correct_answer_index: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            question_text,
            options,
            correct_answer_index,
            position: 0,
        }
    }

    /// Exactly four options and a correct index inside them.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.options.len() != OPTIONS_PER_QUESTION {
            return Err(GenerationError::InvalidQuestionFormat(format!(
                "question has {} options (expected {})",
                self.options.len(),
                OPTIONS_PER_QUESTION
            )));
        }
        if !(0..OPTIONS_PER_QUESTION as i32).contains(&self.correct_answer_index) {
            return Err(GenerationError::InvalidQuestionFormat(format!(
                "correct answer index {} not in range 0-3",
                self.correct_answer_index
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Option {}", i)).collect()
    }

    #[test]
    fn accepts_four_options_with_index_in_range() {
        for idx in 0..4 {
            assert!(Question::new("Q?".into(), options(4), idx).validate().is_ok());
        }
    }

    #[test]
    fn rejects_wrong_option_count() {
        let err = Question::new("Q?".into(), options(3), 0).validate().unwrap_err();
        assert!(matches!(err, GenerationError::InvalidQuestionFormat(_)));
        let err = Question::new("Q?".into(), options(5), 0).validate().unwrap_err();
        assert!(matches!(err, GenerationError::InvalidQuestionFormat(_)));
    }

    #[test]
    fn rejects_out_of_range_index() {
        assert!(Question::new("Q?".into(), options(4), -1).validate().is_err());
        assert!(Question::new("Q?".into(), options(4), 4).validate().is_err());
    }
}
