use crate::models::question::Question;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grade {
    pub correct: i32,
    pub total: i32,
    pub percentage: i32,
    pub passed: bool,
}

pub struct GradingService;

impl GradingService {
    /// Scores `answers` positionally against `questions`.
    ///
    /// Missing, extra or out-of-range answers never fail; they simply do not
    /// score. The percentage is floored before comparing with `pass_threshold`.
    pub fn grade(questions: &[Question], answers: &[i32], pass_threshold: i32) -> Grade {
        let correct = questions
            .iter()
            .enumerate()
            .filter(|(idx, q)| answers.get(*idx) == Some(&q.correct_answer_index))
            .count() as i32;
        let total = questions.len() as i32;

        let percentage = if total > 0 { correct * 100 / total } else { 0 };
        let passed = total > 0 && percentage >= pass_threshold;

        Grade {
            correct,
            total,
            percentage,
            passed,
        }
    }
}
