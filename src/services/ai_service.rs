use crate::error::GenerationError;
use crate::models::question::Question;
use crate::services::question_generator::QuestionGenerator;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You are an expert technical interviewer who writes challenging, \
    relevant screening questions for software engineering positions. Always return valid JSON.";

/// Question generator backed by an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct AIService {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct GeneratedQuestion {
    #[serde(rename = "questionText", alias = "question_text", alias = "question")]
    question_text: String,
    options: Vec<String>,
    #[serde(
        rename = "correctAnswerIndex",
        alias = "correct_answer_index",
        alias = "correct_answer",
        deserialize_with = "lenient_index"
    )]
    correct_answer_index: i64,
}

/// Models sometimes quote the index or emit it as a float; both are
/// accepted and fractions are truncated. Anything non-numeric is an error.
fn lenient_index<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    let number = match &value {
        JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        JsonValue::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        _ => None,
    };
    number.ok_or_else(|| {
        serde::de::Error::custom(format!("correct answer index is not a number: {}", value))
    })
}

impl AIService {
    pub fn new(
        client: Client,
        api_key: String,
        base_url: String,
        model: String,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            timeout,
        }
    }

    pub fn build_prompt(tech_stack: &[String], job_description: &str, count: usize) -> String {
        let stack = if tech_stack.is_empty() {
            "Not specified".to_string()
        } else {
            tech_stack.join(", ")
        };

        format!(
            r#"Generate exactly {count} medium-to-hard technical screening questions for the job below.

Tech Stack: {stack}

Job Description: {job_description}

Requirements:
- Exactly {count} questions
- 4 multiple-choice options per question
- 1 correct answer per question, given as an index 0-3
- Medium to hard difficulty, relevant to the tech stack and the job
- Prefer practical knowledge and real-world scenarios over trivia

Return ONLY a JSON array in this format, with no other text:
[
  {{
    "questionText": "Your question here?",
    "options": ["Option A", "Option B", "Option C", "Option D"],
    "correctAnswerIndex": 0
  }}
]"#
        )
    }

    async fn chat_completion(&self, prompt: String) -> Result<String, GenerationError> {
        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.7,
            "max_tokens": 2000
        });

        let res = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| GenerationError::BackendUnavailable(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %truncate(&text, 300), "Generation backend error");
            return Err(GenerationError::BackendError(status.as_u16()));
        }

        let text = res
            .text()
            .await
            .map_err(|e| GenerationError::BackendUnavailable(e.to_string()))?;
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        let body: JsonValue = serde_json::from_str(&text)
            .map_err(|e| GenerationError::MalformedResponse(format!("response body is not JSON: {}", e)))?;
        completion_content(&body)
    }
}

#[async_trait]
impl QuestionGenerator for AIService {
    async fn generate_questions(
        &self,
        tech_stack: &[String],
        job_description: &str,
        count: usize,
    ) -> Result<Vec<Question>, GenerationError> {
        tracing::info!(
            model = %self.model,
            tech_stack = %tech_stack.join(", "),
            description_len = job_description.len(),
            count,
            "Requesting screening questions"
        );

        let prompt = Self::build_prompt(tech_stack, job_description, count);
        let content = self.chat_completion(prompt).await?;
        let questions = parse_questions(&content, count)?;

        tracing::info!(parsed = questions.len(), "Screening questions parsed");
        Ok(questions)
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}

/// Pulls `choices[0].message.content` out of a chat-completions reply.
pub fn completion_content(body: &JsonValue) -> Result<String, GenerationError> {
    let content = body
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .ok_or_else(|| {
            GenerationError::MalformedResponse("missing choices[0].message.content".to_string())
        })?;

    let content = content.as_str().ok_or_else(|| {
        GenerationError::MalformedResponse("message content is not a string".to_string())
    })?;

    if content.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(content.to_string())
}

pub fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"));
    match without_open {
        Some(rest) => rest.trim_end().strip_suffix("```").unwrap_or(rest).trim(),
        None => trimmed,
    }
}

/// The substring from the first `[` to the last `]`, inclusive.
pub fn extract_json_array(content: &str) -> Result<&str, GenerationError> {
    let cleaned = strip_code_fences(content);
    let start = cleaned.find('[');
    let end = cleaned.rfind(']');

    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(&cleaned[start..=end]),
        _ => Err(GenerationError::MalformedResponse(
            "no JSON array found in generated content".to_string(),
        )),
    }
}

/// Parses and validates generated questions. Extra questions beyond `count` are dropped.
pub fn parse_questions(content: &str, count: usize) -> Result<Vec<Question>, GenerationError> {
    let array = extract_json_array(content)?;
    let items: Vec<JsonValue> = serde_json::from_str(array)
        .map_err(|e| GenerationError::MalformedResponse(format!("invalid JSON array: {}", e)))?;

    let mut questions = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        let raw: GeneratedQuestion = serde_json::from_value(item).map_err(|e| {
            GenerationError::MalformedResponse(format!("question {}: {}", idx, e))
        })?;

        let correct = i32::try_from(raw.correct_answer_index).map_err(|_| {
            GenerationError::InvalidQuestionFormat(format!(
                "question {}: correct answer index {} not in range 0-3",
                idx, raw.correct_answer_index
            ))
        })?;

        let question = Question::new(raw.question_text, raw.options, correct);
        if let Err(e) = question.validate() {
            tracing::warn!(index = idx, error = %e, "Rejecting generated question");
            return Err(e);
        }
        questions.push(question);
    }

    if questions.is_empty() {
        return Err(GenerationError::NoQuestionsGenerated);
    }

    if questions.len() > count {
        tracing::warn!(received = questions.len(), count, "Backend returned extra questions; truncating");
        questions.truncate(count);
    } else if questions.len() < count {
        tracing::warn!(received = questions.len(), count, "Backend returned fewer questions than requested");
    }

    for (position, q) in questions.iter_mut().enumerate() {
        q.position = position as i32;
    }
    Ok(questions)
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
