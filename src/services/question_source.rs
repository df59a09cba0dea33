use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use schemars::JsonSchema;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::{
    config::Config,
    constants::quiz_prompt::{QUIZ_GENERATOR_PROMPT, QUIZ_REQUEST_TEMPLATE},
    errors::{AppError, AppResult},
    models::domain::Question,
};

/// Produces the questions for one attempt from a course title and description.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn generate_quiz(
        &self,
        course_title: &str,
        course_description: &str,
    ) -> AppResult<Vec<Question>>;
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct GenerateQuizRequest {
    #[validate(length(min = 1, message = "Course title must not be empty"))]
    pub course_title: String,

    #[validate(length(min = 1, message = "Course description must not be empty"))]
    pub course_description: String,
}

impl GenerateQuizRequest {
    pub fn new(course_title: &str, course_description: &str) -> Self {
        Self {
            course_title: course_title.trim().to_string(),
            course_description: course_description.trim().to_string(),
        }
    }

    fn render_prompt(&self) -> String {
        QUIZ_REQUEST_TEMPLATE
            .replace("{course_title}", &self.course_title)
            .replace("{course_description}", &self.course_description)
    }
}

/// Shape the model is asked to return.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
pub struct GeneratedQuiz {
    #[validate(length(equal = 10), nested)]
    pub questions: Vec<GeneratedQuestion>,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
pub struct GeneratedQuestion {
    #[validate(length(min = 1))]
    pub question: String,

    #[validate(length(equal = 4))]
    pub options: Vec<String>,

    #[validate(range(max = 3))]
    pub correct_answer_index: u8,

    pub explanation: String,
}

impl TryFrom<GeneratedQuestion> for Question {
    type Error = AppError;

    fn try_from(generated: GeneratedQuestion) -> AppResult<Self> {
        let option_count = generated.options.len();
        let options: [String; 4] = generated.options.try_into().map_err(|_| {
            AppError::QuestionSource(format!("Expected 4 options, received {}", option_count))
        })?;

        Question::new(
            generated.question,
            options,
            generated.correct_answer_index as usize,
            generated.explanation,
        )
        .map_err(|e| AppError::QuestionSource(e.to_string()))
    }
}

/// Parses the model's message content into validated questions.
pub fn parse_generated_quiz(content: &str) -> AppResult<Vec<Question>> {
    let body = strip_code_fence(content);
    let generated: GeneratedQuiz = serde_json::from_str(body)?;

    generated
        .validate()
        .map_err(|e| AppError::QuestionSource(format!("Generated quiz is invalid: {}", e)))?;

    generated
        .questions
        .into_iter()
        .map(Question::try_from)
        .collect()
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}

fn extract_message_content(response: &serde_json::Value) -> AppResult<&str> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| AppError::QuestionSource("Model returned no content".to_string()))
}

pub struct OpenAiQuestionSource {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiQuestionSource {
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.openai_api_key.expose_secret())
            .with_api_base(&config.openai_api_base);

        Self {
            client: Client::with_config(openai_config),
            model: config.openai_model.clone(),
        }
    }

    fn build_request(&self, request: &GenerateQuizRequest) -> serde_json::Value {
        let schema = schemars::schema_for!(GeneratedQuiz);

        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": QUIZ_GENERATOR_PROMPT },
                { "role": "user", "content": request.render_prompt() }
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "generated_quiz",
                    "schema": schema,
                    "strict": false
                }
            }
        })
    }
}

#[async_trait]
impl QuestionSource for OpenAiQuestionSource {
    async fn generate_quiz(
        &self,
        course_title: &str,
        course_description: &str,
    ) -> AppResult<Vec<Question>> {
        let request = GenerateQuizRequest::new(course_title, course_description);
        request.validate()?;

        log::info!("Requesting quiz generation for '{}'", request.course_title);

        let response: serde_json::Value = self
            .client
            .chat()
            .create_byot(self.build_request(&request))
            .await
            .map_err(|e| {
                log::error!("Quiz generation failed for '{}': {}", request.course_title, e);
                AppError::from(e)
            })?;

        let questions = parse_generated_quiz(extract_message_content(&response)?)?;

        log::info!(
            "Generated {} questions for '{}'",
            questions.len(),
            request.course_title
        );
        Ok(questions)
    }
}
