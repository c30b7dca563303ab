pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod utils;

use crate::config::{Config, GeneratorKind};
use crate::error::{Error, Result};
use crate::services::{
    ai_service::AIService, chat_service::ChatService, connection_service::ConnectionService,
    question_generator::{FallbackQuestionGenerator, QuestionGenerator},
    referral_service::ReferralService, test_service::TestService, user_service::UserService,
};
use reqwest::Client;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub user_service: UserService,
    pub referral_service: ReferralService,
    pub test_service: TestService,
    pub connection_service: ConnectionService,
    pub chat_service: ChatService,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: &Config) -> Result<Self> {
        let generator = build_generator(config)?;
        Ok(Self::with_generator(pool, config, generator))
    }

    pub fn with_generator(
        pool: SqlitePool,
        config: &Config,
        generator: Arc<dyn QuestionGenerator>,
    ) -> Self {
        let user_service = UserService::new(pool.clone());
        let test_service = TestService::new(pool.clone());
        let referral_service = ReferralService::new(
            pool.clone(),
            user_service.clone(),
            test_service.clone(),
            generator,
        );
        let connection_service =
            ConnectionService::new(pool.clone(), user_service.clone(), referral_service.clone());
        let chat_service = ChatService::new(pool.clone(), user_service.clone());

        Self {
            pool,
            jwt_secret: config.jwt_secret.clone(),
            jwt_ttl_hours: config.jwt_ttl_hours,
            user_service,
            referral_service,
            test_service,
            connection_service,
            chat_service,
        }
    }
}

fn build_generator(config: &Config) -> Result<Arc<dyn QuestionGenerator>> {
    match (config.question_generator, config.llm_api_key.as_ref()) {
        (GeneratorKind::Llm, Some(api_key)) => {
            let timeout = Duration::from_secs(config.llm_timeout_secs);
            let client = Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| Error::Config(format!("HTTP client: {}", e)))?;
            tracing::info!(model = %config.llm_model, base_url = %config.llm_api_base_url, "Using LLM question generator");
            Ok(Arc::new(AIService::new(
                client,
                api_key.clone(),
                config.llm_api_base_url.clone(),
                config.llm_model.clone(),
                timeout,
            )))
        }
        (GeneratorKind::Llm, None) => {
            tracing::warn!("LLM_API_KEY not set; falling back to offline question generator");
            Ok(Arc::new(FallbackQuestionGenerator))
        }
        (GeneratorKind::Fallback, _) => Ok(Arc::new(FallbackQuestionGenerator)),
    }
}
