pub mod ai_service;
pub mod chat_service;
pub mod connection_service;
pub mod grading_service;
pub mod question_generator;
pub mod referral_service;
pub mod test_service;
pub mod user_service;
