pub mod chat;
pub mod connection;
pub mod message;
pub mod question;
pub mod referral;
pub mod screening_test;
pub mod test_attempt;
pub mod user;
