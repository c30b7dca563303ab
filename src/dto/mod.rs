pub mod auth_dto;
pub mod chat_dto;
pub mod connection_dto;
pub mod profile_dto;
pub mod referral_dto;
pub mod test_dto;
