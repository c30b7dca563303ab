pub mod auth;
pub mod chat;
pub mod connection;
pub mod health;
pub mod profile;
pub mod referral;
pub mod test;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::middleware::auth::require_bearer_auth;
use crate::AppState;

pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health::health))
        .route("/api/auth/signup", post(auth::signup))
        .route("/api/auth/login", post(auth::login));

    let api = Router::new()
        .route(
            "/api/profile",
            get(profile::get_my_profile).put(profile::update_my_profile),
        )
        .route("/api/users/:id/profile", get(profile::get_user_profile))
        .route(
            "/api/referrals",
            get(referral::list_referrals).post(referral::create_referral),
        )
        .route("/api/referrals/mine", get(referral::list_my_referrals))
        .route(
            "/api/referrals/:id",
            get(referral::get_referral).delete(referral::delete_referral),
        )
        .route(
            "/api/referrals/:id/screening-test",
            get(referral::get_screening_test).post(referral::ensure_screening_test),
        )
        .route("/api/referrals/:id/applicants", get(referral::list_applicants))
        .route(
            "/api/referrals/:id/connections",
            post(referral::request_connection),
        )
        .route("/api/tests/:id/submit", post(test::submit_test))
        .route("/api/tests/:id/passed", get(test::has_passed))
        .route("/api/tests/:id/attempts", get(test::list_my_attempts))
        .route("/api/connections", get(connection::list_connections))
        .route("/api/connections/pending", get(connection::list_pending))
        .route("/api/connections/unread-count", get(connection::unread_count))
        .route("/api/connections/read", post(connection::mark_read))
        .route("/api/connections/:id/accept", post(connection::accept))
        .route("/api/connections/:id/reject", post(connection::reject))
        .route("/api/chats", get(chat::list_chats))
        .route("/api/chats/unread-count", get(chat::unread_count))
        .route("/api/chats/with/:user_id", get(chat::chat_with_user))
        .route(
            "/api/chats/:id/messages",
            get(chat::list_messages).post(chat::send_message),
        )
        .route("/api/chats/:id/read", post(chat::mark_read))
        .layer(from_fn_with_state(state.clone(), require_bearer_auth));

    public.merge(api).with_state(state)
}
