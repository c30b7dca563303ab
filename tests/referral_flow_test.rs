use std::sync::Arc;

use async_trait::async_trait;
use refconnect_backend::{
    config::Config,
    database::pool::open_in_memory,
    error::{Error, GenerationError},
    models::{
        connection::ConnectionStatus, question::Question, referral::NewReferral, user::UserRole,
    },
    session::Session,
    AppState,
};
use uuid::Uuid;

/// Deterministic backend: question `i` has correct index `i % 4`.
struct ScriptedGenerator;

#[async_trait]
impl refconnect_backend::services::question_generator::QuestionGenerator for ScriptedGenerator {
    async fn generate_questions(
        &self,
        tech_stack: &[String],
        _job_description: &str,
        count: usize,
    ) -> Result<Vec<Question>, GenerationError> {
        Ok((0..count)
            .map(|i| {
                let topic = tech_stack.get(i % tech_stack.len().max(1)).cloned().unwrap_or_default();
                Question::new(
                    format!("Question {} about {}?", i + 1, topic),
                    vec!["A".into(), "B".into(), "C".into(), "D".into()],
                    (i % 4) as i32,
                )
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

struct BrokenGenerator;

#[async_trait]
impl refconnect_backend::services::question_generator::QuestionGenerator for BrokenGenerator {
    async fn generate_questions(
        &self,
        _tech_stack: &[String],
        _job_description: &str,
        _count: usize,
    ) -> Result<Vec<Question>, GenerationError> {
        Err(GenerationError::MalformedResponse("no JSON array".into()))
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

async fn state_with(
    generator: Arc<dyn refconnect_backend::services::question_generator::QuestionGenerator>,
) -> AppState {
    let pool = open_in_memory().await.expect("in-memory db");
    AppState::with_generator(pool, &Config::for_testing(), generator)
}

async fn signup(state: &AppState, name: &str, role: UserRole) -> Session {
    let email = format!("{}-{}@example.com", name.to_lowercase(), Uuid::new_v4());
    let user = state
        .user_service
        .signup(name, &email, "password123", role)
        .await
        .expect("signup");
    Session::authenticated(user.id)
}

fn go_referral() -> NewReferral {
    NewReferral {
        company: "Acme".into(),
        role: "Backend Engineer".into(),
        description: "Build services in Go on Kubernetes".into(),
        tech_stack: vec!["Go".into(), "Kubernetes".into()],
        experience_required: 2,
        location: None,
    }
}

#[tokio::test]
async fn referral_to_chat_end_to_end() {
    let state = state_with(Arc::new(ScriptedGenerator)).await;
    let recruiter = signup(&state, "Rita", UserRole::Recruiter).await;
    let seeker = signup(&state, "Sam", UserRole::Seeker).await;

    let test = state
        .referral_service
        .create_referral_with_test(&recruiter, go_referral())
        .await
        .expect("referral with test");
    assert_eq!(test.questions.len(), 5);
    assert!(state
        .referral_service
        .has_screening_test(test.referral_id)
        .await
        .unwrap());

    let referral = state.referral_service.get_referral(test.referral_id).await.unwrap();
    assert_eq!(referral.location, "Remote");
    assert_eq!(referral.posted_by_user_name, "Rita");

    let answers: Vec<i32> = test.questions.iter().map(|q| q.correct_answer_index).collect();
    let result = state
        .test_service
        .submit_test(&seeker, test.id, answers)
        .await
        .expect("submit");
    assert!(result.passed);
    assert_eq!(result.score, 5);
    assert_eq!(result.score_percentage, 100);
    assert!(state
        .test_service
        .has_passed_test(seeker.current_user_id().unwrap(), test.id)
        .await
        .unwrap());

    let before = state
        .connection_service
        .unread_count_for_giver(&recruiter)
        .await
        .unwrap();
    let connection = state
        .connection_service
        .request_connection(&seeker, referral.id)
        .await
        .expect("request");
    assert_eq!(connection.status, ConnectionStatus::Pending);
    assert!(connection.is_unread_by_giver);
    assert!(!connection.is_unread_by_seeker);
    assert_eq!(connection.referral_role, "Backend Engineer");
    assert_eq!(
        state
            .connection_service
            .unread_count_for_giver(&recruiter)
            .await
            .unwrap(),
        before + 1
    );

    state
        .connection_service
        .accept_connection(connection.id)
        .await
        .expect("accept");
    let accepted = state
        .connection_service
        .get_connection(connection.id)
        .await
        .unwrap()
        .expect("connection still exists");
    assert_eq!(accepted.status, ConnectionStatus::Accepted);
    assert!(accepted.is_unread_by_seeker);
    assert!(accepted.responded_at.is_some());

    let seeker_chats = state.chat_service.list_chats_for_user(&seeker).await.unwrap();
    assert_eq!(seeker_chats.len(), 1);
    let chat = &seeker_chats[0];
    assert!(chat.has_participants(
        seeker.current_user_id().unwrap(),
        recruiter.current_user_id().unwrap()
    ));
    assert_eq!(chat.user1_name, "Sam");
    assert_eq!(chat.user2_name, "Rita");
}

#[tokio::test]
async fn repeated_accept_keeps_a_single_chat() {
    let state = state_with(Arc::new(ScriptedGenerator)).await;
    let recruiter = signup(&state, "Rita", UserRole::Recruiter).await;
    let seeker = signup(&state, "Sam", UserRole::Seeker).await;

    let first = state
        .referral_service
        .create_referral(&recruiter, go_referral())
        .await
        .unwrap();
    let second = state
        .referral_service
        .create_referral(&recruiter, go_referral())
        .await
        .unwrap();

    let c1 = state
        .connection_service
        .request_connection(&seeker, first.id)
        .await
        .unwrap();
    let c2 = state
        .connection_service
        .request_connection(&seeker, second.id)
        .await
        .unwrap();

    state.connection_service.accept_connection(c1.id).await.unwrap();
    state.connection_service.accept_connection(c1.id).await.unwrap();
    state.connection_service.accept_connection(c2.id).await.unwrap();

    let chats = state.chat_service.list_chats_for_user(&recruiter).await.unwrap();
    assert_eq!(chats.len(), 1);
}

#[tokio::test]
async fn reject_is_terminal_and_creates_no_chat() {
    let state = state_with(Arc::new(ScriptedGenerator)).await;
    let recruiter = signup(&state, "Rita", UserRole::Recruiter).await;
    let seeker = signup(&state, "Sam", UserRole::Seeker).await;
    let referral = state
        .referral_service
        .create_referral(&recruiter, go_referral())
        .await
        .unwrap();
    let connection = state
        .connection_service
        .request_connection(&seeker, referral.id)
        .await
        .unwrap();

    state.connection_service.reject_connection(connection.id).await.unwrap();
    state.connection_service.accept_connection(connection.id).await.unwrap();

    let stored = state
        .connection_service
        .get_connection(connection.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, ConnectionStatus::Rejected);
    assert!(stored.is_unread_by_seeker);
    assert!(state.chat_service.list_chats_for_user(&seeker).await.unwrap().is_empty());

    let again = state
        .connection_service
        .request_connection(&seeker, referral.id)
        .await;
    assert!(matches!(again, Err(Error::Conflict(_))));
}

#[tokio::test]
async fn missing_connection_accept_and_reject_are_no_ops() {
    let state = state_with(Arc::new(ScriptedGenerator)).await;
    state.connection_service.accept_connection(Uuid::new_v4()).await.unwrap();
    state.connection_service.reject_connection(Uuid::new_v4()).await.unwrap();
}

#[tokio::test]
async fn request_requires_session_and_existing_referral() {
    let state = state_with(Arc::new(ScriptedGenerator)).await;
    let seeker = signup(&state, "Sam", UserRole::Seeker).await;

    let anon = state
        .connection_service
        .request_connection(&Session::anonymous(), Uuid::new_v4())
        .await;
    assert!(matches!(anon, Err(Error::NotAuthenticated)));

    let missing = Uuid::new_v4();
    let unknown = state
        .connection_service
        .request_connection(&seeker, missing)
        .await;
    assert!(matches!(unknown, Err(Error::ReferralNotFound(id)) if id == missing));
}

#[tokio::test]
async fn messaging_updates_only_the_recipient_counter() {
    let state = state_with(Arc::new(ScriptedGenerator)).await;
    let recruiter = signup(&state, "Rita", UserRole::Recruiter).await;
    let seeker = signup(&state, "Sam", UserRole::Seeker).await;
    let referral = state
        .referral_service
        .create_referral(&recruiter, go_referral())
        .await
        .unwrap();
    let connection = state
        .connection_service
        .request_connection(&seeker, referral.id)
        .await
        .unwrap();
    state.connection_service.accept_connection(connection.id).await.unwrap();

    let seeker_id = seeker.current_user_id().unwrap();
    let recruiter_id = recruiter.current_user_id().unwrap();
    let chat = state
        .chat_service
        .get_chat_by_users(recruiter_id, seeker_id)
        .await
        .unwrap()
        .expect("chat after accept");

    let sent = state
        .chat_service
        .send_message(&seeker, chat.id, "Hi, thanks for accepting!")
        .await
        .unwrap()
        .expect("participant can send");
    assert_eq!(sent.sender_name, "Sam");
    state
        .chat_service
        .send_message(&seeker, chat.id, "When can we talk?")
        .await
        .unwrap();

    let chat = state.chat_service.get_chat(chat.id).await.unwrap().unwrap();
    assert_eq!(chat.unread_count_for(recruiter_id), 2);
    assert_eq!(chat.unread_count_for(seeker_id), 0);
    assert_eq!(chat.last_message, "When can we talk?");
    assert_eq!(state.chat_service.total_unread_messages(&recruiter).await.unwrap(), 2);

    state
        .chat_service
        .send_message(&recruiter, chat.id, "Tomorrow works")
        .await
        .unwrap();
    state.chat_service.mark_chat_as_read(&recruiter, chat.id).await.unwrap();

    let chat = state.chat_service.get_chat(chat.id).await.unwrap().unwrap();
    assert_eq!(chat.unread_count_for(recruiter_id), 0);
    assert_eq!(chat.unread_count_for(seeker_id), 1);

    let messages = state.chat_service.list_messages(chat.id).await.unwrap();
    let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(
        contents,
        ["Hi, thanks for accepting!", "When can we talk?", "Tomorrow works"]
    );
    assert!(messages[0].is_read && messages[1].is_read);
    assert!(!messages[2].is_read);

    state.chat_service.mark_chat_as_read(&recruiter, chat.id).await.unwrap();

    let chat = state.chat_service.get_chat(chat.id).await.unwrap().unwrap();
    assert_eq!(chat.unread_count_for(recruiter_id), 0);
    assert_eq!(chat.unread_count_for(seeker_id), 1);
    let flags: Vec<bool> = state
        .chat_service
        .list_messages(chat.id)
        .await
        .unwrap()
        .iter()
        .map(|m| m.is_read)
        .collect();
    assert_eq!(flags, [true, true, false]);
}

#[tokio::test]
async fn outsiders_and_anonymous_senders_are_ignored() {
    let state = state_with(Arc::new(ScriptedGenerator)).await;
    let recruiter = signup(&state, "Rita", UserRole::Recruiter).await;
    let seeker = signup(&state, "Sam", UserRole::Seeker).await;
    let outsider = signup(&state, "Olly", UserRole::Seeker).await;
    let referral = state
        .referral_service
        .create_referral(&recruiter, go_referral())
        .await
        .unwrap();
    let connection = state
        .connection_service
        .request_connection(&seeker, referral.id)
        .await
        .unwrap();
    state.connection_service.accept_connection(connection.id).await.unwrap();
    let chat = state
        .chat_service
        .list_chats_for_user(&seeker)
        .await
        .unwrap()
        .remove(0);

    let by_outsider = state
        .chat_service
        .send_message(&outsider, chat.id, "hello?")
        .await
        .unwrap();
    assert!(by_outsider.is_none());
    let anonymous = state
        .chat_service
        .send_message(&Session::anonymous(), chat.id, "hello?")
        .await
        .unwrap();
    assert!(anonymous.is_none());
    let missing_chat = state
        .chat_service
        .send_message(&seeker, Uuid::new_v4(), "hello?")
        .await
        .unwrap();
    assert!(missing_chat.is_none());

    assert!(state.chat_service.list_messages(chat.id).await.unwrap().is_empty());
    let chat = state.chat_service.get_chat(chat.id).await.unwrap().unwrap();
    assert_eq!(chat.unread_count_user1 + chat.unread_count_user2, 0);
}

#[tokio::test]
async fn stored_questions_round_trip_in_order() {
    let state = state_with(Arc::new(ScriptedGenerator)).await;
    let recruiter = signup(&state, "Rita", UserRole::Recruiter).await;
    let referral = state
        .referral_service
        .create_referral(&recruiter, go_referral())
        .await
        .unwrap();

    let questions = vec![
        Question::new(
            "What does `go vet` do?".into(),
            vec!["Lints".into(), "Builds".into(), "Formats".into(), "Tests".into()],
            0,
        ),
        Question::new(
            "Which object schedules pods?".into(),
            vec!["etcd".into(), "kubelet".into(), "kube-scheduler".into(), "kube-proxy".into()],
            2,
        ),
    ];
    let created = state
        .test_service
        .create_test(referral.id, questions.clone())
        .await
        .unwrap();
    let loaded = state.test_service.get_test_by_id(created.id).await.unwrap();

    assert_eq!(loaded.questions.len(), questions.len());
    for (stored, original) in loaded.questions.iter().zip(&questions) {
        assert_eq!(stored.id, original.id);
        assert_eq!(stored.question_text, original.question_text);
        assert_eq!(stored.options, original.options);
        assert_eq!(stored.correct_answer_index, original.correct_answer_index);
    }
}

#[tokio::test]
async fn failed_generation_keeps_referral_and_can_be_retried() {
    let state = state_with(Arc::new(BrokenGenerator)).await;
    let recruiter = signup(&state, "Rita", UserRole::Recruiter).await;

    let err = state
        .referral_service
        .create_referral_with_test(&recruiter, go_referral())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Generation(GenerationError::MalformedResponse(_))
    ));

    let mine = state
        .referral_service
        .list_referrals_by_poster(&recruiter)
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert!(!state.referral_service.has_screening_test(mine[0].id).await.unwrap());
    assert!(matches!(
        state.referral_service.get_screening_test(mine[0].id).await,
        Err(Error::TestNotFound)
    ));
}

#[tokio::test]
async fn deleting_a_referral_cascades_to_tests_and_connections() {
    let state = state_with(Arc::new(ScriptedGenerator)).await;
    let recruiter = signup(&state, "Rita", UserRole::Recruiter).await;
    let seeker = signup(&state, "Sam", UserRole::Seeker).await;

    let test = state
        .referral_service
        .create_referral_with_test(&recruiter, go_referral())
        .await
        .unwrap();
    state
        .test_service
        .submit_test(&seeker, test.id, vec![0, 0, 0, 0, 0])
        .await
        .unwrap();
    let connection = state
        .connection_service
        .request_connection(&seeker, test.referral_id)
        .await
        .unwrap();

    let forbidden = state
        .referral_service
        .delete_referral(&seeker, test.referral_id)
        .await;
    assert!(matches!(forbidden, Err(Error::Forbidden(_))));

    state
        .referral_service
        .delete_referral(&recruiter, test.referral_id)
        .await
        .unwrap();

    assert!(matches!(
        state.test_service.get_test_by_id(test.id).await,
        Err(Error::TestNotFound)
    ));
    assert!(state
        .connection_service
        .get_connection(connection.id)
        .await
        .unwrap()
        .is_none());
    assert!(state
        .test_service
        .list_attempts(seeker.current_user_id().unwrap(), test.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn applicant_result_prefers_a_passing_attempt() {
    let state = state_with(Arc::new(ScriptedGenerator)).await;
    let recruiter = signup(&state, "Rita", UserRole::Recruiter).await;
    let seeker = signup(&state, "Sam", UserRole::Seeker).await;
    let seeker_id = seeker.current_user_id().unwrap();

    let test = state
        .referral_service
        .create_referral_with_test(&recruiter, go_referral())
        .await
        .unwrap();
    let correct: Vec<i32> = test.questions.iter().map(|q| q.correct_answer_index).collect();

    state
        .test_service
        .submit_test(&seeker, test.id, correct)
        .await
        .unwrap();
    let failed = state
        .test_service
        .submit_test(&seeker, test.id, vec![-1; 5])
        .await
        .unwrap();
    assert!(!failed.passed);
    assert_eq!(failed.score, 0);

    let result = state
        .test_service
        .applicant_test_result(seeker_id, test.referral_id)
        .await
        .unwrap()
        .expect("has attempts");
    assert!(result.passed);
    assert_eq!(state.test_service.list_attempts(seeker_id, test.id).await.unwrap().len(), 2);
    assert!(state.test_service.has_passed_test(seeker_id, test.id).await.unwrap());
}

#[tokio::test]
async fn giver_and_seeker_read_flags_clear_independently() {
    let state = state_with(Arc::new(ScriptedGenerator)).await;
    let recruiter = signup(&state, "Rita", UserRole::Recruiter).await;
    let seeker = signup(&state, "Sam", UserRole::Seeker).await;
    let referral = state
        .referral_service
        .create_referral(&recruiter, go_referral())
        .await
        .unwrap();
    let connection = state
        .connection_service
        .request_connection(&seeker, referral.id)
        .await
        .unwrap();

    assert_eq!(
        state.connection_service.pending_requests_for_giver(&recruiter).await.unwrap().len(),
        1
    );
    assert_eq!(
        state.connection_service.mark_connections_read_for_giver(&recruiter).await.unwrap(),
        1
    );
    assert_eq!(state.connection_service.unread_count_for_giver(&recruiter).await.unwrap(), 0);

    state.connection_service.accept_connection(connection.id).await.unwrap();
    assert_eq!(
        state.connection_service.mark_connections_read_for_seeker(&seeker).await.unwrap(),
        1
    );
    let stored = state
        .connection_service
        .get_connection(connection.id)
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.is_unread_by_giver);
    assert!(!stored.is_unread_by_seeker);
    assert!(state
        .connection_service
        .pending_requests_for_giver(&recruiter)
        .await
        .unwrap()
        .is_empty());
    assert_eq!(
        state.connection_service.list_connections_for_user(&seeker).await.unwrap().len(),
        1
    );
}
