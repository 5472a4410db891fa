use axum::{extract::State, Form, Json};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::extract::{ClientMeta, MaybeQuizSession};
use crate::core::time::to_primitive_utc;
use crate::core::{security, state::AppState};
use crate::repositories;
use crate::schemas::quiz::{QuestionView, QuizStartResponse, StartQuizForm};
use crate::services::audit::{self, SecurityEvent};
use crate::services::session_store::ActiveSession;
use crate::services::{content, identity};

/// Starts a fresh attempt: validates the name, discards any prior session
/// state, persists the attempt record first, then populates the session
/// store and hands the client a signed token for the new attempt.
pub(crate) async fn start_quiz(
    State(state): State<AppState>,
    client: ClientMeta,
    MaybeQuizSession(previous): MaybeQuizSession,
    Form(form): Form<StartQuizForm>,
) -> Result<Json<QuizStartResponse>, ApiError> {
    let student_name = form.student_name.trim().to_string();
    if !identity::validate_student_name(&student_name) {
        return Err(ApiError::BadRequest(
            "Please enter a valid name (at least 2 characters, letters only).".to_string(),
        ));
    }

    // A new start always supersedes whatever attempt the client was on.
    if let Some(old_session_id) = previous {
        if let Err(err) = state.sessions().destroy(&old_session_id).await {
            tracing::warn!(error = %err, session_id = %old_session_id, "Failed to clear prior session state");
        }
    }

    let quiz_settings = state.settings().quiz();

    let bank = content::load_questions(&quiz_settings.questions_file)
        .map_err(|e| ApiError::internal(e, "Error loading quiz. Please try again later."))?;
    let params = content::load_parameters(&quiz_settings.params_file)
        .map_err(|e| ApiError::internal(e, "Error loading quiz. Please try again later."))?;

    let selected = content::select_questions(&bank, params.num_questions);

    let session_id = Uuid::new_v4().to_string();
    let student_hash = security::derive_fingerprint(&student_name, &client.user_agent, &client.ip);
    let page_load_time = OffsetDateTime::now_utc();

    // Advisory only: a likely retake is worth a log line but never blocks.
    if identity::is_recent_duplicate(state.db(), &student_hash, &session_id).await {
        tracing::warn!(
            student_name = %student_name,
            session_id = %session_id,
            "Student fingerprint matches a recently submitted attempt"
        );
    }

    // The attempt row goes in before any other side effect so a started
    // attempt is recoverable even if the steps below fail.
    repositories::attempts::create(
        state.db(),
        repositories::attempts::CreateAttempt {
            session_id: &session_id,
            student_name: &student_name,
            student_hash: &student_hash,
            page_load_time: to_primitive_utc(page_load_time),
            num_questions: params.num_questions as i32,
            passing_level: params.passing_level,
            ip_address: &client.ip,
            user_agent: &client.user_agent,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Error starting quiz. Please try again later."))?;

    let session = ActiveSession {
        session_id: session_id.clone(),
        student_name: student_name.clone(),
        student_hash,
        page_load_time,
        questions: selected.clone(),
        submitted: false,
    };

    state
        .sessions()
        .save(&session, quiz_settings.max_quiz_time_seconds)
        .await
        .map_err(|e| ApiError::internal(e, "Error starting quiz. Please try again later."))?;

    tracing::info!(student_name = %student_name, session_id = %session_id, "Quiz started");

    audit::record(
        state.db(),
        &session_id,
        &client.ip,
        &client.user_agent,
        SecurityEvent::QuizStarted {
            student_name: student_name.clone(),
            num_questions: selected.len(),
            start_time: audit::payload_timestamp(page_load_time),
        },
    )
    .await;

    let session_token = security::create_session_token(
        &session_id,
        state.settings(),
        Duration::seconds(quiz_settings.max_quiz_time_seconds as i64),
    )
    .map_err(|e| ApiError::internal(e, "Error starting quiz. Please try again later."))?;

    let questions = selected
        .iter()
        .enumerate()
        .map(|(index, record)| QuestionView::from_record(record, index + 1))
        .collect();

    Ok(Json(QuizStartResponse {
        quiz_title: params.quiz_title,
        student_name,
        num_questions: selected.len(),
        max_time_seconds: quiz_settings.max_quiz_time_seconds,
        session_token,
        questions,
    }))
}
