use axum::{extract::RawForm, extract::State, Json};
use time::OffsetDateTime;

use crate::api::errors::ApiError;
use crate::api::extract::{ClientMeta, QuizSession};
use crate::api::quiz::form::FormMultiMap;
use crate::core::state::AppState;
use crate::core::time::{parse_client_timestamp, to_primitive_utc};
use crate::repositories;
use crate::schemas::quiz::QuizResultResponse;
use crate::services::audit::{self, SecurityEvent, ThresholdExceeded};
use crate::services::{content, scoring};

/// Scores an attempt exactly once: the submitted transition is a
/// conditional update on the NULL submission time, so a concurrent or
/// repeated submission for the same attempt is rejected before any
/// log rows or events are written.
pub(crate) async fn submit(
    State(state): State<AppState>,
    client: ClientMeta,
    QuizSession(session_id): QuizSession,
    RawForm(body): RawForm,
) -> Result<Json<QuizResultResponse>, ApiError> {
    let mut session = state
        .sessions()
        .load(&session_id)
        .await
        .map_err(|e| ApiError::internal(e, "An error occurred while processing your submission."))?
        .ok_or_else(|| {
            ApiError::BadRequest("Session expired. Please start the quiz again.".to_string())
        })?;

    if session.submitted || session.questions.is_empty() {
        return Err(ApiError::Conflict("Quiz already submitted for this session.".to_string()));
    }

    // Close the race window in the session store first, then take the
    // authoritative compare-and-set against the attempt row.
    session.submitted = true;
    state
        .sessions()
        .save(&session, state.settings().quiz().max_quiz_time_seconds)
        .await
        .map_err(|e| ApiError::internal(e, "An error occurred while processing your submission."))?;

    let submission_time = OffsetDateTime::now_utc();
    let marked =
        repositories::attempts::mark_submitted(state.db(), &session_id, to_primitive_utc(submission_time))
            .await
            .map_err(|e| {
                ApiError::internal(e, "An error occurred while processing your submission.")
            })?;
    if !marked {
        return Err(ApiError::Conflict("Quiz already submitted for this session.".to_string()));
    }

    let params = content::load_parameters(&state.settings().quiz().params_file)
        .map_err(|e| ApiError::internal(e, "An error occurred while processing your submission."))?;

    // Elapsed and minimum-required times are audit data only; a fast
    // submission is recorded, not rejected.
    let time_elapsed_seconds = (submission_time - session.page_load_time).as_seconds_f64();
    let min_required_seconds = session.questions.len() as u64
        * state.settings().quiz().min_time_per_question_seconds;
    tracing::debug!(
        session_id = %session_id,
        time_elapsed_seconds,
        min_required_seconds,
        "Submission timing recorded"
    );

    let (copy_paste_attempts, tab_switches) = match state
        .sessions()
        .activity_counters(&session_id)
        .await
    {
        Ok(counters) => counters,
        Err(err) => {
            tracing::error!(error = %err, session_id = %session_id, "Failed to read activity counters");
            (0, 0)
        }
    };

    let form = FormMultiMap::parse(&body);
    let answers_by_question: Vec<Vec<String>> = session
        .questions
        .iter()
        .map(|question| collect_answers(&form, question))
        .collect();

    let outcome = scoring::score_attempt(&session.questions, &answers_by_question);

    for (index, result) in outcome.results.iter().enumerate() {
        let question_number = index + 1;
        let question = &session.questions[index];
        let timing_suffix = question.timing_key_suffix(question_number);

        let first_modified = form
            .first(&format!("first_modified_{timing_suffix}"))
            .and_then(|raw| parse_reported_timestamp(raw, "first_modified_time"));
        let last_modified = form
            .first(&format!("last_modified_{timing_suffix}"))
            .and_then(|raw| parse_reported_timestamp(raw, "last_modified_time"));

        repositories::quiz_log::create(
            state.db(),
            repositories::quiz_log::CreateLogEntry {
                session_id: &session_id,
                question_number: question_number as i32,
                question_id: &result.question_id,
                question: &result.question,
                user_answers: &result.user_answers,
                correct_answers: &result.correct_answers,
                is_correct: result.is_correct,
                first_modified_time: first_modified.map(to_primitive_utc),
                last_modified_time: last_modified.map(to_primitive_utc),
                copy_paste_attempts: copy_paste_attempts as i32,
                tab_switches: tab_switches as i32,
            },
        )
        .await
        .map_err(|e| {
            ApiError::internal(e, "An error occurred while processing your submission.")
        })?;
    }

    let suspicious_activity = scoring::classify_suspicious(copy_paste_attempts, tab_switches);
    if suspicious_activity {
        audit::record(
            state.db(),
            &session_id,
            &client.ip,
            &client.user_agent,
            SecurityEvent::SuspiciousActivity {
                copy_paste_attempts,
                tab_switches,
                student_name: session.student_name.clone(),
                threshold_exceeded: ThresholdExceeded {
                    copy_paste: copy_paste_attempts > scoring::COPY_PASTE_THRESHOLD,
                    tab_switches: tab_switches > scoring::TAB_SWITCH_THRESHOLD,
                },
            },
        )
        .await;
    }

    audit::record(
        state.db(),
        &session_id,
        &client.ip,
        &client.user_agent,
        SecurityEvent::QuizCompleted {
            student_name: session.student_name.clone(),
            score: outcome.score,
            total_questions: session.questions.len(),
            completion_time: audit::payload_timestamp(submission_time),
            time_elapsed_seconds,
        },
    )
    .await;

    tracing::info!(
        student_name = %session.student_name,
        session_id = %session_id,
        score = outcome.score,
        total = session.questions.len(),
        "Quiz submitted"
    );

    // The attempt is terminal; session state must not be reusable.
    if let Err(err) = state.sessions().destroy(&session_id).await {
        tracing::warn!(error = %err, session_id = %session_id, "Failed to destroy session state");
    }

    let total = session.questions.len();
    let passed = total > 0 && outcome.score as f64 / total as f64 >= params.passing_level;

    Ok(Json(QuizResultResponse {
        student_name: session.student_name,
        score: outcome.score,
        total,
        passing_level: params.passing_level,
        passed,
        results: outcome.results,
        suspicious_activity,
        copy_paste_attempts,
        tab_switches,
    }))
}

/// Answers arrive keyed by the question's explicit id when the bank has
/// one, with the question text as a fallback key.
fn collect_answers(
    form: &FormMultiMap,
    question: &crate::services::content::QuestionRecord,
) -> Vec<String> {
    if let Some(id) = &question.question_id {
        let answers = form.all(id);
        if !answers.is_empty() {
            return answers.to_vec();
        }
    }

    form.all(&question.question).to_vec()
}

fn parse_reported_timestamp(raw: &str, field: &'static str) -> Option<OffsetDateTime> {
    let parsed = parse_client_timestamp(raw);
    if parsed.is_none() {
        tracing::warn!(field, value = raw, "Invalid client-reported timestamp");
    }
    parsed
}
